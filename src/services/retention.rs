//! Media retention: clock-record photos become deletable 6 months after
//! the work date. Cleanup clears the photo references and writes an
//! append-only audit row, per record, in one transaction each.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{clock_record, data_retention_log};
use crate::errors::ServiceError;

#[derive(Debug, Serialize)]
pub struct RetentionStatus {
    pub eligible_now: u64,
    pub already_cleaned: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct CleanupSummary {
    pub dry_run: bool,
    pub candidates: u64,
    pub cleaned: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct RetentionService {
    db_pool: Arc<DbPool>,
}

impl RetentionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn eligible_filter(
        ctx: &TenantContext,
        today: NaiveDate,
    ) -> sea_orm::Select<clock_record::Entity> {
        clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::MediaDeletedAt.is_null())
            .filter(clock_record::Column::MediaRetentionEligibleAt.lte(today))
    }

    pub async fn status(
        &self,
        ctx: &TenantContext,
        today: NaiveDate,
    ) -> Result<RetentionStatus, ServiceError> {
        let eligible_now = Self::eligible_filter(ctx, today)
            .count(&*self.db_pool)
            .await?;
        let already_cleaned = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::MediaDeletedAt.is_not_null())
            .count(&*self.db_pool)
            .await?;
        Ok(RetentionStatus {
            eligible_now,
            already_cleaned,
        })
    }

    pub async fn pending(
        &self,
        ctx: &TenantContext,
        today: NaiveDate,
    ) -> Result<Vec<clock_record::Model>, ServiceError> {
        Ok(Self::eligible_filter(ctx, today)
            .order_by_asc(clock_record::Column::WorkDate)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .filter(clock_record::Model::has_unretained_media)
            .collect())
    }

    /// Clears eligible media. With `dry_run` the candidates are counted
    /// but nothing changes. Each record commits separately; failures are
    /// logged and the batch continues.
    #[instrument(skip(self, ctx))]
    pub async fn cleanup(
        &self,
        ctx: &TenantContext,
        today: NaiveDate,
        dry_run: bool,
    ) -> Result<CleanupSummary, ServiceError> {
        let candidates = self.pending(ctx, today).await?;
        let mut summary = CleanupSummary {
            dry_run,
            candidates: candidates.len() as u64,
            ..Default::default()
        };

        if dry_run {
            return Ok(summary);
        }

        for record in candidates {
            let record_id = record.id;
            match self.clean_record(ctx, record).await {
                Ok(()) => summary.cleaned += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(record_id, error = %e, "media cleanup failed for record");
                    summary.errors.push(format!("record {}: {}", record_id, e));
                }
            }
        }

        info!(
            cleaned = summary.cleaned,
            failed = summary.failed,
            "media retention cleanup finished"
        );
        Ok(summary)
    }

    async fn clean_record(
        &self,
        ctx: &TenantContext,
        record: clock_record::Model,
    ) -> Result<(), ServiceError> {
        let mut cleared = Vec::new();
        if record.photo_in_1.is_some() {
            cleared.push("photo_in_1");
        }
        if record.photo_out_1.is_some() {
            cleared.push("photo_out_1");
        }
        if record.photo_in_2.is_some() {
            cleared.push("photo_in_2");
        }
        if record.photo_out_2.is_some() {
            cleared.push("photo_out_2");
        }

        let txn = self.db_pool.begin().await?;

        let record_id = record.id;
        let mut active: clock_record::ActiveModel = record.into();
        active.photo_in_1 = Set(None);
        active.photo_out_1 = Set(None);
        active.photo_in_2 = Set(None);
        active.photo_out_2 = Set(None);
        active.media_deleted_at = Set(Some(Utc::now()));
        active.media_deletion_logged = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        data_retention_log::ActiveModel {
            clock_record_id: Set(record_id),
            fields_cleared: Set(cleared.join(",")),
            deleted_by: Set(Some(ctx.user_id)),
            verified: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Audit trail, tenant-scoped through the owning clock records.
    pub async fn logs(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<data_retention_log::Model>, ServiceError> {
        let record_ids: Vec<i64> = clock_record::Entity::find()
            .filter(clock_record::Column::CompanyId.eq(ctx.company_id))
            .filter(clock_record::Column::MediaDeletionLogged.eq(true))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        Ok(data_retention_log::Entity::find()
            .filter(data_retention_log::Column::ClockRecordId.is_in(record_ids))
            .order_by_desc(data_retention_log::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }
}
