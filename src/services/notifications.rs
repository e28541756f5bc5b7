//! Persisted notification rows; delivery is a separate worker's job.
//! The (employee, reference_type, reference_id) unique index backs the
//! insert-once guard, so notifier reruns never duplicate.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::instrument;

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::notification;
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Inserts unless a row with the same (employee, reference) already
    /// exists. Returns whether a row was written.
    #[instrument(skip(self, title, body))]
    pub async fn notify_once(
        &self,
        company_id: i64,
        employee_id: i64,
        title: &str,
        body: &str,
        reference_type: &str,
        reference_id: i64,
    ) -> Result<bool, ServiceError> {
        let existing = notification::Entity::find()
            .filter(notification::Column::EmployeeId.eq(employee_id))
            .filter(notification::Column::ReferenceType.eq(reference_type))
            .filter(notification::Column::ReferenceId.eq(reference_id))
            .one(&*self.db_pool)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let result = notification::ActiveModel {
            company_id: Set(company_id),
            employee_id: Set(employee_id),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            reference_type: Set(Some(reference_type.to_string())),
            reference_id: Set(Some(reference_id)),
            is_read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            // A concurrent insert hitting the unique index is the guard
            // doing its job, not an error.
            Err(sea_orm::DbErr::Exec(e)) if e.to_string().to_lowercase().contains("unique") => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_for_employee(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::CompanyId.eq(ctx.company_id))
            .filter(notification::Column::EmployeeId.eq(employee_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }
}
