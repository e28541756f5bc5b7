//! Read-only sync from the AA Alive driver-attendance upstream.
//!
//! The upstream is an HTTPS JSON API keyed by driver code. Records land
//! as ordinary clock records for the AA Alive company, tagged by a note,
//! and the upsert is idempotent so the twice-daily cron can rerun freely.

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::db::DbPool;
use crate::entities::{clock_record, company, employee};
use crate::errors::ServiceError;
use crate::services::work_rules::{self, DayContext, Regime};

const SYNC_NOTE: &str = "Synced from AA Alive driver feed";

/// One driver-day from the upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamShift {
    pub driver_code: String,
    pub date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub break_out: Option<NaiveTime>,
    pub break_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamDriver {
    pub driver_code: String,
    pub name: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncSummary {
    pub dates: Vec<NaiveDate>,
    pub fetched: u64,
    pub created: u64,
    pub updated: u64,
    pub unmatched: u64,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct DriverSyncService {
    db_pool: Arc<DbPool>,
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl DriverSyncService {
    pub fn new(db_pool: Arc<DbPool>, base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            db_pool,
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn base_url(&self) -> Result<&str, ServiceError> {
        self.base_url.as_deref().ok_or_else(|| {
            ServiceError::ExternalServiceError(
                "driver sync upstream is not configured (AAALIVE_API_URL)".into(),
            )
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("X-Api-Key", key),
            None => req,
        }
    }

    /// Connectivity probe for the admin test endpoint.
    pub async fn test(&self) -> Result<serde_json::Value, ServiceError> {
        let url = format!("{}/health", self.base_url()?);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("upstream: {}", e)))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "upstream returned {}",
                response.status()
            )));
        }
        Ok(response
            .json()
            .await
            .unwrap_or_else(|_| serde_json::json!({"status": "ok"})))
    }

    pub async fn fetch_shifts(&self, date: NaiveDate) -> Result<Vec<UpstreamShift>, ServiceError> {
        let url = format!("{}/shifts", self.base_url()?);
        let response = self
            .authed(self.client.get(&url).query(&[("date", date.to_string())]))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("upstream: {}", e)))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "upstream returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("upstream payload: {}", e)))
    }

    pub async fn fetch_drivers(&self) -> Result<Vec<UpstreamDriver>, ServiceError> {
        let url = format!("{}/drivers", self.base_url()?);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("upstream: {}", e)))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "upstream returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("upstream payload: {}", e)))
    }

    /// Pulls and upserts the given dates. Matching is by employee code
    /// within the AA Alive company; unmatched drivers are counted and
    /// skipped.
    #[instrument(skip(self))]
    pub async fn sync_dates(&self, dates: Vec<NaiveDate>) -> SyncSummary {
        let mut summary = SyncSummary {
            dates: dates.clone(),
            ..Default::default()
        };

        let target_company = match company::Entity::find()
            .filter(company::Column::WorkRule.eq(company::work_rule::AA_ALIVE))
            .one(&*self.db_pool)
            .await
        {
            Ok(Some(c)) => c,
            Ok(None) => {
                summary.errors.push("no AA Alive company configured".into());
                return summary;
            }
            Err(e) => {
                summary.errors.push(e.to_string());
                return summary;
            }
        };

        for date in dates {
            let shifts = match self.fetch_shifts(date).await {
                Ok(shifts) => shifts,
                Err(e) => {
                    error!(date = %date, error = %e, "driver shift fetch failed");
                    summary.errors.push(format!("{}: {}", date, e));
                    continue;
                }
            };
            summary.fetched += shifts.len() as u64;

            for shift in shifts {
                match self.upsert_shift(&target_company, &shift).await {
                    Ok(Some(true)) => summary.created += 1,
                    Ok(Some(false)) => summary.updated += 1,
                    Ok(None) => {
                        warn!(driver = %shift.driver_code, "no matching employee for driver");
                        summary.unmatched += 1;
                    }
                    Err(e) => {
                        error!(driver = %shift.driver_code, error = %e, "driver upsert failed");
                        summary
                            .errors
                            .push(format!("{} {}: {}", shift.driver_code, shift.date, e));
                    }
                }
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            unmatched = summary.unmatched,
            "driver sync finished"
        );
        summary
    }

    /// Returns Some(true) on insert, Some(false) on update, None when the
    /// driver has no employee row.
    async fn upsert_shift(
        &self,
        target_company: &company::Model,
        shift: &UpstreamShift,
    ) -> Result<Option<bool>, ServiceError> {
        let Some(emp) = employee::Entity::find()
            .filter(employee::Column::CompanyId.eq(target_company.id))
            .filter(employee::Column::EmployeeCode.eq(shift.driver_code.clone()))
            .one(&*self.db_pool)
            .await?
        else {
            return Ok(None);
        };

        let totals = work_rules::compute(
            Regime::from_work_rule(&target_company.work_rule),
            shift.clock_in,
            shift.break_out.or(shift.clock_out),
            shift.break_in.or(shift.clock_out),
            shift.clock_out,
            DayContext::default(),
        );

        let existing = clock_record::Entity::find()
            .filter(clock_record::Column::EmployeeId.eq(emp.id))
            .filter(clock_record::Column::WorkDate.eq(shift.date))
            .one(&*self.db_pool)
            .await?;

        match existing {
            Some(record) => {
                let unchanged = record.clock_in_1 == shift.clock_in
                    && record.clock_out_2 == shift.clock_out;
                if unchanged {
                    return Ok(Some(false));
                }
                let mut active: clock_record::ActiveModel = record.into();
                active.clock_in_1 = Set(shift.clock_in);
                active.clock_out_1 = Set(shift.break_out.or(shift.clock_out));
                active.clock_in_2 = Set(shift.break_in.or(shift.clock_out));
                active.clock_out_2 = Set(shift.clock_out);
                active.total_work_minutes = Set(totals.work_minutes);
                active.total_break_minutes = Set(totals.break_minutes);
                active.ot_minutes = Set(totals.ot_minutes);
                active.notes = Set(Some(SYNC_NOTE.to_string()));
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db_pool).await?;
                Ok(Some(false))
            }
            None => {
                clock_record::ActiveModel {
                    company_id: Set(target_company.id),
                    employee_id: Set(emp.id),
                    outlet_id: Set(emp.outlet_id),
                    work_date: Set(shift.date),
                    clock_in_1: Set(shift.clock_in),
                    clock_out_1: Set(shift.break_out.or(shift.clock_out)),
                    clock_in_2: Set(shift.break_in.or(shift.clock_out)),
                    clock_out_2: Set(shift.clock_out),
                    total_work_minutes: Set(totals.work_minutes),
                    total_break_minutes: Set(totals.break_minutes),
                    ot_minutes: Set(totals.ot_minutes),
                    status: Set(clock_record::status::PENDING.to_string()),
                    notes: Set(Some(SYNC_NOTE.to_string())),
                    media_retention_eligible_at: Set(Some(
                        crate::services::attendance::retention_eligible_date(shift.date),
                    )),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&*self.db_pool)
                .await?;
                Ok(Some(true))
            }
        }
    }
}
