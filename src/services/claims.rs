//! Claims intake: receipt hashing, duplicate detection, OCR-assisted
//! auto-approval, category caps and the payroll sweep.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::TenantContext;
use crate::db::DbPool;
use crate::entities::{
    claim::{self, confidence, status as claim_status, CATEGORIES},
    employee,
};
use crate::errors::ServiceError;
use crate::services::receipt_vision::{ReceiptExtraction, ReceiptVision};

/// Claims at or below this amount qualify for auto-approval.
const AUTO_APPROVE_LIMIT: Decimal = dec!(100);
/// Accommodation claims are capped here regardless of the billed amount.
const ACCOMMODATION_CAP: Decimal = dec!(80);
const ACCOMMODATION: &str = "accommodation";

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub employee_id: i64,
    pub claim_date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Base64 receipt image, with or without a data-URL prefix
    pub receipt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimRequest {
    pub claim_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimsSummary {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub paid: u64,
    pub approved_total: Decimal,
}

#[derive(Clone)]
pub struct ClaimsService {
    db_pool: Arc<DbPool>,
    vision: Arc<dyn ReceiptVision>,
}

impl ClaimsService {
    pub fn new(db_pool: Arc<DbPool>, vision: Arc<dyn ReceiptVision>) -> Self {
        Self { db_pool, vision }
    }

    /// Creates a claim, running the receipt pipeline: hash, duplicate
    /// checks, OCR extraction, then the auto-approval gate. Vision
    /// failures degrade to manual approval and never block the write.
    #[instrument(skip(self, ctx, request), fields(employee_id = request.employee_id, category = %request.category))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        request: CreateClaimRequest,
    ) -> Result<claim::Model, ServiceError> {
        if !CATEGORIES.contains(&request.category.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "unknown claim category '{}'",
                request.category
            )));
        }
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "claim amount must be positive".into(),
            ));
        }

        let employee = employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;

        let (amount, amount_capped) = apply_category_cap(&request.category, request.amount);

        let receipt_bytes = request
            .receipt
            .as_deref()
            .map(decode_receipt)
            .transpose()?;
        let receipt_hash = receipt_bytes.as_deref().map(receipt_hash);

        // Exact duplicate: same image bytes anywhere in the tenant.
        if let Some(hash) = &receipt_hash {
            if let Some((other_claim, other_name)) =
                self.find_hash_duplicate(ctx, hash, None).await?
            {
                return Err(ServiceError::Conflict(format!(
                    "receipt already submitted by {} on claim #{}",
                    other_name, other_claim.id
                )));
            }
        }

        let extraction = match &receipt_bytes {
            Some(bytes) => match self.vision.extract(bytes).await {
                Ok(extraction) => Some(extraction),
                Err(e) => {
                    warn!(error = %e, "receipt extraction failed; claim requires manual approval");
                    None
                }
            },
            None => None,
        };

        // Similar duplicate: same merchant, date and amount per the OCR.
        if let Some(extraction) = &extraction {
            if let (Some(merchant), Some(date), Some(ai_amount)) =
                (&extraction.merchant, extraction.date, extraction.amount)
            {
                if let Some((other_claim, other_name)) = self
                    .find_similar_duplicate(ctx, merchant, date, ai_amount, None)
                    .await?
                {
                    return Err(ServiceError::Conflict(format!(
                        "a matching receipt was already submitted by {} on claim #{}",
                        other_name, other_claim.id
                    )));
                }
            }
        }

        let auto_approve = match &extraction {
            Some(extraction) => {
                extraction.is_readable()
                    && extraction.amount == Some(amount)
                    && amount <= AUTO_APPROVE_LIMIT
            }
            None => false,
        };

        let receipt_path = match &receipt_bytes {
            Some(bytes) => Some(store_receipt(bytes, request.employee_id).await?),
            None => None,
        };

        let now = Utc::now();
        let saved = claim::ActiveModel {
            company_id: Set(ctx.company_id),
            employee_id: Set(employee.id),
            claim_date: Set(request.claim_date),
            category: Set(request.category),
            amount: Set(amount),
            description: Set(request.description),
            receipt_path: Set(receipt_path),
            receipt_hash: Set(receipt_hash),
            status: Set(if auto_approve {
                claim_status::APPROVED.to_string()
            } else {
                claim_status::PENDING.to_string()
            }),
            ai_amount: Set(extraction.as_ref().and_then(|e| e.amount)),
            ai_merchant: Set(extraction.as_ref().and_then(|e| e.merchant.clone())),
            ai_date: Set(extraction.as_ref().and_then(|e| e.date)),
            ai_confidence: Set(extraction.as_ref().map(|e| e.confidence.clone())),
            ai_currency: Set(extraction.as_ref().and_then(|e| e.currency.clone())),
            auto_approved: Set(auto_approve),
            amount_capped: Set(amount_capped),
            approved_at: Set(auto_approve.then(|| now)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(
            claim_id = saved.id,
            auto_approved = auto_approve,
            "claim created"
        );
        Ok(saved)
    }

    async fn find_hash_duplicate(
        &self,
        ctx: &TenantContext,
        hash: &str,
        exclude_claim: Option<i64>,
    ) -> Result<Option<(claim::Model, String)>, ServiceError> {
        let mut query = claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .filter(claim::Column::ReceiptHash.eq(hash))
            .filter(claim::Column::Status.ne(claim_status::REJECTED));
        if let Some(id) = exclude_claim {
            query = query.filter(claim::Column::Id.ne(id));
        }
        let Some(other) = query.one(&*self.db_pool).await? else {
            return Ok(None);
        };
        let name = self.employee_name(other.employee_id).await?;
        Ok(Some((other, name)))
    }

    async fn find_similar_duplicate(
        &self,
        ctx: &TenantContext,
        merchant: &str,
        date: NaiveDate,
        amount: Decimal,
        exclude_claim: Option<i64>,
    ) -> Result<Option<(claim::Model, String)>, ServiceError> {
        let mut query = claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .filter(claim::Column::AiDate.eq(date))
            .filter(claim::Column::AiAmount.eq(amount))
            .filter(claim::Column::Status.ne(claim_status::REJECTED));
        if let Some(id) = exclude_claim {
            query = query.filter(claim::Column::Id.ne(id));
        }
        let candidates = query.all(&*self.db_pool).await?;
        let Some(other) = candidates.into_iter().find(|c| {
            c.ai_merchant
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(merchant))
        }) else {
            return Ok(None);
        };
        let name = self.employee_name(other.employee_id).await?;
        Ok(Some((other, name)))
    }

    async fn employee_name(&self, employee_id: i64) -> Result<String, ServiceError> {
        Ok(employee::Entity::find_by_id(employee_id)
            .one(&*self.db_pool)
            .await?
            .map(|e| e.name)
            .unwrap_or_else(|| format!("employee {}", employee_id)))
    }

    async fn get_guarded(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<claim::Model, ServiceError> {
        claim::Entity::find_by_id(id)
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Claim {} not found", id)))
    }

    pub async fn get(&self, ctx: &TenantContext, id: i64) -> Result<claim::Model, ServiceError> {
        self.get_guarded(ctx, id).await
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        employee_id: Option<i64>,
        status: Option<String>,
    ) -> Result<Vec<claim::Model>, ServiceError> {
        let mut query =
            claim::Entity::find().filter(claim::Column::CompanyId.eq(ctx.company_id));
        if let Some(employee_id) = employee_id {
            query = query.filter(claim::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = status {
            query = query.filter(claim::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(claim::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, ctx, request))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: i64,
        request: UpdateClaimRequest,
    ) -> Result<claim::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != claim_status::PENDING {
            return Err(ServiceError::InvalidOperation(format!(
                "only pending claims can be edited; this one is {}",
                existing.status
            )));
        }
        if let Some(category) = &request.category {
            if !CATEGORIES.contains(&category.as_str()) {
                return Err(ServiceError::ValidationError(format!(
                    "unknown claim category '{}'",
                    category
                )));
            }
        }

        let category = request
            .category
            .clone()
            .unwrap_or_else(|| existing.category.clone());
        let mut active: claim::ActiveModel = existing.clone().into();
        if let Some(date) = request.claim_date {
            active.claim_date = Set(date);
        }
        if let Some(category_new) = request.category {
            active.category = Set(category_new);
        }
        if let Some(amount) = request.amount {
            if amount <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "claim amount must be positive".into(),
                ));
            }
            let (amount, capped) = apply_category_cap(&category, amount);
            active.amount = Set(amount);
            active.amount_capped = Set(capped);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn approve(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<claim::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != claim_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "claim is already {}",
                existing.status
            )));
        }
        let mut active: claim::ActiveModel = existing.into();
        active.status = Set(claim_status::APPROVED.to_string());
        active.approved_by = Set(Some(ctx.user_id));
        active.approved_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn reject(
        &self,
        ctx: &TenantContext,
        id: i64,
        reason: String,
    ) -> Result<claim::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != claim_status::PENDING {
            return Err(ServiceError::Conflict(format!(
                "claim is already {}",
                existing.status
            )));
        }
        let mut active: claim::ActiveModel = existing.into();
        active.status = Set(claim_status::REJECTED.to_string());
        active.reject_reason = Set(Some(reason));
        active.approved_by = Set(Some(ctx.user_id));
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    /// Returns an approved claim to pending. Paid claims are immutable.
    #[instrument(skip(self, ctx))]
    pub async fn revert(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<claim::Model, ServiceError> {
        let existing = self.get_guarded(ctx, id).await?;
        if existing.status != claim_status::APPROVED && existing.status != claim_status::REJECTED {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot revert a {} claim",
                existing.status
            )));
        }
        if existing.linked_payroll_item_id.is_some() {
            return Err(ServiceError::Conflict(
                "claim is linked to a payroll run and cannot be reverted".into(),
            ));
        }
        let mut active: claim::ActiveModel = existing.into();
        active.status = Set(claim_status::PENDING.to_string());
        active.approved_by = Set(None);
        active.approved_at = Set(None);
        active.reject_reason = Set(None);
        active.auto_approved = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db_pool).await?)
    }

    pub async fn bulk_approve(
        &self,
        ctx: &TenantContext,
        ids: Vec<i64>,
    ) -> Result<(u64, Vec<String>), ServiceError> {
        let mut approved = 0;
        let mut errors = Vec::new();
        for id in ids {
            match self.approve(ctx, id).await {
                Ok(_) => approved += 1,
                Err(e) => errors.push(format!("claim {}: {}", id, e)),
            }
        }
        Ok((approved, errors))
    }

    pub async fn pending_count(&self, ctx: &TenantContext) -> Result<u64, ServiceError> {
        Ok(claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .filter(claim::Column::Status.eq(claim_status::PENDING))
            .count(&*self.db_pool)
            .await?)
    }

    pub async fn summary(&self, ctx: &TenantContext) -> Result<ClaimsSummary, ServiceError> {
        let all = claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .all(&*self.db_pool)
            .await?;
        let mut summary = ClaimsSummary {
            pending: 0,
            approved: 0,
            rejected: 0,
            paid: 0,
            approved_total: Decimal::ZERO,
        };
        for c in all {
            match c.status.as_str() {
                claim_status::PENDING => summary.pending += 1,
                claim_status::APPROVED => {
                    summary.approved += 1;
                    summary.approved_total += c.amount;
                }
                claim_status::REJECTED => summary.rejected += 1,
                claim_status::PAID => summary.paid += 1,
                _ => {}
            }
        }
        Ok(summary)
    }

    /// Approved claims not yet attached to a payroll item. The final
    /// settlement sweep reads the same set.
    pub async fn for_payroll(
        &self,
        ctx: &TenantContext,
        employee_id: Option<i64>,
    ) -> Result<Vec<claim::Model>, ServiceError> {
        let mut query = claim::Entity::find()
            .filter(claim::Column::CompanyId.eq(ctx.company_id))
            .filter(claim::Column::Status.eq(claim_status::APPROVED))
            .filter(claim::Column::LinkedPayrollItemId.is_null());
        if let Some(employee_id) = employee_id {
            query = query.filter(claim::Column::EmployeeId.eq(employee_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    /// Attaches approved claims to a payroll item and marks them paid.
    #[instrument(skip(self, ctx))]
    pub async fn link_to_payroll(
        &self,
        ctx: &TenantContext,
        claim_ids: Vec<i64>,
        payroll_item_id: i64,
    ) -> Result<u64, ServiceError> {
        let mut linked = 0;
        for id in claim_ids {
            let existing = self.get_guarded(ctx, id).await?;
            if existing.status != claim_status::APPROVED {
                return Err(ServiceError::InvalidOperation(format!(
                    "claim {} is {}; only approved claims can be linked",
                    id, existing.status
                )));
            }
            if existing.linked_payroll_item_id.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "claim {} is already linked to a payroll item",
                    id
                )));
            }
            let mut active: claim::ActiveModel = existing.into();
            active.linked_payroll_item_id = Set(Some(payroll_item_id));
            active.status = Set(claim_status::PAID.to_string());
            active.updated_at = Set(Some(Utc::now()));
            active.update(&*self.db_pool).await?;
            linked += 1;
        }
        Ok(linked)
    }

    /// The closed category list; kept per-employee so future policy can
    /// restrict by position without changing the surface.
    pub async fn allowed_types(
        &self,
        ctx: &TenantContext,
        employee_id: i64,
    ) -> Result<Vec<String>, ServiceError> {
        employee::Entity::find_by_id(employee_id)
            .filter(employee::Column::CompanyId.eq(ctx.company_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;
        Ok(CATEGORIES.iter().map(|c| c.to_string()).collect())
    }
}

/// SHA-256 over the raw image bytes, hex-encoded.
pub fn receipt_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Accepts a base64 payload with or without a `data:*;base64,` prefix.
pub fn decode_receipt(payload: &str) -> Result<Vec<u8>, ServiceError> {
    use base64::Engine;
    let raw = payload
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(payload);
    base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| ServiceError::ValidationError(format!("invalid receipt payload: {}", e)))
}

fn apply_category_cap(category: &str, amount: Decimal) -> (Decimal, bool) {
    if category == ACCOMMODATION && amount > ACCOMMODATION_CAP {
        (ACCOMMODATION_CAP, true)
    } else {
        (amount, false)
    }
}

/// Receipt images land under the media directory keyed by hash, so the
/// same image never stores twice.
async fn store_receipt(bytes: &[u8], employee_id: i64) -> Result<String, ServiceError> {
    let dir = format!("media/receipts/{}", employee_id);
    let key = format!("{}/{}.jpg", dir, receipt_hash(bytes));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ServiceError::InternalError(format!("receipt store: {}", e)))?;
    tokio::fs::write(&key, bytes)
        .await
        .map_err(|e| ServiceError::InternalError(format!("receipt store: {}", e)))?;
    Ok(key)
}
