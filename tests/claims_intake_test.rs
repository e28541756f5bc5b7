//! Claims intake: receipt dedupe, the auto-approval gate, category caps
//! and the payroll sweep. Vision is stubbed so the gate is deterministic.

mod common;

use async_trait::async_trait;
use base64::Engine;
use common::*;
use kerani_api::entities::{claim, company};
use kerani_api::errors::ServiceError;
use kerani_api::services::claims::{ClaimsService, CreateClaimRequest};
use kerani_api::services::receipt_vision::{ReceiptExtraction, ReceiptVision};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Deterministic stand-in for the OCR service.
struct StubVision {
    extraction: ReceiptExtraction,
}

#[async_trait]
impl ReceiptVision for StubVision {
    async fn extract(&self, _image_bytes: &[u8]) -> Result<ReceiptExtraction, ServiceError> {
        Ok(self.extraction.clone())
    }
}

fn readable(amount: Decimal, merchant: &str, date: chrono::NaiveDate) -> ReceiptExtraction {
    ReceiptExtraction {
        amount: Some(amount),
        merchant: Some(merchant.to_string()),
        date: Some(date),
        confidence: claim::confidence::HIGH.to_string(),
        items_detected: Some(2),
        currency: Some("MYR".to_string()),
    }
}

fn service_with(db: Arc<sea_orm::DatabaseConnection>, extraction: ReceiptExtraction) -> ClaimsService {
    ClaimsService::new(db, Arc::new(StubVision { extraction }))
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn request(employee_id: i64, amount: Decimal, receipt: Option<String>) -> CreateClaimRequest {
    CreateClaimRequest {
        employee_id,
        claim_date: d(2025, 3, 10),
        category: "meal".to_string(),
        amount,
        description: None,
        receipt,
    }
}

#[tokio::test]
async fn matching_receipt_auto_approves_small_claims() {
    let db = test_db().await;
    let co = seed_company(&db, "CLAIMS", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C1").insert(&db).await;

    let svc = service_with(db.clone(), readable(dec!(45.50), "Restoran Seri", d(2025, 3, 10)));
    let claim = svc
        .create(
            &admin_ctx(co.id),
            request(emp.id, dec!(45.50), Some(encode(b"receipt-one"))),
        )
        .await
        .unwrap();

    assert!(claim.auto_approved);
    assert_eq!(claim.status, claim::status::APPROVED);
    assert_eq!(claim.ai_amount, Some(dec!(45.50)));
}

#[tokio::test]
async fn amount_mismatch_or_large_amounts_go_to_manual() {
    let db = test_db().await;
    let co = seed_company(&db, "CLAIMS2", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C2").insert(&db).await;
    let ctx = admin_ctx(co.id);

    // OCR reads a different amount: zero tolerance, manual approval.
    let svc = service_with(db.clone(), readable(dec!(45.00), "Kedai Kopi", d(2025, 3, 10)));
    let mismatch = svc
        .create(&ctx, request(emp.id, dec!(45.50), Some(encode(b"r1"))))
        .await
        .unwrap();
    assert!(!mismatch.auto_approved);
    assert_eq!(mismatch.status, claim::status::PENDING);

    // Amount above the RM100 gate even with a perfect OCR match.
    let svc = service_with(db.clone(), readable(dec!(180.00), "Hotel Bunga", d(2025, 3, 11)));
    let large = svc
        .create(
            &ctx,
            CreateClaimRequest {
                claim_date: d(2025, 3, 11),
                ..request(emp.id, dec!(180.00), Some(encode(b"r2")))
            },
        )
        .await
        .unwrap();
    assert!(!large.auto_approved);
}

#[tokio::test]
async fn unreadable_receipts_require_manual_approval() {
    let db = test_db().await;
    let co = seed_company(&db, "CLAIMS3", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C3").insert(&db).await;

    let svc = service_with(db.clone(), ReceiptExtraction::unreadable());
    let claim = svc
        .create(
            &admin_ctx(co.id),
            request(emp.id, dec!(20.00), Some(encode(b"blurry"))),
        )
        .await
        .unwrap();

    assert!(!claim.auto_approved);
    assert_eq!(claim.status, claim::status::PENDING);
}

#[tokio::test]
async fn identical_receipt_bytes_are_rejected_with_the_original_claimant() {
    let db = test_db().await;
    let co = seed_company(&db, "DEDUP", company::work_rule::MIMIX).await;
    let first = EmployeeSeed::new(co.id, "D1").insert(&db).await;
    let second = EmployeeSeed::new(co.id, "D2").insert(&db).await;
    let ctx = admin_ctx(co.id);

    let svc = service_with(db.clone(), readable(dec!(30.00), "Restoran Seri", d(2025, 3, 10)));
    let original = svc
        .create(&ctx, request(first.id, dec!(30.00), Some(encode(b"same-image"))))
        .await
        .unwrap();

    let err = svc
        .create(&ctx, request(second.id, dec!(30.00), Some(encode(b"same-image"))))
        .await
        .unwrap_err();

    match err {
        ServiceError::Conflict(message) => {
            assert!(message.contains(&format!("Employee {}", "D1")), "{}", message);
            assert!(message.contains(&format!("#{}", original.id)), "{}", message);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn same_merchant_date_amount_is_a_similar_duplicate() {
    let db = test_db().await;
    let co = seed_company(&db, "DEDUP2", company::work_rule::MIMIX).await;
    let first = EmployeeSeed::new(co.id, "D3").insert(&db).await;
    let second = EmployeeSeed::new(co.id, "D4").insert(&db).await;
    let ctx = admin_ctx(co.id);

    // Different bytes, same extracted receipt; merchant case differs.
    let svc = service_with(db.clone(), readable(dec!(30.00), "Restoran Seri", d(2025, 3, 10)));
    svc.create(&ctx, request(first.id, dec!(30.00), Some(encode(b"photo-a"))))
        .await
        .unwrap();

    let svc = service_with(db.clone(), readable(dec!(30.00), "RESTORAN SERI", d(2025, 3, 10)));
    let err = svc
        .create(&ctx, request(second.id, dec!(30.00), Some(encode(b"photo-b"))))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn accommodation_cap_applies_on_create() {
    let db = test_db().await;
    let co = seed_company(&db, "CAP", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C5").insert(&db).await;

    let svc = service_with(db.clone(), ReceiptExtraction::unreadable());
    let claim = svc
        .create(
            &admin_ctx(co.id),
            CreateClaimRequest {
                category: "accommodation".to_string(),
                ..request(emp.id, dec!(150.00), None)
            },
        )
        .await
        .unwrap();

    assert_eq!(claim.amount, dec!(80));
    assert!(claim.amount_capped);
}

#[tokio::test]
async fn payroll_sweep_links_and_marks_paid() {
    let db = test_db().await;
    let co = seed_company(&db, "SWEEP", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C6").insert(&db).await;
    let ctx = admin_ctx(co.id);

    let svc = service_with(db.clone(), ReceiptExtraction::unreadable());
    let claim_row = svc
        .create(&ctx, request(emp.id, dec!(55.00), None))
        .await
        .unwrap();
    svc.approve(&ctx, claim_row.id).await.unwrap();

    let open = svc.for_payroll(&ctx, Some(emp.id)).await.unwrap();
    assert_eq!(open.len(), 1);

    let linked = svc
        .link_to_payroll(&ctx, vec![claim_row.id], 777)
        .await
        .unwrap();
    assert_eq!(linked, 1);

    let after = svc.get(&ctx, claim_row.id).await.unwrap();
    assert_eq!(after.status, claim::status::PAID);
    assert_eq!(after.linked_payroll_item_id, Some(777));

    // Swept claims leave the payroll feed, and cannot be reverted.
    assert!(svc.for_payroll(&ctx, Some(emp.id)).await.unwrap().is_empty());
    assert!(matches!(
        svc.revert(&ctx, claim_row.id).await,
        Err(ServiceError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn rejected_duplicates_do_not_block_resubmission() {
    let db = test_db().await;
    let co = seed_company(&db, "RESUB", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "C7").insert(&db).await;
    let ctx = admin_ctx(co.id);

    let svc = service_with(db.clone(), ReceiptExtraction::unreadable());
    let first = svc
        .create(&ctx, request(emp.id, dec!(42.00), Some(encode(b"again"))))
        .await
        .unwrap();
    svc.reject(&ctx, first.id, "wrong receipt".into()).await.unwrap();

    // The rejected claim no longer counts for duplicate detection.
    svc.create(&ctx, request(emp.id, dec!(42.00), Some(encode(b"again"))))
        .await
        .unwrap();
}
