//! Commission engine: the 15th-to-14th period, effective-shift counting,
//! pool conservation and the draft/finalized lifecycle.

mod common;

use common::*;
use kerani_api::entities::{company, outlet_sales};
use kerani_api::errors::ServiceError;
use kerani_api::services::commission::{CommissionService, UpsertSalesRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn sales_request(outlet_id: i64, month: i32, year: i32, total: Decimal) -> UpsertSalesRequest {
    UpsertSalesRequest {
        outlet_id: Some(outlet_id),
        department_id: None,
        period_month: month,
        period_year: year,
        total_sales: total,
        commission_rate: None,
    }
}

/// Seeds `normal` working shifts plus `ph` public-holiday shifts inside
/// the 2025-02 payout period (2025-01-15 .. 2025-02-14).
async fn seed_period_shifts(
    db: &std::sync::Arc<sea_orm::DatabaseConnection>,
    company_id: i64,
    outlet_id: i64,
    employee_id: i64,
    normal: u32,
    ph: u32,
) {
    let mut date = d(2025, 1, 15);
    for _ in 0..normal {
        ScheduleSeed::new(company_id, employee_id, date)
            .outlet(outlet_id)
            .insert(db)
            .await;
        date = date.succ_opt().unwrap();
    }
    for _ in 0..ph {
        ScheduleSeed::new(company_id, employee_id, date)
            .outlet(outlet_id)
            .public_holiday()
            .insert(db)
            .await;
        date = date.succ_opt().unwrap();
    }
}

#[tokio::test]
async fn worked_example_splits_the_pool_exactly() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O1").await;
    let a = EmployeeSeed::new(co.id, "A").insert(&db).await;
    let b = EmployeeSeed::new(co.id, "B").insert(&db).await;

    seed_period_shifts(&db, co.id, outlet.id, a.id, 20, 1).await;
    seed_period_shifts(&db, co.id, outlet.id, b.id, 22, 0).await;

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(120000)))
        .await
        .unwrap();
    assert_eq!(sales.commission_pool, dec!(7200.00));

    let sales = svc.calculate(&ctx, sales.id).await.unwrap();
    assert_eq!(sales.total_effective_shifts, 44);
    assert_eq!(sales.per_shift_value, dec!(163.6364));

    let payouts = svc.payouts(&ctx, sales.id).await.unwrap();
    assert_eq!(payouts.len(), 2);
    for payout in &payouts {
        assert_eq!(payout.effective_shifts, 22);
        assert_eq!(payout.commission_amount, dec!(3600.00));
    }
    let paid: Decimal = payouts.iter().map(|p| p.commission_amount).sum();
    assert_eq!(paid, dec!(7200.00));
}

#[tokio::test]
async fn public_holiday_shifts_count_double() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O2").await;
    let emp = EmployeeSeed::new(co.id, "C").insert(&db).await;

    seed_period_shifts(&db, co.id, outlet.id, emp.id, 10, 3).await;

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(10000)))
        .await
        .unwrap();
    svc.calculate(&ctx, sales.id).await.unwrap();

    let payouts = svc.payouts(&ctx, sales.id).await.unwrap();
    assert_eq!(payouts[0].normal_shifts, 10);
    assert_eq!(payouts[0].ph_shifts, 3);
    assert_eq!(payouts[0].effective_shifts, 16);
}

#[tokio::test]
async fn shifts_outside_the_period_do_not_count() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O3").await;
    let emp = EmployeeSeed::new(co.id, "D").insert(&db).await;

    // One day before the window, one inside, one after.
    for date in [d(2025, 1, 14), d(2025, 2, 1), d(2025, 2, 15)] {
        ScheduleSeed::new(co.id, emp.id, date)
            .outlet(outlet.id)
            .insert(&db)
            .await;
    }

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(5000)))
        .await
        .unwrap();
    let sales = svc.calculate(&ctx, sales.id).await.unwrap();

    assert_eq!(sales.total_effective_shifts, 1);
}

#[tokio::test]
async fn off_template_shifts_are_excluded() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O4").await;
    let emp = EmployeeSeed::new(co.id, "E").insert(&db).await;
    let off = seed_shift_template(&db, co.id, "OFF", t(0, 0), t(0, 0), true).await;

    ScheduleSeed::new(co.id, emp.id, d(2025, 2, 3))
        .outlet(outlet.id)
        .insert(&db)
        .await;
    ScheduleSeed::new(co.id, emp.id, d(2025, 2, 4))
        .outlet(outlet.id)
        .template(off.id)
        .insert(&db)
        .await;

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(5000)))
        .await
        .unwrap();
    let sales = svc.calculate(&ctx, sales.id).await.unwrap();

    assert_eq!(sales.total_effective_shifts, 1);
}

#[tokio::test]
async fn recalculate_wipes_and_rewrites_payouts() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O5").await;
    let emp = EmployeeSeed::new(co.id, "F").insert(&db).await;
    seed_period_shifts(&db, co.id, outlet.id, emp.id, 5, 0).await;

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(1000)))
        .await
        .unwrap();
    svc.calculate(&ctx, sales.id).await.unwrap();
    svc.calculate(&ctx, sales.id).await.unwrap();

    // Two calculates leave exactly one payout row per employee.
    let payouts = svc.payouts(&ctx, sales.id).await.unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].commission_amount, dec!(1000.00));
}

#[tokio::test]
async fn lifecycle_guards_finalize_revert_and_delete() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "O6").await;
    let emp = EmployeeSeed::new(co.id, "G").insert(&db).await;
    seed_period_shifts(&db, co.id, outlet.id, emp.id, 3, 0).await;

    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sales = svc
        .upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(900)))
        .await
        .unwrap();

    // Finalize before calculate: no payouts yet.
    assert!(matches!(
        svc.finalize(&ctx, sales.id).await,
        Err(ServiceError::InvalidOperation(_))
    ));

    svc.calculate(&ctx, sales.id).await.unwrap();
    let finalized = svc.finalize(&ctx, sales.id).await.unwrap();
    assert_eq!(finalized.status, outlet_sales::status::FINALIZED);

    // Finalized rows refuse edits, recalculation and deletion.
    assert!(matches!(
        svc.upsert_sales(&ctx, sales_request(outlet.id, 2, 2025, dec!(999))).await,
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        svc.calculate(&ctx, sales.id).await,
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        svc.delete(&ctx, sales.id).await,
        Err(ServiceError::Conflict(_))
    ));

    let draft = svc.revert(&ctx, sales.id).await.unwrap();
    assert_eq!(draft.status, outlet_sales::status::DRAFT);
    svc.delete(&ctx, sales.id).await.unwrap();
    assert!(matches!(
        svc.get(&ctx, sales.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn sales_row_requires_exactly_one_grouping_dimension() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let svc = CommissionService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let both = UpsertSalesRequest {
        outlet_id: Some(1),
        department_id: Some(1),
        period_month: 2,
        period_year: 2025,
        total_sales: dec!(100),
        commission_rate: None,
    };
    assert!(matches!(
        svc.upsert_sales(&ctx, both).await,
        Err(ServiceError::ValidationError(_))
    ));

    let neither = UpsertSalesRequest {
        outlet_id: None,
        department_id: None,
        period_month: 2,
        period_year: 2025,
        total_sales: dec!(100),
        commission_rate: None,
    };
    assert!(matches!(
        svc.upsert_sales(&ctx, neither).await,
        Err(ServiceError::ValidationError(_))
    ));
}
