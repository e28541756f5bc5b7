//! Salary advance bookkeeping: the amount = deducted + remaining
//! invariant and the completion transition.

mod common;

use common::*;
use kerani_api::entities::{company, salary_advance};
use kerani_api::errors::ServiceError;
use kerani_api::services::salary_advances::{CreateAdvanceRequest, SalaryAdvanceService};
use rust_decimal_macros::dec;

async fn active_advance(
    db: &std::sync::Arc<sea_orm::DatabaseConnection>,
    company_id: i64,
    employee_id: i64,
    amount: rust_decimal::Decimal,
    method: &str,
    installment: Option<rust_decimal::Decimal>,
) -> salary_advance::Model {
    let svc = SalaryAdvanceService::new(db.clone());
    let ctx = admin_ctx(company_id);
    let advance = svc
        .create(
            &ctx,
            CreateAdvanceRequest {
                employee_id,
                amount,
                deduction_method: method.to_string(),
                installment_amount: installment,
                expected_deduction_month: Some(7),
                expected_deduction_year: Some(2025),
            },
        )
        .await
        .unwrap();
    svc.activate(&ctx, advance.id).await.unwrap()
}

#[tokio::test]
async fn installments_preserve_the_balance_invariant_until_completion() {
    let db = test_db().await;
    let co = seed_company(&db, "ADV", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "A1").insert(&db).await;

    let advance = active_advance(
        &db,
        co.id,
        emp.id,
        dec!(900),
        salary_advance::deduction_method::INSTALLMENT,
        Some(dec!(400)),
    )
    .await;

    let svc = SalaryAdvanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let mut month = 7;
    let mut current = advance;
    while current.status == salary_advance::status::ACTIVE {
        current = svc.deduct(&ctx, current.id, month, 2025, None).await.unwrap();
        assert_eq!(
            current.amount,
            current.total_deducted + current.remaining_balance,
            "invariant broke at month {}",
            month
        );
        month += 1;
    }

    // 400 + 400 + 100 over three payroll months.
    assert_eq!(current.status, salary_advance::status::COMPLETED);
    assert_eq!(current.total_deducted, dec!(900));
    assert_eq!(current.remaining_balance, dec!(0));

    let history = svc.deductions(&ctx, current.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].amount, dec!(100));

    // A completed advance refuses further deductions.
    assert!(matches!(
        svc.deduct(&ctx, current.id, month, 2025, None).await,
        Err(ServiceError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn full_method_clears_in_one_deduction() {
    let db = test_db().await;
    let co = seed_company(&db, "ADV2", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "A2").insert(&db).await;

    let advance = active_advance(
        &db,
        co.id,
        emp.id,
        dec!(500),
        salary_advance::deduction_method::FULL,
        None,
    )
    .await;

    let svc = SalaryAdvanceService::new(db.clone());
    let after = svc
        .deduct(&admin_ctx(co.id), advance.id, 7, 2025, None)
        .await
        .unwrap();
    assert_eq!(after.status, salary_advance::status::COMPLETED);
    assert_eq!(after.total_deducted, dec!(500));
}

#[tokio::test]
async fn cancel_is_blocked_once_deductions_exist() {
    let db = test_db().await;
    let co = seed_company(&db, "ADV3", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "A3").insert(&db).await;

    let advance = active_advance(
        &db,
        co.id,
        emp.id,
        dec!(600),
        salary_advance::deduction_method::INSTALLMENT,
        Some(dec!(200)),
    )
    .await;

    let svc = SalaryAdvanceService::new(db.clone());
    let ctx = admin_ctx(co.id);
    svc.deduct(&ctx, advance.id, 7, 2025, None).await.unwrap();

    assert!(matches!(
        svc.cancel(&ctx, advance.id).await,
        Err(ServiceError::InvalidOperation(_))
    ));
}
