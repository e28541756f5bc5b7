//! Resignation lifecycle and final settlement: working-days proration,
//! encashment, notice buy-out, clearance guard and process atomicity.

mod common;

use common::*;
use kerani_api::entities::{company, employee, leave_request, resignation, schedule};
use kerani_api::errors::ServiceError;
use kerani_api::services::resignations::{CreateResignationRequest, ResignationService};
use kerani_api::services::settlement::SettlementService;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

async fn resignation_in_clearing(
    db: &std::sync::Arc<sea_orm::DatabaseConnection>,
    company_id: i64,
    employee_id: i64,
    notice: chrono::NaiveDate,
    lwd: chrono::NaiveDate,
) -> resignation::Model {
    let svc = ResignationService::new(db.clone());
    let ctx = admin_ctx(company_id);
    let created = svc
        .create(
            &ctx,
            CreateResignationRequest {
                employee_id,
                notice_date: notice,
                last_working_day: lwd,
                reason: Some("relocating".into()),
            },
        )
        .await
        .unwrap();
    svc.approve(&ctx, created.id).await.unwrap()
}

#[tokio::test]
async fn settlement_prorates_on_working_days_only() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "SETTLE",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    // Joined 2022-01-01, leaving 2025-03-14: 38 months of service.
    let emp = EmployeeSeed::new(co.id, "E5")
        .basic(dec!(3000))
        .joined(d(2022, 1, 1))
        .insert(&db)
        .await;

    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 2, 1), d(2025, 3, 14)).await;

    let svc = SettlementService::new(db.clone());
    let breakdown = svc
        .compute_and_store(&admin_ctx(co.id), res.id)
        .await
        .unwrap();

    // March 2025: 21 weekdays, 10 worked through the 14th.
    assert_eq!(breakdown.weekdays_in_month, 21);
    assert_eq!(breakdown.weekdays_worked, 10);
    assert_eq!(breakdown.prorated_salary, dec!(1428.57));
    // Calendar-day proration would have been 1354.84; they must differ.
    assert_ne!(breakdown.prorated_salary, dec!(1354.84));

    // Breakdown is persisted on the row.
    let stored = svc.stored(&admin_ctx(co.id), res.id).await.unwrap().unwrap();
    assert_eq!(stored.prorated_salary, dec!(1428.57));
}

#[tokio::test]
async fn leave_encashment_uses_the_configured_rate_and_divisor() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "ENCASH",
        company::work_rule::MIMIX,
        serde_json::json!({
            "settlement_working_days_per_month": 22,
            "settlement_leave_encashment_rate": 1.0,
        }),
    )
    .await;
    let emp = EmployeeSeed::new(co.id, "E20")
        .basic(dec!(2200))
        .insert(&db)
        .await;
    let al = seed_leave_type(&db, co.id, "AL", true).await;
    let unpaid = seed_leave_type(&db, co.id, "UL", false).await;
    // 8 remaining paid days; unpaid balances never encash.
    seed_leave_balance(&db, co.id, emp.id, al.id, 2025, dec!(12), dec!(4)).await;
    seed_leave_balance(&db, co.id, emp.id, unpaid.id, 2025, dec!(30), Decimal::ZERO).await;

    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 5, 1), d(2025, 6, 30)).await;

    let svc = SettlementService::new(db.clone());
    let breakdown = svc
        .compute_and_store(&admin_ctx(co.id), res.id)
        .await
        .unwrap();

    assert_eq!(breakdown.encashed_days, dec!(8));
    // 2200 / 22 = 100 per day, 8 days.
    assert_eq!(breakdown.leave_encashment, dec!(800.00));
}

#[tokio::test]
async fn short_notice_incurs_a_buyout_unless_waived() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "NOTICE",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    // Service under 24 months: 28 days required.
    let emp = EmployeeSeed::new(co.id, "E21")
        .basic(dec!(2200))
        .joined(d(2024, 6, 1))
        .insert(&db)
        .await;

    // 14 days of notice against a 28-day requirement.
    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 3, 1), d(2025, 3, 15)).await;
    assert_eq!(res.required_notice_days, 28);
    assert_eq!(res.actual_notice_days, 14);

    let svc = SettlementService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let breakdown = svc.compute_and_store(&ctx, res.id).await.unwrap();
    assert_eq!(breakdown.notice_shortfall_days, 14);
    // 2200/22 = 100 daily, 14 days short.
    assert_eq!(breakdown.notice_buyout, dec!(1400.00));

    // Waiving the notice zeroes the buy-out.
    ResignationService::new(db.clone())
        .waive_notice(&ctx, res.id)
        .await
        .unwrap();
    let waived = svc.compute_and_store(&ctx, res.id).await.unwrap();
    assert_eq!(waived.notice_buyout, Decimal::ZERO);
    assert!(waived.notice_waived);
    assert_eq!(waived.net, breakdown.net + dec!(1400.00));
}

#[tokio::test]
async fn statutory_deductions_come_off_the_net() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "STAT",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    let emp = EmployeeSeed::new(co.id, "E22")
        .basic(dec!(3000))
        .joined(d(2020, 1, 1))
        .ic("900101-10-1234")
        .insert(&db)
        .await;

    // Full notice, last day at end of June (full month worked).
    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 4, 1), d(2025, 6, 30)).await;

    let svc = SettlementService::new(db.clone());
    let breakdown = svc
        .compute_and_store(&admin_ctx(co.id), res.id)
        .await
        .unwrap();

    assert_eq!(breakdown.prorated_salary, dec!(3000.00));
    // EPF 11% of 3000.
    assert_eq!(breakdown.statutory.epf_employee, dec!(330.00));
    assert!(breakdown.statutory.total() > Decimal::ZERO);
    assert_eq!(
        breakdown.net,
        breakdown.gross - breakdown.statutory.total() - breakdown.notice_buyout
    );
}

#[tokio::test]
async fn process_deletes_future_schedules_and_restores_leave() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "PROC",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    let emp = EmployeeSeed::new(co.id, "E6").insert(&db).await;
    let al = seed_leave_type(&db, co.id, "AL", true).await;
    let lwd = d(2025, 4, 30);

    let svc = ResignationService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 3, 1), lwd).await;

    // Roster rows on both sides of the last working day.
    ScheduleSeed::new(co.id, emp.id, d(2025, 4, 29)).insert(&db).await;
    ScheduleSeed::new(co.id, emp.id, d(2025, 5, 2)).insert(&db).await;
    ScheduleSeed::new(co.id, emp.id, d(2025, 5, 3)).insert(&db).await;

    // Approved 3-day AL starting 2025-05-05, already charged to balance.
    let balance = seed_leave_balance(&db, co.id, emp.id, al.id, 2025, dec!(12), dec!(3)).await;
    leave_request::ActiveModel {
        company_id: Set(co.id),
        employee_id: Set(emp.id),
        leave_type_id: Set(al.id),
        start_date: Set(d(2025, 5, 5)),
        end_date: Set(d(2025, 5, 7)),
        total_days: Set(dec!(3)),
        status: Set(leave_request::status::APPROVED.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();

    let processed = svc.process(&ctx, res.id, true).await.unwrap();
    assert_eq!(processed.status, resignation::status::COMPLETED);
    assert!(processed.settlement_date.is_some());

    // Employee exited with history preserved.
    let exited = employee::Entity::find_by_id(emp.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exited.status, employee::status::INACTIVE);
    assert_eq!(exited.employment_status, employee::employment_status::EXITED);
    assert_eq!(exited.resign_date, Some(lwd));

    // Only the pre-LWD schedule survives.
    let remaining = schedule::Entity::find()
        .filter(schedule::Column::EmployeeId.eq(emp.id))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].schedule_date, d(2025, 4, 29));

    // Leave cancelled and the balance restored.
    let leave = leave_request::Entity::find()
        .filter(leave_request::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(leave.status, leave_request::status::CANCELLED);

    let restored = kerani_api::entities::leave_balance::Entity::find_by_id(balance.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.used_days, Decimal::ZERO);
}

#[tokio::test]
async fn process_guard_refuses_incomplete_clearance() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "GUARD",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    seed_clearance_template(&db, co.id, "Return laptop", 1).await;
    seed_clearance_template(&db, co.id, "Revoke access", 2).await;
    let emp = EmployeeSeed::new(co.id, "E23").insert(&db).await;

    let svc = ResignationService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 3, 1), d(2025, 4, 30)).await;

    // Two seeded items, none complete: the guard holds.
    let items = svc.clearance_items(&ctx, res.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(matches!(
        svc.process(&ctx, res.id, false).await,
        Err(ServiceError::InvalidOperation(_))
    ));

    // A failed process left everything untouched.
    let emp_after = employee::Entity::find_by_id(emp.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(emp_after.status, employee::status::ACTIVE);
    assert_eq!(
        emp_after.employment_status,
        employee::employment_status::NOTICE
    );

    // Completing every item flips the parent flag and unblocks process.
    for item in items {
        svc.set_clearance_item(&ctx, res.id, item.id, true)
            .await
            .unwrap();
    }
    let ready = svc.get(&ctx, res.id).await.unwrap();
    assert!(ready.clearance_completed);
    svc.process(&ctx, res.id, false).await.unwrap();

    // The guard fields prevent a second run.
    assert!(matches!(
        svc.process(&ctx, res.id, true).await,
        Err(ServiceError::Conflict(_))
    ));
}

#[tokio::test]
async fn one_active_resignation_per_employee() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "DUP",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    let emp = EmployeeSeed::new(co.id, "E24").insert(&db).await;

    let svc = ResignationService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let request = || CreateResignationRequest {
        employee_id: emp.id,
        notice_date: d(2025, 3, 1),
        last_working_day: d(2025, 4, 30),
        reason: None,
    };

    let first = svc.create(&ctx, request()).await.unwrap();
    assert!(matches!(
        svc.create(&ctx, request()).await,
        Err(ServiceError::Conflict(_))
    ));

    // Withdrawing frees the slot.
    svc.withdraw(&ctx, first.id).await.unwrap();
    svc.create(&ctx, request()).await.unwrap();
}

#[tokio::test]
async fn cancel_during_clearing_restores_the_employee() {
    let db = test_db().await;
    let co = seed_company_with_settings(
        &db,
        "CANCEL",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    let emp = EmployeeSeed::new(co.id, "E25").insert(&db).await;

    let svc = ResignationService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let res = resignation_in_clearing(&db, co.id, emp.id, d(2025, 3, 1), d(2025, 4, 30)).await;

    let on_notice = employee::Entity::find_by_id(emp.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        on_notice.employment_status,
        employee::employment_status::NOTICE
    );

    svc.cancel(&ctx, res.id).await.unwrap();

    let restored = employee::Entity::find_by_id(emp.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        restored.employment_status,
        employee::employment_status::EMPLOYED
    );
    assert!(restored.last_working_day.is_none());
}
