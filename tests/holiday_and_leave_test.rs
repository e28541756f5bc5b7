//! Holiday notifier dedupe and the leave balance lifecycle.

mod common;

use common::*;
use kerani_api::entities::{company, leave_request, notification};
use kerani_api::errors::ServiceError;
use kerani_api::services::holiday_notifier::HolidayNotifierService;
use kerani_api::services::leave::{CreateLeaveRequest, LeaveService};
use kerani_api::services::notifications::NotificationService;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn idle_departments_are_notified_working_ones_are_not() {
    let db = test_db().await;
    // Department-grouped company participates.
    let co = seed_company_with_settings(
        &db,
        "NOTIF",
        company::work_rule::MIMIX,
        serde_json::json!({}),
    )
    .await;
    let working_dept = seed_department(&db, co.id, "OPS").await;
    let idle_dept = seed_department(&db, co.id, "SALES").await;

    let worker = EmployeeSeed::new(co.id, "W1").department(working_dept.id).insert(&db).await;
    let idle_a = EmployeeSeed::new(co.id, "I1").department(idle_dept.id).insert(&db).await;
    let idle_b = EmployeeSeed::new(co.id, "I2").department(idle_dept.id).insert(&db).await;

    let holiday_date = d(2025, 8, 31);
    let holiday = seed_public_holiday(&db, co.id, holiday_date, "Merdeka Day").await;
    // OPS works the holiday.
    ScheduleSeed::new(co.id, worker.id, holiday_date).insert(&db).await;

    let svc = HolidayNotifierService::new(db.clone(), NotificationService::new(db.clone()));
    let summary = svc.run_for_date(holiday_date).await;

    assert_eq!(summary.holidays_found, 1);
    assert_eq!(summary.working_departments, 1);
    assert_eq!(summary.notified, 2);

    for emp in [&idle_a, &idle_b] {
        let count = notification::Entity::find()
            .filter(notification::Column::EmployeeId.eq(emp.id))
            .filter(notification::Column::ReferenceId.eq(holiday.id))
            .count(&*db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
    let worker_count = notification::Entity::find()
        .filter(notification::Column::EmployeeId.eq(worker.id))
        .count(&*db)
        .await
        .unwrap();
    assert_eq!(worker_count, 0);

    // Rerun: the insert-once guard holds.
    let rerun = svc.run_for_date(holiday_date).await;
    assert_eq!(rerun.notified, 0);
    let total = notification::Entity::find().count(&*db).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn outlet_grouped_companies_are_skipped() {
    let db = test_db().await;
    // seed_company uses outlet grouping.
    let co = seed_company(&db, "OUTLETCO", company::work_rule::MIMIX).await;
    let dept = seed_department(&db, co.id, "FLOOR").await;
    EmployeeSeed::new(co.id, "O1").department(dept.id).insert(&db).await;

    let holiday_date = d(2025, 8, 31);
    seed_public_holiday(&db, co.id, holiday_date, "Merdeka Day").await;

    let svc = HolidayNotifierService::new(db.clone(), NotificationService::new(db.clone()));
    let summary = svc.run_for_date(holiday_date).await;

    assert_eq!(summary.notified, 0);
    assert_eq!(notification::Entity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn leave_approval_consumes_and_cancellation_restores_balance() {
    let db = test_db().await;
    let co = seed_company(&db, "LEAVE", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "L1").insert(&db).await;
    let al = seed_leave_type(&db, co.id, "AL", true).await;
    let balance = seed_leave_balance(&db, co.id, emp.id, al.id, 2025, dec!(12), Decimal::ZERO).await;

    let svc = LeaveService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let request = svc
        .create(
            &ctx,
            CreateLeaveRequest {
                employee_id: emp.id,
                leave_type_id: al.id,
                start_date: d(2025, 7, 7),
                end_date: d(2025, 7, 9),
                total_days: Some(dec!(3)),
                reason: None,
            },
        )
        .await
        .unwrap();

    svc.approve(&ctx, request.id).await.unwrap();
    let after_approve = kerani_api::entities::leave_balance::Entity::find_by_id(balance.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_approve.used_days, dec!(3));
    assert_eq!(after_approve.remaining(), dec!(9));

    svc.cancel(&ctx, request.id).await.unwrap();
    let after_cancel = kerani_api::entities::leave_balance::Entity::find_by_id(balance.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_cancel.used_days, Decimal::ZERO);

    let row = leave_request::Entity::find_by_id(request.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, leave_request::status::CANCELLED);
}

#[tokio::test]
async fn approval_fails_when_balance_is_short() {
    let db = test_db().await;
    let co = seed_company(&db, "LEAVE2", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "L2").insert(&db).await;
    let al = seed_leave_type(&db, co.id, "AL", true).await;
    let balance = seed_leave_balance(&db, co.id, emp.id, al.id, 2025, dec!(2), Decimal::ZERO).await;

    let svc = LeaveService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let request = svc
        .create(
            &ctx,
            CreateLeaveRequest {
                employee_id: emp.id,
                leave_type_id: al.id,
                start_date: d(2025, 7, 7),
                end_date: d(2025, 7, 11),
                total_days: Some(dec!(5)),
                reason: None,
            },
        )
        .await
        .unwrap();

    let err = svc.approve(&ctx, request.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // Nothing was consumed and the request is still pending.
    let untouched = kerani_api::entities::leave_balance::Entity::find_by_id(balance.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.used_days, Decimal::ZERO);
    let row = leave_request::Entity::find_by_id(request.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, leave_request::status::PENDING);
}

#[tokio::test]
async fn unpaid_leave_does_not_touch_balances() {
    let db = test_db().await;
    let co = seed_company(&db, "LEAVE3", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "L3").insert(&db).await;
    let unpaid = seed_leave_type(&db, co.id, "UL", false).await;

    let svc = LeaveService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let request = svc
        .create(
            &ctx,
            CreateLeaveRequest {
                employee_id: emp.id,
                leave_type_id: unpaid.id,
                start_date: d(2025, 7, 7),
                end_date: d(2025, 7, 8),
                total_days: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    // Inclusive default: two days.
    assert_eq!(request.total_days, dec!(2));

    // No balance row exists; unpaid approval must still succeed.
    svc.approve(&ctx, request.id).await.unwrap();
}
