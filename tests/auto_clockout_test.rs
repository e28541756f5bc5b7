//! Auto clock-out job: close policy, review flags and idempotence.

mod common;

use common::*;
use kerani_api::entities::{clock_record, company};
use kerani_api::services::attendance::{AdminUpsertRequest, AttendanceService};
use kerani_api::services::auto_clockout::AutoClockoutService;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

async fn open_record(
    db: &std::sync::Arc<sea_orm::DatabaseConnection>,
    company_id: i64,
    employee_id: i64,
    date: chrono::NaiveDate,
    events: (Option<chrono::NaiveTime>, Option<chrono::NaiveTime>, Option<chrono::NaiveTime>),
) -> clock_record::Model {
    let svc = AttendanceService::new(db.clone());
    svc.admin_upsert(
        &admin_ctx(company_id),
        AdminUpsertRequest {
            employee_id,
            work_date: date,
            clock_in_1: events.0,
            clock_out_1: events.1,
            clock_in_2: events.2,
            clock_out_2: None,
            total_work_minutes: None,
            ot_minutes: None,
            notes: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn closes_at_rostered_shift_end_and_flags_review() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E3").insert(&db).await;
    let date = d(2025, 1, 10);
    ScheduleSeed::new(co.id, emp.id, date)
        .window(t(9, 0), t(18, 0))
        .insert(&db)
        .await;
    open_record(&db, co.id, emp.id, date, (Some(t(9, 0)), Some(t(12, 0)), Some(t(12, 45)))).await;

    let job = AutoClockoutService::new(db.clone());
    let summary = job.run_for_date(date).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.failed, 0);

    let record = clock_record::Entity::find()
        .filter(clock_record::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.clock_out_2, Some(t(18, 0)));
    assert!(record.is_auto_clock_out);
    assert!(record.needs_admin_review);
    assert_eq!(record.notes.as_deref(), Some("Auto-closed at midnight"));
    // 09:00-18:00 with a 45-minute break: 540 gross, no deduction.
    assert_eq!(record.total_work_minutes, 540);
    assert_eq!(record.ot_minutes, 0);
}

#[tokio::test]
async fn without_roster_assumes_a_standard_day() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E9").insert(&db).await;
    let date = d(2025, 1, 10);
    open_record(&db, co.id, emp.id, date, (Some(t(10, 0)), None, None)).await;

    let job = AutoClockoutService::new(db.clone());
    let summary = job.run_for_date(date).await;
    assert_eq!(summary.closed, 1);

    let record = clock_record::Entity::find()
        .filter(clock_record::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();

    // 510 standard minutes from the 10:00 clock-in.
    assert_eq!(record.clock_out_2, Some(t(18, 30)));
    assert_eq!(record.total_work_minutes, 510);
}

#[tokio::test]
async fn missing_break_return_infers_zero_length_break() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E10").insert(&db).await;
    let date = d(2025, 1, 10);
    open_record(&db, co.id, emp.id, date, (Some(t(9, 0)), Some(t(13, 0)), None)).await;

    let job = AutoClockoutService::new(db.clone());
    job.run_for_date(date).await;

    let record = clock_record::Entity::find()
        .filter(clock_record::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.clock_in_2, Some(t(13, 0)));
    assert!(record.clock_out_2.is_some());
    assert_eq!(record.total_break_minutes, 0);
}

#[tokio::test]
async fn rerun_on_the_same_day_is_a_no_op() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E11").insert(&db).await;
    let date = d(2025, 1, 10);
    ScheduleSeed::new(co.id, emp.id, date)
        .window(t(9, 0), t(18, 0))
        .insert(&db)
        .await;
    open_record(&db, co.id, emp.id, date, (Some(t(9, 0)), Some(t(12, 0)), Some(t(12, 45)))).await;

    let job = AutoClockoutService::new(db.clone());
    let first = job.run_for_date(date).await;
    assert_eq!(first.closed, 1);

    let second = job.run_for_date(date).await;
    assert_eq!(second.processed, 0);
    assert_eq!(second.closed, 0);
}

#[tokio::test]
async fn complete_records_are_not_touched() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E12").insert(&db).await;
    let date = d(2025, 1, 10);

    let svc = AttendanceService::new(db.clone());
    svc.admin_upsert(
        &admin_ctx(co.id),
        AdminUpsertRequest {
            employee_id: emp.id,
            work_date: date,
            clock_in_1: Some(t(9, 0)),
            clock_out_1: Some(t(12, 0)),
            clock_in_2: Some(t(13, 0)),
            clock_out_2: Some(t(18, 0)),
            total_work_minutes: None,
            ot_minutes: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let job = AutoClockoutService::new(db.clone());
    let summary = job.run_for_date(date).await;
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn review_flow_clears_the_flag() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E13").insert(&db).await;
    let date = d(2025, 1, 10);
    open_record(&db, co.id, emp.id, date, (Some(t(9, 0)), None, None)).await;

    let job = AutoClockoutService::new(db.clone());
    job.run_for_date(date).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let pending = svc.needs_review(&ctx).await.unwrap();
    assert_eq!(pending.len(), 1);

    let reviewed = svc
        .mark_reviewed(&ctx, pending[0].id, Some(480), None)
        .await
        .unwrap();
    assert!(!reviewed.needs_admin_review);
    assert_eq!(reviewed.total_work_minutes, 480);
    assert_eq!(reviewed.reviewed_by, Some(ctx.user_id));

    assert!(svc.needs_review(&ctx).await.unwrap().is_empty());
}
