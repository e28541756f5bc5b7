//! Attendance engine integration tests: regime computation through the
//! admin write path, approval transitions, OT tri-state and the bulk
//! recalculate.

mod common;

use common::*;
use kerani_api::entities::{clock_record, company};
use kerani_api::errors::ServiceError;
use kerani_api::services::attendance::{AdminUpsertRequest, AttendanceService};

fn upsert(employee_id: i64, date: chrono::NaiveDate) -> AdminUpsertRequest {
    AdminUpsertRequest {
        employee_id,
        work_date: date,
        clock_in_1: None,
        clock_out_1: None,
        clock_in_2: None,
        clock_out_2: None,
        total_work_minutes: None,
        ot_minutes: None,
        notes: None,
    }
}

#[tokio::test]
async fn mimix_day_computes_clamped_totals_with_floored_ot() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E1").insert(&db).await;
    let work_date = d(2025, 1, 10);
    ScheduleSeed::new(co.id, emp.id, work_date)
        .window(t(9, 0), t(18, 0))
        .insert(&db)
        .await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                clock_in_1: Some(t(8, 55)),
                clock_out_1: Some(t(12, 30)),
                clock_in_2: Some(t(13, 20)),
                clock_out_2: Some(t(18, 50)),
                ..upsert(emp.id, work_date)
            },
        )
        .await
        .unwrap();

    // Start clamps to 09:00; break 50 within allowance; raw OT 80 -> 60.
    assert_eq!(record.total_work_minutes, 590);
    assert_eq!(record.total_break_minutes, 50);
    assert_eq!(record.ot_minutes, 60);
}

#[tokio::test]
async fn aa_alive_day_sums_sessions_with_exact_ot() {
    let db = test_db().await;
    let co = seed_company(&db, "AAALIVE", company::work_rule::AA_ALIVE).await;
    let emp = EmployeeSeed::new(co.id, "E2").insert(&db).await;
    let work_date = d(2025, 1, 10);

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                clock_in_1: Some(t(8, 0)),
                clock_out_1: Some(t(12, 0)),
                clock_in_2: Some(t(13, 0)),
                clock_out_2: Some(t(19, 30)),
                ..upsert(emp.id, work_date)
            },
        )
        .await
        .unwrap();

    assert_eq!(record.total_work_minutes, 630);
    assert_eq!(record.total_break_minutes, 60);
    assert_eq!(record.ot_minutes, 90);
}

#[tokio::test]
async fn aa_alive_rejects_direct_totals_override() {
    let db = test_db().await;
    let co = seed_company(&db, "AAALIVE", company::work_rule::AA_ALIVE).await;
    let emp = EmployeeSeed::new(co.id, "E3").insert(&db).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let result = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                total_work_minutes: Some(480),
                ..upsert(emp.id, d(2025, 1, 10))
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn mimix_admin_may_override_totals_directly() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E4").insert(&db).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                total_work_minutes: Some(480),
                ot_minutes: Some(30),
                ..upsert(emp.id, d(2025, 1, 10))
            },
        )
        .await
        .unwrap();

    assert_eq!(record.total_work_minutes, 480);
    assert_eq!(record.ot_minutes, 30);
    // Clock events stay untouched.
    assert!(record.clock_in_1.is_none());
}

#[tokio::test]
async fn approval_transitions_guard_their_preconditions() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E5").insert(&db).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                clock_in_1: Some(t(9, 0)),
                clock_out_1: Some(t(18, 0)),
                ..upsert(emp.id, d(2025, 1, 10))
            },
        )
        .await
        .unwrap();

    let approved = svc.approve(&ctx, record.id).await.unwrap();
    assert_eq!(approved.status, clock_record::status::APPROVED);
    assert_eq!(approved.approved_by, Some(ctx.user_id));

    // Double approval is a precondition failure...
    assert!(matches!(
        svc.approve(&ctx, record.id).await,
        Err(ServiceError::Conflict(_))
    ));

    // ...until an explicit revert brings it back to pending.
    let reverted = svc.revert(&ctx, record.id).await.unwrap();
    assert_eq!(reverted.status, clock_record::status::PENDING);
    assert!(reverted.approved_by.is_none());

    let rejected = svc
        .reject(&ctx, record.id, "no supporting roster".into())
        .await
        .unwrap();
    assert_eq!(rejected.status, clock_record::status::REJECTED);
    assert_eq!(rejected.reject_reason.as_deref(), Some("no supporting roster"));
}

#[tokio::test]
async fn ot_decision_is_tri_state_and_rejection_needs_reason() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E6").insert(&db).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                clock_in_1: Some(t(9, 0)),
                clock_out_1: Some(t(19, 30)),
                ..upsert(emp.id, d(2025, 1, 10))
            },
        )
        .await
        .unwrap();
    assert_eq!(record.ot_approved, None);

    assert!(matches!(
        svc.decide_ot(&ctx, record.id, false, None).await,
        Err(ServiceError::ValidationError(_))
    ));

    let decided = svc
        .decide_ot(&ctx, record.id, false, Some("not pre-authorised".into()))
        .await
        .unwrap();
    assert_eq!(decided.ot_approved, Some(false));
    assert_eq!(decided.ot_reject_reason.as_deref(), Some("not pre-authorised"));

    let approved = svc.decide_ot(&ctx, record.id, true, None).await.unwrap();
    assert_eq!(approved.ot_approved, Some(true));
    assert!(approved.ot_reject_reason.is_none());
}

#[tokio::test]
async fn recalculate_is_idempotent_and_fixes_stale_totals() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E7").insert(&db).await;

    let svc = AttendanceService::new(db.clone());
    let ctx = admin_ctx(co.id);

    let record = svc
        .admin_upsert(
            &ctx,
            AdminUpsertRequest {
                clock_in_1: Some(t(9, 0)),
                clock_out_1: Some(t(18, 30)),
                ..upsert(emp.id, d(2025, 2, 3))
            },
        )
        .await
        .unwrap();

    // Corrupt the stored totals to simulate a rule change.
    use sea_orm::{ActiveModelTrait, Set};
    let mut active: clock_record::ActiveModel = record.into();
    active.total_work_minutes = Set(1);
    active.ot_minutes = Set(999);
    active.update(&*db).await.unwrap();

    let first = svc.recalculate(&ctx, 2025, 2).await.unwrap();
    assert_eq!(first.scanned, 1);
    assert_eq!(first.updated, 1);

    let second = svc.recalculate(&ctx, 2025, 2).await.unwrap();
    assert_eq!(second.scanned, 1);
    assert_eq!(second.updated, 0);
}

#[tokio::test]
async fn daily_uniqueness_is_enforced_by_the_schema() {
    let db = test_db().await;
    let co = seed_company(&db, "MIMIX", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "E8").insert(&db).await;
    let date = d(2025, 1, 10);

    ScheduleSeed::new(co.id, emp.id, date).insert(&db).await;
    // A second roster row for the same (employee, date) must not insert.
    let dup = ScheduleSeed::new(co.id, emp.id, date);
    let result = kerani_api::entities::schedule::ActiveModel {
        company_id: sea_orm::Set(dup.company_id),
        employee_id: sea_orm::Set(dup.employee_id),
        schedule_date: sea_orm::Set(dup.date),
        status: sea_orm::Set(dup.status),
        created_at: sea_orm::Set(chrono::Utc::now()),
        ..Default::default()
    };
    use sea_orm::ActiveModelTrait;
    assert!(result.insert(&*db).await.is_err());
}
