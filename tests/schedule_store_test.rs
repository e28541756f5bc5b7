//! Schedule store: creation guards, template assignment, roster
//! projection and the month copy.

mod common;

use chrono::Datelike;
use common::*;
use kerani_api::entities::{clock_record, company, employee, schedule};
use kerani_api::errors::ServiceError;
use kerani_api::services::schedules::{BulkCreateRequest, CreateScheduleRequest, ScheduleService};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

fn create_request(employee_id: i64, date: chrono::NaiveDate) -> CreateScheduleRequest {
    CreateScheduleRequest {
        employee_id,
        schedule_date: date,
        shift_template_id: None,
        start_time: Some(t(9, 0)),
        end_time: Some(t(18, 0)),
        outlet_id: None,
        department_id: None,
        is_public_holiday: None,
    }
}

/// A date safely in the future for window-free assertions.
fn future(days: i64) -> chrono::NaiveDate {
    chrono::Utc::now().date_naive() + chrono::Duration::days(days)
}

#[tokio::test]
async fn duplicate_day_is_rejected_by_the_service() {
    let db = test_db().await;
    let co = seed_company(&db, "SCHED", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "S1").insert(&db).await;

    let svc = ScheduleService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let date = future(30);

    svc.create(&ctx, create_request(emp.id, date)).await.unwrap();
    let err = svc.create(&ctx, create_request(emp.id, date)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn resigned_employees_and_dates_past_lwd_are_rejected() {
    let db = test_db().await;
    let co = seed_company(&db, "SCHED2", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "S2").insert(&db).await;

    // Put the employee on notice with a last working day.
    let lwd = future(10);
    let mut active: employee::ActiveModel = emp.clone().into();
    active.last_working_day = Set(Some(lwd));
    active.update(&*db).await.unwrap();

    let svc = ScheduleService::new(db.clone());
    let ctx = admin_ctx(co.id);

    // On or before the last working day is fine.
    svc.create(&ctx, create_request(emp.id, lwd)).await.unwrap();
    // Beyond it is not.
    let err = svc
        .create(&ctx, create_request(emp.id, lwd + chrono::Duration::days(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // Fully resigned employees cannot be rostered at all.
    let mut active: employee::ActiveModel = emp.into();
    active.status = Set(employee::status::RESIGNED.to_string());
    active.update(&*db).await.unwrap();
    let err = svc
        .create(&ctx, create_request(1, future(5)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidOperation(_) | ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn bulk_create_expands_weekdays_and_skips_existing() {
    let db = test_db().await;
    let co = seed_company(&db, "SCHED3", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "S3").insert(&db).await;

    let svc = ScheduleService::new(db.clone());
    let ctx = admin_ctx(co.id);

    // Find the next Sunday so the weekday expansion is deterministic.
    let mut start = future(20);
    while start.weekday() != chrono::Weekday::Sun {
        start = start.succ_opt().unwrap();
    }
    let end = start + chrono::Duration::days(13);

    // Pre-existing row on the first Monday.
    svc.create(&ctx, create_request(emp.id, start + chrono::Duration::days(1)))
        .await
        .unwrap();

    let summary = svc
        .bulk_create(
            &ctx,
            BulkCreateRequest {
                employee_id: emp.id,
                start_date: start,
                end_date: end,
                days_of_week: vec![1, 3], // Mondays and Wednesdays
                shift_template_id: None,
                outlet_id: None,
                department_id: None,
            },
        )
        .await
        .unwrap();

    // Four matching days in the fortnight, one already present.
    assert_eq!(summary.created, 3);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn template_assignment_flips_has_schedule_on_the_clock_record() {
    let db = test_db().await;
    let co = seed_company(&db, "SCHED4", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "S4").insert(&db).await;
    let tpl = seed_shift_template(&db, co.id, "AM", t(9, 0), t(18, 0), false).await;
    let date = future(7);

    // A clock record exists for the date with no roster.
    clock_record::ActiveModel {
        company_id: Set(co.id),
        employee_id: Set(emp.id),
        work_date: Set(date),
        clock_in_1: Set(Some(t(9, 2))),
        status: Set(clock_record::status::PENDING.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();

    let svc = ScheduleService::new(db.clone());
    let ctx = admin_ctx(co.id);
    let sched = svc.assign(&ctx, emp.id, date, tpl.id, None).await.unwrap();

    assert_eq!(sched.start_time, Some(t(9, 0)));
    assert_eq!(sched.status, schedule::status::SCHEDULED);

    let record = clock_record::Entity::find()
        .filter(clock_record::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(record.has_schedule);

    // Re-assigning the same day upserts rather than duplicating.
    let again = svc.assign(&ctx, emp.id, date, tpl.id, Some(true)).await.unwrap();
    assert_eq!(again.id, sched.id);
    assert!(again.is_public_holiday);
}

#[tokio::test]
async fn off_template_assignment_does_not_mark_attendance_scheduled() {
    let db = test_db().await;
    let co = seed_company(&db, "SCHED5", company::work_rule::MIMIX).await;
    let emp = EmployeeSeed::new(co.id, "S5").insert(&db).await;
    let off = seed_shift_template(&db, co.id, "OFF", t(0, 0), t(0, 0), true).await;
    let date = future(7);

    clock_record::ActiveModel {
        company_id: Set(co.id),
        employee_id: Set(emp.id),
        work_date: Set(date),
        clock_in_1: Set(Some(t(9, 0))),
        status: Set(clock_record::status::PENDING.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();

    let svc = ScheduleService::new(db.clone());
    let sched = svc
        .assign(&admin_ctx(co.id), emp.id, date, off.id, None)
        .await
        .unwrap();
    assert_eq!(sched.status, schedule::status::OFF);

    let record = clock_record::Entity::find()
        .filter(clock_record::Column::EmployeeId.eq(emp.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.has_schedule);
}

#[tokio::test]
async fn weekly_roster_projects_seven_days_and_skips_managers() {
    let db = test_db().await;
    let co = seed_company(&db, "ROSTER", company::work_rule::MIMIX).await;
    let outlet = seed_outlet(&db, co.id, "R1").await;
    let crew_pos = seed_position(&db, co.id, "Barista", "crew").await;
    let mgr_pos = seed_position(&db, co.id, "Store Manager", "manager").await;

    let crew = EmployeeSeed::new(co.id, "R-CREW").outlet(outlet.id).insert(&db).await;
    let manager = EmployeeSeed::new(co.id, "R-MGR").outlet(outlet.id).insert(&db).await;
    for (emp, pos) in [(&crew, crew_pos.id), (&manager, mgr_pos.id)] {
        let mut active: employee::ActiveModel = emp.clone().into();
        active.position_id = Set(Some(pos));
        active.update(&*db).await.unwrap();
    }

    let start = d(2025, 6, 2);
    let tpl = seed_shift_template(&db, co.id, "AM", t(9, 0), t(18, 0), false).await;
    ScheduleSeed::new(co.id, crew.id, start)
        .outlet(outlet.id)
        .template(tpl.id)
        .window(t(9, 0), t(18, 0))
        .insert(&db)
        .await;

    let svc = ScheduleService::new(db.clone());
    let roster = svc
        .weekly_roster(&admin_ctx(co.id), Some(outlet.id), None, start)
        .await
        .unwrap();

    assert_eq!(roster.dates.len(), 7);
    assert_eq!(roster.rows.len(), 1, "manager must not appear on the grid");
    assert_eq!(roster.rows[0].employee_id, crew.id);
    let cell = roster.rows[0].cells[0].as_ref().expect("first day scheduled");
    assert_eq!(cell.template_code.as_deref(), Some("AM"));
    assert!(roster.rows[0].cells[1].is_none());
}

#[tokio::test]
async fn copy_month_shifts_by_offset_and_truncates_overflow() {
    let db = test_db().await;
    let co = seed_company(&db, "COPY", company::work_rule::MIMIX).await;
    let dept = seed_department(&db, co.id, "KITCHEN").await;
    let emp = EmployeeSeed::new(co.id, "S6").department(dept.id).insert(&db).await;
    let tpl = seed_shift_template(&db, co.id, "AM", t(9, 0), t(18, 0), false).await;

    // Source month March 2025; the 31st has no April counterpart.
    for date in [d(2025, 3, 3), d(2025, 3, 10), d(2025, 3, 31)] {
        ScheduleSeed::new(co.id, emp.id, date)
            .department(dept.id)
            .template(tpl.id)
            .insert(&db)
            .await;
    }
    // A stale row in the target month that the copy must clear.
    ScheduleSeed::new(co.id, emp.id, d(2025, 4, 1))
        .department(dept.id)
        .template(tpl.id)
        .insert(&db)
        .await;

    let svc = ScheduleService::new(db.clone());
    let summary = svc
        .copy_month(&admin_ctx(co.id), dept.id, 2025, 3, 2025, 4)
        .await
        .unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.skipped_out_of_month, 1);

    let april: Vec<chrono::NaiveDate> = schedule::Entity::find()
        .filter(schedule::Column::EmployeeId.eq(emp.id))
        .filter(schedule::Column::ScheduleDate.gte(d(2025, 4, 1)))
        .filter(schedule::Column::ScheduleDate.lte(d(2025, 4, 30)))
        .all(&*db)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.schedule_date)
        .collect();
    // Offset between 1 March and 1 April is 31 days.
    assert_eq!(april, vec![d(2025, 4, 3), d(2025, 4, 10)]);

    // Re-running lands in the same state.
    let rerun = svc
        .copy_month(&admin_ctx(co.id), dept.id, 2025, 3, 2025, 4)
        .await
        .unwrap();
    assert_eq!(rerun.copied, 2);
    assert_eq!(rerun.deleted, 2);
}
