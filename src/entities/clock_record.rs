use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

/// The four clock events, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClockAction {
    ClockIn1,
    ClockOut1,
    ClockIn2,
    ClockOut2,
}

impl ClockAction {
    pub const ALL: [ClockAction; 4] = [
        ClockAction::ClockIn1,
        ClockAction::ClockOut1,
        ClockAction::ClockIn2,
        ClockAction::ClockOut2,
    ];

    pub fn next(self) -> Option<ClockAction> {
        match self {
            ClockAction::ClockIn1 => Some(ClockAction::ClockOut1),
            ClockAction::ClockOut1 => Some(ClockAction::ClockIn2),
            ClockAction::ClockIn2 => Some(ClockAction::ClockOut2),
            ClockAction::ClockOut2 => None,
        }
    }
}

/// One row per (employee, work_date); the unique index enforces it.
/// Events are a prefix of (in_1, out_1, in_2, out_2) at all times.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clock_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub employee_id: i64,
    pub outlet_id: Option<i64>,
    pub work_date: Date,

    pub clock_in_1: Option<Time>,
    pub clock_out_1: Option<Time>,
    pub clock_in_2: Option<Time>,
    pub clock_out_2: Option<Time>,

    /// "lat,lng" captured per event
    pub location_in_1: Option<String>,
    pub location_out_1: Option<String>,
    pub location_in_2: Option<String>,
    pub location_out_2: Option<String>,

    /// Storage references for per-event selfies
    pub photo_in_1: Option<String>,
    pub photo_out_1: Option<String>,
    pub photo_in_2: Option<String>,
    pub photo_out_2: Option<String>,

    pub total_work_minutes: i32,
    pub total_break_minutes: i32,
    pub ot_minutes: i32,

    pub status: String,
    pub is_auto_clock_out: bool,
    pub needs_admin_review: bool,
    pub has_schedule: bool,

    /// Tri-state: None until an admin decides
    pub ot_approved: Option<bool>,
    pub ot_decided_by: Option<i64>,
    pub ot_decided_at: Option<DateTimeUtc>,
    pub ot_reject_reason: Option<String>,

    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTimeUtc>,
    pub reject_reason: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub notes: Option<String>,

    pub media_deleted_at: Option<DateTimeUtc>,
    /// Set at creation to work_date + 6 months
    pub media_retention_eligible_at: Option<Date>,
    pub media_deletion_logged: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn event(&self, action: ClockAction) -> Option<Time> {
        match action {
            ClockAction::ClockIn1 => self.clock_in_1,
            ClockAction::ClockOut1 => self.clock_out_1,
            ClockAction::ClockIn2 => self.clock_in_2,
            ClockAction::ClockOut2 => self.clock_out_2,
        }
    }

    /// First action whose slot is still empty, respecting event order.
    pub fn next_action(&self) -> Option<ClockAction> {
        ClockAction::ALL.into_iter().find(|a| self.event(*a).is_none())
    }

    /// The non-null events must be a prefix of the four slots.
    pub fn events_are_prefix(&self) -> bool {
        let mut seen_gap = false;
        for action in ClockAction::ALL {
            match self.event(action) {
                Some(_) if seen_gap => return false,
                Some(_) => {}
                None => seen_gap = true,
            }
        }
        true
    }

    pub fn has_unretained_media(&self) -> bool {
        self.media_deleted_at.is_none()
            && (self.photo_in_1.is_some()
                || self.photo_out_1.is_some()
                || self.photo_in_2.is_some()
                || self.photo_out_2.is_some())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record() -> Model {
        Model {
            id: 1,
            company_id: 1,
            employee_id: 1,
            outlet_id: None,
            work_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            clock_in_1: None,
            clock_out_1: None,
            clock_in_2: None,
            clock_out_2: None,
            location_in_1: None,
            location_out_1: None,
            location_in_2: None,
            location_out_2: None,
            photo_in_1: None,
            photo_out_1: None,
            photo_in_2: None,
            photo_out_2: None,
            total_work_minutes: 0,
            total_break_minutes: 0,
            ot_minutes: 0,
            status: status::PENDING.into(),
            is_auto_clock_out: false,
            needs_admin_review: false,
            has_schedule: false,
            ot_approved: None,
            ot_decided_by: None,
            ot_decided_at: None,
            ot_reject_reason: None,
            approved_by: None,
            approved_at: None,
            reject_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
            media_deleted_at: None,
            media_retention_eligible_at: None,
            media_deletion_logged: false,
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn next_action_walks_the_event_order() {
        let mut rec = record();
        assert_eq!(rec.next_action(), Some(ClockAction::ClockIn1));
        rec.clock_in_1 = Some(t(9, 0));
        assert_eq!(rec.next_action(), Some(ClockAction::ClockOut1));
        rec.clock_out_1 = Some(t(12, 0));
        rec.clock_in_2 = Some(t(13, 0));
        assert_eq!(rec.next_action(), Some(ClockAction::ClockOut2));
        rec.clock_out_2 = Some(t(18, 0));
        assert_eq!(rec.next_action(), None);
    }

    #[test]
    fn prefix_invariant_detects_gaps() {
        let mut rec = record();
        rec.clock_in_1 = Some(t(9, 0));
        rec.clock_in_2 = Some(t(13, 0));
        assert!(!rec.events_are_prefix());
        rec.clock_out_1 = Some(t(12, 0));
        assert!(rec.events_are_prefix());
    }
}
