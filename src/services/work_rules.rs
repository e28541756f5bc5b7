//! Derived-totals computation for daily clock records.
//!
//! Two regimes exist, selected per company. Both support overnight shifts:
//! whenever an end time is earlier than its start time the interval rolls
//! forward by exactly 1440 minutes.
//!
//! * **Mimix** - standard day 510 minutes. Gross time runs from the first
//!   clock-in (clamped to the rostered shift start when the employee is
//!   early) to the last clock-out. Breaks up to 60 minutes are free; only
//!   the excess is deducted. Overtime under an hour is discarded, the rest
//!   floored to 30-minute steps.
//! * **AA Alive** - standard day 540 minutes. The two sessions are summed
//!   directly; the break is reported but never deducted. Overtime is
//!   minute-exact.

use chrono::NaiveTime;
use rust_decimal::Decimal;

pub const MIMIX_STANDARD_MINUTES: i32 = 510;
pub const AA_ALIVE_STANDARD_MINUTES: i32 = 540;

/// Free break allowance under the Mimix regime, in minutes.
const MIMIX_BREAK_ALLOWANCE: i32 = 60;
/// Minimum raw overtime before any is credited under Mimix.
const MIMIX_OT_THRESHOLD: i32 = 60;
/// Mimix overtime is floored to steps of this size.
const MIMIX_OT_STEP: i32 = 30;

const MINUTES_PER_DAY: i32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Mimix,
    AaAlive,
}

impl Regime {
    pub fn from_work_rule(rule: &str) -> Regime {
        if rule == crate::entities::company::work_rule::AA_ALIVE {
            Regime::AaAlive
        } else {
            Regime::Mimix
        }
    }

    pub fn standard_minutes(self) -> i32 {
        match self {
            Regime::Mimix => MIMIX_STANDARD_MINUTES,
            Regime::AaAlive => AA_ALIVE_STANDARD_MINUTES,
        }
    }
}

/// Roster context for the day, looked up from `schedules` at compute time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayContext {
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedTotals {
    pub work_minutes: i32,
    pub break_minutes: i32,
    pub ot_minutes: i32,
}

impl DerivedTotals {
    pub fn work_hours(&self) -> Decimal {
        minutes_to_hours(self.work_minutes)
    }

    pub fn break_hours(&self) -> Decimal {
        minutes_to_hours(self.break_minutes)
    }

    pub fn ot_hours(&self) -> Decimal {
        minutes_to_hours(self.ot_minutes)
    }
}

pub fn minutes_to_hours(minutes: i32) -> Decimal {
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

fn minutes_of(t: NaiveTime) -> i32 {
    use chrono::Timelike;
    (t.hour() * 60 + t.minute()) as i32
}

/// Minutes from `start` to `end`, rolling past midnight when end < start.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i32 {
    let diff = minutes_of(end) - minutes_of(start);
    if diff < 0 {
        diff + MINUTES_PER_DAY
    } else {
        diff
    }
}

/// Computes derived totals for one record under the given regime.
///
/// Events must be a prefix of (in_1, out_1, in_2, out_2); callers enforce
/// that before writing. A record with no closing event yields zeros.
pub fn compute(
    regime: Regime,
    clock_in_1: Option<NaiveTime>,
    clock_out_1: Option<NaiveTime>,
    clock_in_2: Option<NaiveTime>,
    clock_out_2: Option<NaiveTime>,
    ctx: DayContext,
) -> DerivedTotals {
    let Some(in_1) = clock_in_1 else {
        return DerivedTotals::default();
    };

    let break_minutes = match (clock_out_1, clock_in_2) {
        (Some(out_1), Some(in_2)) => minutes_between(out_1, in_2),
        _ => 0,
    };

    match regime {
        Regime::Mimix => {
            let Some(last_out) = clock_out_2.or(clock_out_1) else {
                return DerivedTotals::default();
            };

            // Early birds do not accrue time before the rostered start.
            let effective_in = match ctx.shift_start {
                Some(shift_start) if minutes_of(in_1) < minutes_of(shift_start) => shift_start,
                _ => in_1,
            };

            let gross = minutes_between(effective_in, last_out);
            let excess_break = (break_minutes - MIMIX_BREAK_ALLOWANCE).max(0);
            let work_minutes = (gross - excess_break).max(0);

            let raw_ot = (work_minutes - MIMIX_STANDARD_MINUTES).max(0);
            let ot_minutes = if raw_ot < MIMIX_OT_THRESHOLD {
                0
            } else {
                (raw_ot / MIMIX_OT_STEP) * MIMIX_OT_STEP
            };

            DerivedTotals {
                work_minutes,
                break_minutes,
                ot_minutes,
            }
        }
        Regime::AaAlive => {
            let mut work_minutes = 0;
            if let Some(out_1) = clock_out_1 {
                work_minutes += minutes_between(in_1, out_1);
            }
            if let (Some(in_2), Some(out_2)) = (clock_in_2, clock_out_2) {
                work_minutes += minutes_between(in_2, out_2);
            }
            if work_minutes == 0 {
                return DerivedTotals::default();
            }

            let ot_minutes = (work_minutes - AA_ALIVE_STANDARD_MINUTES).max(0);

            DerivedTotals {
                work_minutes,
                break_minutes,
                ot_minutes,
            }
        }
    }
}
