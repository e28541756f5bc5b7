//! Property checks over the pure rule implementations.

use chrono::NaiveTime;
use kerani_api::services::commission::{split_pool, ShiftCount};
use kerani_api::services::settlement::{prorate_working_days, weekdays_between, weekdays_in_month};
use kerani_api::services::work_rules::{self, DayContext, Regime};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60)
        .prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).expect("valid time"))
}

proptest! {
    /// Mimix OT is always a multiple of 30 minutes and never under an hour.
    #[test]
    fn mimix_ot_is_floored_to_half_hours(
        in_1 in time_strategy(),
        duration in 0i64..1200,
    ) {
        let out = in_1 + chrono::Duration::minutes(duration);
        let totals = work_rules::compute(
            Regime::Mimix,
            Some(in_1),
            Some(out),
            None,
            None,
            DayContext::default(),
        );
        prop_assert!(totals.ot_minutes == 0 || totals.ot_minutes >= 60);
        prop_assert_eq!(totals.ot_minutes % 30, 0);
        prop_assert!(totals.ot_minutes <= (totals.work_minutes - 510).max(0));
    }

    /// Work minutes never go negative and never exceed a day in either regime.
    #[test]
    fn totals_stay_within_a_day(
        in_1 in time_strategy(),
        out_1 in time_strategy(),
        in_2 in time_strategy(),
        out_2 in time_strategy(),
    ) {
        for regime in [Regime::Mimix, Regime::AaAlive] {
            let totals = work_rules::compute(
                regime,
                Some(in_1),
                Some(out_1),
                Some(in_2),
                Some(out_2),
                DayContext::default(),
            );
            prop_assert!(totals.work_minutes >= 0);
            prop_assert!(totals.work_minutes <= 2 * 1440);
            prop_assert!(totals.ot_minutes >= 0);
        }
    }

    /// The pool split conserves money within one cent per payout, and each
    /// line matches per_shift_value x effective within half a cent.
    #[test]
    fn pool_split_conserves_money(
        pool_cents in 0i64..100_000_000,
        shifts in prop::collection::vec((0i32..40, 0i32..8), 0..25),
    ) {
        let pool = Decimal::new(pool_cents, 2);
        let counts: Vec<ShiftCount> = shifts
            .iter()
            .enumerate()
            .map(|(i, (normal, ph))| ShiftCount {
                employee_id: i as i64 + 1,
                normal_shifts: *normal,
                ph_shifts: *ph,
            })
            .collect();

        let split = split_pool(pool, &counts);

        let expected_total: i32 = counts.iter().map(ShiftCount::effective).sum();
        prop_assert_eq!(split.total_effective_shifts, expected_total);

        if expected_total > 0 {
            let paid: Decimal = split.lines.iter().map(|l| l.commission_amount).sum();
            let slack = Decimal::new(split.lines.len() as i64, 2);
            prop_assert!((pool - paid).abs() <= slack,
                "pool {} paid {} slack {}", pool, paid, slack);
        } else {
            prop_assert!(split.lines.is_empty());
        }

        let half_cent = Decimal::new(5, 3);
        for line in &split.lines {
            prop_assert!(line.effective_shifts > 0);
            prop_assert_eq!(
                line.effective_shifts,
                line.normal_shifts + 2 * line.ph_shifts
            );
            let exact = split.per_shift_value * Decimal::from(line.effective_shifts);
            prop_assert!((line.commission_amount - exact).abs() <= half_cent);
        }
    }

    /// Working-days proration is monotone in days worked and caps at the
    /// full salary.
    #[test]
    fn proration_is_monotone_and_bounded(
        basic_cents in 1i64..2_000_000,
        year in 2020i32..2030,
        month in 1u32..13,
    ) {
        let basic = Decimal::new(basic_cents, 2);
        let wd = weekdays_in_month(year, month).expect("valid month");
        let mut last = Decimal::ZERO;
        for worked in 0..=wd {
            let prorated = prorate_working_days(basic, worked, wd);
            prop_assert!(prorated >= last);
            prop_assert!(prorated <= basic);
            last = prorated;
        }
        prop_assert_eq!(prorate_working_days(basic, wd, wd), basic.round_dp(2));
    }

    /// Weekday counting never exceeds the span and ignores weekend-only
    /// ranges.
    #[test]
    fn weekday_count_bounds(offset in 0i64..3650, span in 0i64..60) {
        let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date")
            + chrono::Duration::days(offset);
        let end = start + chrono::Duration::days(span);
        let count = weekdays_between(start, end);
        prop_assert!(count <= span + 1);
        prop_assert!(count >= (span + 1) * 5 / 7 - 2);
    }
}
