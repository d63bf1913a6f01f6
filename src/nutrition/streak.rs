use std::collections::BTreeMap;

use time::Date;

use super::DailyTotals;

/// How far back the adherence streak is allowed to reach.
pub const STREAK_WINDOW_DAYS: u32 = 30;

/// Window for the rolling calorie average, inclusive of the reference date.
pub const AVERAGE_WINDOW_DAYS: u32 = 7;

/// Count consecutive goal-adherent days ending yesterday.
///
/// `totals_by_date` must contain a key for every day that had at least one
/// log entry (see [`super::totals_by_date`]). The walk starts at `as_of - 1`
/// because the in-progress day is not complete yet, and examines at most
/// `window_days` days. A day at exactly the goal is adherent; a day over the
/// goal ends the streak, and so does a day with no entries at all — not
/// logging is not the same as eating nothing.
pub fn compute_streak(
    totals_by_date: &BTreeMap<Date, DailyTotals>,
    calorie_goal: f64,
    as_of: Date,
    window_days: u32,
) -> u32 {
    let Some(mut day) = as_of.previous_day() else {
        return 0;
    };
    let mut streak = 0;
    for _ in 0..window_days {
        match totals_by_date.get(&day) {
            Some(totals) if totals.calories <= calorie_goal => streak += 1,
            _ => break,
        }
        match day.previous_day() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Mean calorie total over the `window_days` days ending at `reference`.
///
/// Days without any entries are excluded from both the sum and the count, so
/// a sparse week averages only what was actually logged. Returns `None` when
/// no day in the window has data — "no record" must stay distinguishable
/// from "averaged to zero".
pub fn rolling_average(
    totals_by_date: &BTreeMap<Date, DailyTotals>,
    reference: Date,
    window_days: u32,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0u32;
    let mut day = reference;
    for _ in 0..window_days {
        if let Some(totals) = totals_by_date.get(&day) {
            sum += totals.calories;
            count += 1;
        }
        match day.previous_day() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    (count > 0).then(|| sum / f64::from(count))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn calories(value: f64) -> DailyTotals {
        DailyTotals {
            calories: value,
            ..DailyTotals::default()
        }
    }

    /// Build a totals map from (days-before-as_of, calories) pairs.
    fn history(as_of: Date, days: &[(i64, f64)]) -> BTreeMap<Date, DailyTotals> {
        days.iter()
            .map(|&(back, kcal)| (as_of - time::Duration::days(back), calories(kcal)))
            .collect()
    }

    const AS_OF: Date = date!(2026 - 08 - 26);

    #[test]
    fn counts_consecutive_adherent_days_until_first_over_goal() {
        // Most recent first: 1800, 2100, 2300, 1900, 2000 against a 2200 goal.
        let totals = history(
            AS_OF,
            &[(1, 1800.0), (2, 2100.0), (3, 2300.0), (4, 1900.0), (5, 2000.0)],
        );
        assert_eq!(compute_streak(&totals, 2200.0, AS_OF, STREAK_WINDOW_DAYS), 2);
    }

    #[test]
    fn missing_day_breaks_the_streak_without_skipping() {
        // Yesterday logged, two days ago nothing, three days ago logged.
        let totals = history(AS_OF, &[(1, 2000.0), (3, 1900.0)]);
        assert_eq!(compute_streak(&totals, 2200.0, AS_OF, STREAK_WINDOW_DAYS), 1);
    }

    #[test]
    fn day_exactly_at_goal_is_adherent() {
        let totals = history(AS_OF, &[(1, 2200.0), (2, 2200.0)]);
        assert_eq!(compute_streak(&totals, 2200.0, AS_OF, STREAK_WINDOW_DAYS), 2);
    }

    #[test]
    fn todays_entries_do_not_count_toward_the_streak() {
        // Only the in-progress day has data.
        let totals = history(AS_OF, &[(0, 1000.0)]);
        assert_eq!(compute_streak(&totals, 2200.0, AS_OF, STREAK_WINDOW_DAYS), 0);
    }

    #[test]
    fn streak_is_zero_when_yesterday_is_over_goal_or_unlogged() {
        let over = history(AS_OF, &[(1, 2500.0)]);
        assert_eq!(compute_streak(&over, 2200.0, AS_OF, STREAK_WINDOW_DAYS), 0);
        assert_eq!(
            compute_streak(&BTreeMap::new(), 2200.0, AS_OF, STREAK_WINDOW_DAYS),
            0
        );
    }

    #[test]
    fn streak_stops_at_the_window_boundary() {
        let days: Vec<(i64, f64)> = (1..=40).map(|back| (back, 1500.0)).collect();
        let totals = history(AS_OF, &days);
        assert_eq!(
            compute_streak(&totals, 2200.0, AS_OF, STREAK_WINDOW_DAYS),
            STREAK_WINDOW_DAYS
        );
    }

    #[test]
    fn rolling_average_skips_unlogged_days() {
        // 2000, 2200, <nothing>, 1800 over the last four days.
        let totals = history(AS_OF, &[(0, 2000.0), (1, 2200.0), (3, 1800.0)]);
        assert_eq!(
            rolling_average(&totals, AS_OF, AVERAGE_WINDOW_DAYS),
            Some(2000.0)
        );
    }

    #[test]
    fn rolling_average_includes_the_reference_date() {
        let totals = history(AS_OF, &[(0, 1500.0)]);
        assert_eq!(
            rolling_average(&totals, AS_OF, AVERAGE_WINDOW_DAYS),
            Some(1500.0)
        );
    }

    #[test]
    fn rolling_average_ignores_data_outside_the_window() {
        let totals = history(AS_OF, &[(0, 1500.0), (7, 9000.0)]);
        assert_eq!(
            rolling_average(&totals, AS_OF, AVERAGE_WINDOW_DAYS),
            Some(1500.0)
        );
    }

    #[test]
    fn rolling_average_is_none_with_no_data() {
        assert_eq!(
            rolling_average(&BTreeMap::new(), AS_OF, AVERAGE_WINDOW_DAYS),
            None
        );
    }
}
