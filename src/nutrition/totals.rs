use std::collections::BTreeMap;

use time::Date;
use uuid::Uuid;

use super::{validate_quantity, DailyTotals, FoodFact, InvalidEntry, LogEntry};

/// Sum macro contributions of `entries` for a single `date`.
///
/// Callers are expected to pass entries already filtered to `date` (that is
/// the ledger query's job); an entry dated anything else is rejected rather
/// than silently mixed in. An entry whose food no longer resolves contributes
/// zero and is skipped without error, since deleting a food must not erase
/// history. No rounding happens here.
pub fn compute_daily_totals<'a, F>(
    date: Date,
    entries: &[LogEntry],
    mut food_lookup: F,
) -> Result<DailyTotals, InvalidEntry>
where
    F: FnMut(Uuid) -> Option<&'a FoodFact>,
{
    let mut totals = DailyTotals::default();
    for entry in entries {
        if entry.log_date != date {
            return Err(InvalidEntry::DateMismatch {
                id: entry.id,
                expected: date,
                found: entry.log_date,
            });
        }
        validate_quantity(entry)?;
        if let Some(fact) = entry.food_id.and_then(&mut food_lookup) {
            totals.add(entry.quantity, fact);
        }
    }
    Ok(totals)
}

/// Calories left against the goal. Negative means over goal, which is
/// meaningful and allowed.
pub fn remaining_calories(totals: &DailyTotals, calorie_goal: f64) -> f64 {
    calorie_goal - totals.calories
}

/// Bucket a multi-day slice of the log into per-date totals.
///
/// Only dates with at least one entry appear as keys, which is what lets the
/// streak and rolling-average code tell "nothing logged" apart from "logged
/// zero calories".
pub fn totals_by_date<'a, F>(
    entries: &[LogEntry],
    mut food_lookup: F,
) -> Result<BTreeMap<Date, DailyTotals>, InvalidEntry>
where
    F: FnMut(Uuid) -> Option<&'a FoodFact>,
{
    let mut by_date: BTreeMap<Date, DailyTotals> = BTreeMap::new();
    for entry in entries {
        validate_quantity(entry)?;
        let totals = by_date.entry(entry.log_date).or_default();
        if let Some(fact) = entry.food_id.and_then(&mut food_lookup) {
            totals.add(entry.quantity, fact);
        }
    }
    Ok(by_date)
}
