use std::collections::BTreeMap;

use time::Date;

use super::{LogEntry, MealSlot};

/// Entries for one meal slot on one day, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct MealGroup {
    pub slot: MealSlot,
    pub entries: Vec<LogEntry>,
}

/// One day of the food log, meals grouped in first-occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: Date,
    pub meals: Vec<MealGroup>,
}

impl DayGroup {
    pub fn entry_count(&self) -> usize {
        self.meals.iter().map(|m| m.entries.len()).sum()
    }
}

/// Group a flat log into days (most recent first), then meal slots.
///
/// Meal slots within a day keep the order in which they first appear in the
/// input; callers wanting canonical Breakfast→Snacks order sort afterwards.
/// Every input entry lands in exactly one group, so the total count across
/// the output always equals the input length.
pub fn group_by_date_then_meal(entries: Vec<LogEntry>) -> Vec<DayGroup> {
    let mut days: BTreeMap<Date, Vec<MealGroup>> = BTreeMap::new();
    for entry in entries {
        let meals = days.entry(entry.log_date).or_default();
        match meals.iter_mut().find(|group| group.slot == entry.meal_slot) {
            Some(group) => group.entries.push(entry),
            None => meals.push(MealGroup {
                slot: entry.meal_slot,
                entries: vec![entry],
            }),
        }
    }
    days.into_iter()
        .rev()
        .map(|(date, meals)| DayGroup { date, meals })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;
    use uuid::Uuid;

    use super::*;

    fn entry(log_date: Date, meal_slot: MealSlot) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            food_id: None,
            meal_slot,
            log_date,
            quantity: 1.0,
        }
    }

    #[test]
    fn groups_dates_most_recent_first() {
        let entries = vec![
            entry(date!(2026 - 08 - 18), MealSlot::Lunch),
            entry(date!(2026 - 08 - 20), MealSlot::Breakfast),
            entry(date!(2026 - 08 - 19), MealSlot::Dinner),
        ];
        let groups = group_by_date_then_meal(entries);
        let dates: Vec<Date> = groups.iter().map(|g| g.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2026 - 08 - 20),
                date!(2026 - 08 - 19),
                date!(2026 - 08 - 18)
            ]
        );
    }

    #[test]
    fn meal_slots_keep_first_occurrence_order() {
        let day = date!(2026 - 08 - 20);
        let entries = vec![
            entry(day, MealSlot::Snacks),
            entry(day, MealSlot::Breakfast),
            entry(day, MealSlot::Snacks),
            entry(day, MealSlot::Lunch),
        ];
        let groups = group_by_date_then_meal(entries);
        assert_eq!(groups.len(), 1);
        let slots: Vec<MealSlot> = groups[0].meals.iter().map(|m| m.slot).collect();
        assert_eq!(
            slots,
            vec![MealSlot::Snacks, MealSlot::Breakfast, MealSlot::Lunch]
        );
        assert_eq!(groups[0].meals[0].entries.len(), 2);
    }

    #[test]
    fn no_entry_is_dropped_or_duplicated() {
        let entries = vec![
            entry(date!(2026 - 08 - 20), MealSlot::Breakfast),
            entry(date!(2026 - 08 - 19), MealSlot::Lunch),
            entry(date!(2026 - 08 - 20), MealSlot::Lunch),
            entry(date!(2026 - 08 - 18), MealSlot::Snacks),
            entry(date!(2026 - 08 - 19), MealSlot::Lunch),
        ];
        let input_len = entries.len();
        let input_ids: std::collections::HashSet<Uuid> =
            entries.iter().map(|e| e.id).collect();

        let groups = group_by_date_then_meal(entries);
        let total: usize = groups.iter().map(DayGroup::entry_count).sum();
        assert_eq!(total, input_len);

        let output_ids: std::collections::HashSet<Uuid> = groups
            .iter()
            .flat_map(|g| g.meals.iter())
            .flat_map(|m| m.entries.iter())
            .map(|e| e.id)
            .collect();
        assert_eq!(output_ids, input_ids);
    }

    #[test]
    fn date_grouping_is_stable_under_reordering_of_unrelated_dates() {
        let a = entry(date!(2026 - 08 - 20), MealSlot::Breakfast);
        let b = entry(date!(2026 - 08 - 20), MealSlot::Breakfast);
        let unrelated = entry(date!(2026 - 08 - 15), MealSlot::Dinner);

        let first = group_by_date_then_meal(vec![a.clone(), unrelated.clone(), b.clone()]);
        let second = group_by_date_then_meal(vec![unrelated, a.clone(), b.clone()]);

        let day = |groups: &[DayGroup]| {
            groups
                .iter()
                .find(|g| g.date == date!(2026 - 08 - 20))
                .cloned()
                .unwrap()
        };
        assert_eq!(day(&first), day(&second));
        assert_eq!(day(&first).meals[0].entries, vec![a, b]);
    }

    #[test]
    fn empty_input_produces_no_groups() {
        assert!(group_by_date_then_meal(Vec::new()).is_empty());
    }
}
