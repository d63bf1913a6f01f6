//! Pure nutrition computations: daily macro totals, the goal-adherence
//! streak, and date/meal grouping of the food log.
//!
//! Everything here is a deterministic function of its arguments. Callers
//! (the stats and logs handlers) fetch entries, foods and goals up front and
//! pass them in; nothing in this module touches the database or the clock.

mod grouping;
mod streak;
mod totals;

pub use grouping::{group_by_date_then_meal, DayGroup, MealGroup};
pub use streak::{compute_streak, rolling_average, AVERAGE_WINDOW_DAYS, STREAK_WINDOW_DAYS};
pub use totals::{compute_daily_totals, remaining_calories, totals_by_date};

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Nutrition facts for one serving of a food. Immutable as far as the
/// aggregation code is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodFact {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
}

/// One logged instance of eating `quantity` servings of a food.
///
/// `food_id` is `None` when the referenced food has since been deleted; such
/// entries stay in the log and contribute zero to every total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub food_id: Option<Uuid>,
    pub meal_slot: MealSlot,
    #[serde(with = "crate::dates::ymd")]
    pub log_date: Date,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snacks => "Snacks",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal slot {0:?}")]
pub struct UnknownMealSlot(pub String);

impl FromStr for MealSlot {
    type Err = UnknownMealSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Breakfast" => Ok(MealSlot::Breakfast),
            "Lunch" => Ok(MealSlot::Lunch),
            "Dinner" => Ok(MealSlot::Dinner),
            "Snacks" => Ok(MealSlot::Snacks),
            other => Err(UnknownMealSlot(other.to_string())),
        }
    }
}

/// Per-date macro sums. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl DailyTotals {
    pub(crate) fn add(&mut self, quantity: f64, fact: &FoodFact) {
        self.calories += quantity * fact.calories;
        self.protein += quantity * fact.protein;
        self.carbs += quantity * fact.carbs;
        self.fats += quantity * fact.fats;
    }
}

/// A log entry the aggregator refuses to fold into a total. Silent
/// mis-aggregation is worse than a visible error, so these fail fast.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InvalidEntry {
    #[error("entry {id} is dated {found}, expected {expected}")]
    DateMismatch { id: Uuid, expected: Date, found: Date },
    #[error("entry {id} has invalid quantity {quantity}")]
    Quantity { id: Uuid, quantity: f64 },
}

pub(crate) fn validate_quantity(entry: &LogEntry) -> Result<(), InvalidEntry> {
    if entry.quantity < 0.0 || !entry.quantity.is_finite() {
        return Err(InvalidEntry::Quantity {
            id: entry.id,
            quantity: entry.quantity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_slot_round_trips_through_str() {
        for slot in [
            MealSlot::Breakfast,
            MealSlot::Lunch,
            MealSlot::Dinner,
            MealSlot::Snacks,
        ] {
            assert_eq!(slot.as_str().parse::<MealSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn meal_slot_rejects_unknown_labels() {
        assert!("brunch".parse::<MealSlot>().is_err());
        assert!("".parse::<MealSlot>().is_err());
    }
}
