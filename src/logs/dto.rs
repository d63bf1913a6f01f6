use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::nutrition::{FoodFact, MealSlot};

use super::repo::LoggedFood;

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub food_id: Uuid,
    pub meal_slot: MealSlot,
    #[serde(with = "crate::dates::ymd")]
    pub log_date: Date,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLogRequest {
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
}

impl From<FoodFact> for FoodSummary {
    fn from(f: FoodFact) -> Self {
        Self {
            id: f.id,
            name: f.name,
            calories: f.calories,
            protein: f.protein,
            carbs: f.carbs,
            fats: f.fats,
            serving_size: f.serving_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntryResponse {
    pub id: Uuid,
    #[serde(with = "crate::dates::ymd")]
    pub log_date: Date,
    pub meal_slot: MealSlot,
    pub quantity: f64,
    /// `None` when the food has been deleted; the entry still shows in
    /// history but counts as zero.
    pub food: Option<FoodSummary>,
}

impl From<LoggedFood> for LogEntryResponse {
    fn from(l: LoggedFood) -> Self {
        Self {
            id: l.entry.id,
            log_date: l.entry.log_date,
            meal_slot: l.entry.meal_slot,
            quantity: l.entry.quantity,
            food: l.food.map(FoodSummary::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedLogResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MealGroupResponse {
    pub meal_slot: MealSlot,
    pub entries: Vec<LogEntryResponse>,
}

#[derive(Debug, Serialize)]
pub struct DayGroupResponse {
    #[serde(with = "crate::dates::ymd")]
    pub date: Date,
    pub total_calories: f64,
    pub meals: Vec<MealGroupResponse>,
}
