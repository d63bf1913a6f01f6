use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::FoodRecord;

#[derive(Debug, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
    pub barcode: Option<String>,
}

impl CreateFoodRequest {
    /// Nutrition facts must be non-negative and finite; the name must not be
    /// blank. Returns a message suitable for a 422 response.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        for (label, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(format!("{label} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodResponse {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<FoodRecord> for FoodResponse {
    fn from(r: FoodRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fats: r.fats,
            serving_size: r.serving_size,
            barcode: r.barcode,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateFoodRequest {
        CreateFoodRequest {
            name: "Chicken Breast".into(),
            calories: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fats: 3.6,
            serving_size: "100g".into(),
            barcode: None,
        }
    }

    #[test]
    fn accepts_valid_food() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut r = request();
        r.name = "   ".into();
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_negative_or_non_finite_macros() {
        let mut r = request();
        r.protein = -1.0;
        assert!(r.validate().is_err());

        let mut r = request();
        r.calories = f64::NAN;
        assert!(r.validate().is_err());
    }
}
