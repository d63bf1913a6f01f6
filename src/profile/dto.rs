use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Goals, ProfileRecord};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carb_goal: f64,
    pub fat_goal: f64,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        for (label, value) in [
            ("calorie_goal", self.calorie_goal),
            ("protein_goal", self.protein_goal),
            ("carb_goal", self.carb_goal),
            ("fat_goal", self.fat_goal),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(format!("{label} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub has_avatar: bool,
    #[serde(flatten)]
    pub goals: Goals,
}

impl ProfileResponse {
    pub fn from_record(record: ProfileRecord) -> Self {
        Self {
            user_id: record.user_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            has_avatar: record.avatar_key.is_some(),
            goals: record.goals(),
        }
    }

    /// Response for users who never saved a profile: empty names, default
    /// goals.
    pub fn defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            first_name: None,
            last_name: None,
            has_avatar: false,
            goals: Goals::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_goals_match_documented_values() {
        let response = ProfileResponse::defaults(Uuid::new_v4());
        assert_eq!(response.goals.calorie_goal, 2200.0);
        assert_eq!(response.goals.protein_goal, 150.0);
        assert_eq!(response.goals.carb_goal, 250.0);
        assert_eq!(response.goals.fat_goal, 70.0);
    }

    #[test]
    fn update_rejects_negative_goal() {
        let request = UpdateProfileRequest {
            first_name: None,
            last_name: None,
            calorie_goal: 2000.0,
            protein_goal: -5.0,
            carb_goal: 250.0,
            fat_goal: 70.0,
        };
        assert!(request.validate().is_err());
    }
}
