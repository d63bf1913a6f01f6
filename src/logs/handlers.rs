use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    dates,
    foods,
    nutrition::{self, FoodFact, InvalidEntry, LogEntry},
    state::AppState,
};

use super::dto::{
    CreateLogRequest, CreatedLogResponse, DayGroupResponse, DayQuery, HistoryQuery,
    LogEntryResponse, MealGroupResponse, UpdateLogRequest,
};
use super::repo::{self, LoggedFood};

/// Default span of the grouped history view when the caller gives no range.
const HISTORY_DEFAULT_DAYS: i64 = 30;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs).post(create_log))
        .route("/logs/history", get(log_history))
        .route("/logs/:id", patch(update_log).delete(delete_log))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn unprocessable(e: InvalidEntry) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

fn bad_date(e: time::error::Parse) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, format!("invalid date: {e}"))
}

fn validate_quantity(quantity: f64) -> Result<(), (StatusCode, String)> {
    if quantity <= 0.0 || !quantity.is_finite() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "quantity must be a positive number".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<CreatedLogResponse>), (StatusCode, String)> {
    validate_quantity(payload.quantity)?;

    // The food must exist and belong to the caller at logging time; it only
    // goes missing later, through deletion.
    foods::repo::get(&state.db, user_id, payload.food_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Food not found".to_string()))?;

    let id = repo::insert(
        &state.db,
        user_id,
        payload.food_id,
        payload.meal_slot,
        payload.log_date,
        payload.quantity,
    )
    .await
    .map_err(internal)?;

    info!(log_id = %id, meal_slot = payload.meal_slot.as_str(), "log entry created");
    Ok((StatusCode::CREATED, Json(CreatedLogResponse { id })))
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<Vec<LogEntryResponse>>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(raw) => dates::parse_ymd(raw).map_err(bad_date)?,
        None => dates::today_utc(),
    };
    let rows = repo::list_for_date(&state.db, user_id, date)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(LogEntryResponse::from).collect()))
}

/// History view: entries grouped by date (most recent first), then by meal
/// slot, each day annotated with its calorie total.
#[instrument(skip(state))]
pub async fn log_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<DayGroupResponse>>, (StatusCode, String)> {
    let end = match q.end.as_deref() {
        Some(raw) => dates::parse_ymd(raw).map_err(bad_date)?,
        None => dates::today_utc(),
    };
    let start = match q.start.as_deref() {
        Some(raw) => dates::parse_ymd(raw).map_err(bad_date)?,
        None => end - Duration::days(HISTORY_DEFAULT_DAYS),
    };
    if start > end {
        return Err((StatusCode::BAD_REQUEST, "start is after end".into()));
    }

    let rows = repo::list_in_range(&state.db, user_id, start, end)
        .await
        .map_err(internal)?;
    Ok(Json(group_history(rows).map_err(unprocessable)?))
}

/// Pure assembly of the history response; split out so it can be tested
/// without a database.
fn group_history(rows: Vec<LoggedFood>) -> Result<Vec<DayGroupResponse>, InvalidEntry> {
    let mut facts: HashMap<Uuid, FoodFact> = HashMap::new();
    let mut views: HashMap<Uuid, Option<FoodFact>> = HashMap::new();
    let mut entries: Vec<LogEntry> = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(fact) = &row.food {
            facts.insert(fact.id, fact.clone());
        }
        views.insert(row.entry.id, row.food);
        entries.push(row.entry);
    }

    let mut days = Vec::new();
    for day in nutrition::group_by_date_then_meal(entries) {
        let day_entries: Vec<LogEntry> = day
            .meals
            .iter()
            .flat_map(|m| m.entries.iter().cloned())
            .collect();
        let totals = nutrition::compute_daily_totals(day.date, &day_entries, |id| facts.get(&id))?;

        let meals = day
            .meals
            .into_iter()
            .map(|meal| MealGroupResponse {
                meal_slot: meal.slot,
                entries: meal
                    .entries
                    .into_iter()
                    .map(|entry| {
                        let food = views.get(&entry.id).cloned().flatten();
                        LogEntryResponse::from(LoggedFood { entry, food })
                    })
                    .collect(),
            })
            .collect();

        days.push(DayGroupResponse {
            date: day.date,
            total_calories: totals.calories,
            meals,
        });
    }
    Ok(days)
}

#[instrument(skip(state, payload))]
pub async fn update_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLogRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    validate_quantity(payload.quantity)?;
    let updated = repo::update_quantity(&state.db, user_id, id, payload.quantity)
        .await
        .map_err(internal)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Log entry not found".into()));
    }
    info!(log_id = %id, quantity = payload.quantity, "log entry updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Log entry not found".into()));
    }
    info!(log_id = %id, "log entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::nutrition::MealSlot;

    fn food(name: &str, calories: f64) -> FoodFact {
        FoodFact {
            id: Uuid::new_v4(),
            name: name.into(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            serving_size: "100g".into(),
        }
    }

    fn logged(
        log_date: time::Date,
        meal_slot: MealSlot,
        quantity: f64,
        food: Option<FoodFact>,
    ) -> LoggedFood {
        LoggedFood {
            entry: LogEntry {
                id: Uuid::new_v4(),
                food_id: food.as_ref().map(|f| f.id),
                meal_slot,
                log_date,
                quantity,
            },
            food,
        }
    }

    #[test]
    fn history_groups_days_with_calorie_totals() {
        let chicken = food("Chicken Breast", 165.0);
        let rows = vec![
            logged(date!(2026 - 08 - 20), MealSlot::Lunch, 2.0, Some(chicken.clone())),
            logged(date!(2026 - 08 - 19), MealSlot::Dinner, 1.0, Some(chicken.clone())),
            logged(date!(2026 - 08 - 20), MealSlot::Snacks, 1.0, None),
        ];

        let days = group_history(rows).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date!(2026 - 08 - 20));
        assert_eq!(days[0].total_calories, 330.0); // deleted-food entry counts zero
        assert_eq!(days[1].date, date!(2026 - 08 - 19));
        assert_eq!(days[1].total_calories, 165.0);

        let total_entries: usize = days.iter().map(|d| d.meals.iter().map(|m| m.entries.len()).sum::<usize>()).sum();
        assert_eq!(total_entries, 3);
    }

    #[test]
    fn history_keeps_deleted_food_entries_visible() {
        let rows = vec![logged(date!(2026 - 08 - 20), MealSlot::Breakfast, 1.5, None)];
        let days = group_history(rows).unwrap();
        assert_eq!(days[0].meals[0].entries.len(), 1);
        assert!(days[0].meals[0].entries[0].food.is_none());
        assert_eq!(days[0].total_calories, 0.0);
    }
}
