use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

use super::dto::{CreateFoodRequest, FoodListQuery, FoodResponse};
use super::repo::{self, NewFood};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", get(get_food).delete(delete_food))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodResponse>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg))?;

    let record = repo::create(
        &state.db,
        user_id,
        NewFood {
            name: payload.name.trim(),
            calories: payload.calories,
            protein: payload.protein,
            carbs: payload.carbs,
            fats: payload.fats,
            serving_size: &payload.serving_size,
            barcode: payload.barcode.as_deref(),
        },
    )
    .await
    .map_err(internal)?;

    info!(food_id = %record.id, "food created");
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<FoodListQuery>,
) -> Result<Json<Vec<FoodResponse>>, (StatusCode, String)> {
    let filter = q.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let rows = repo::list(&state.db, user_id, filter)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(FoodResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodResponse>, (StatusCode, String)> {
    let record = repo::get(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Food not found".to_string()))?;
    Ok(Json(record.into()))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Food not found".into()));
    }
    info!(food_id = %id, "food deleted");
    Ok(StatusCode::NO_CONTENT)
}
