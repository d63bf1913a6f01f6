use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use base64::Engine;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::{auth::AuthUser, state::AppState};

use super::{FoodPayload, LookupError, RecognizedFood};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lookup/barcode", post(lookup_barcode))
        .route("/lookup/search", post(search_by_name))
        .route("/lookup/ai-search", post(ai_search))
        .route("/lookup/recognize", post(recognize))
}

#[derive(Debug, Deserialize)]
pub struct BarcodeRequest {
    pub barcode: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RecognizeRequest {
    pub image_b64: String,
    #[serde(default = "default_image_type")]
    pub content_type: String,
}

fn default_image_type() -> String {
    "image/jpeg".to_string()
}

fn upstream(e: LookupError) -> (StatusCode, String) {
    let status = match &e {
        LookupError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    warn!(error = %e, "lookup failed");
    (status, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn lookup_barcode(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<BarcodeRequest>,
) -> Result<Json<FoodPayload>, (StatusCode, String)> {
    let barcode = payload.barcode.trim();
    if barcode.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Barcode is required".into()));
    }
    let food = state
        .lookup
        .barcode(barcode)
        .await
        .map_err(upstream)?
        .ok_or((StatusCode::NOT_FOUND, "Product not found".to_string()))?;
    Ok(Json(food))
}

#[instrument(skip(state, payload))]
pub async fn search_by_name(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Vec<FoodPayload>>, (StatusCode, String)> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Search query is required".into()));
    }
    let foods = state.lookup.search(query).await.map_err(upstream)?;
    Ok(Json(foods))
}

#[instrument(skip(state, payload))]
pub async fn ai_search(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Vec<FoodPayload>>, (StatusCode, String)> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Search query is required".into()));
    }
    let foods = state.lookup.ai_search(query).await.map_err(upstream)?;
    Ok(Json(foods))
}

#[instrument(skip(state, payload))]
pub async fn recognize(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<RecognizeRequest>,
) -> Result<Json<Vec<RecognizedFood>>, (StatusCode, String)> {
    if payload.image_b64.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "image_b64 is required".into()));
    }
    // Validate the encoding up front; the provider gets the original string.
    if base64::engine::general_purpose::STANDARD
        .decode(&payload.image_b64)
        .is_err()
    {
        return Err((StatusCode::BAD_REQUEST, "invalid base64".into()));
    }
    let items = state
        .lookup
        .recognize(&payload.image_b64, &payload.content_type)
        .await
        .map_err(upstream)?;
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn fake_lookup_resolves_known_barcode() {
        let state = AppState::fake();
        let food = state.lookup.barcode("4000417025005").await.unwrap().unwrap();
        assert_eq!(food.name, "Grilled Chicken Breast");
        assert_eq!(food.calories, 165.0);
    }

    #[tokio::test]
    async fn fake_lookup_misses_unknown_barcode() {
        let state = AppState::fake();
        assert!(state.lookup.barcode("0000000000000").await.unwrap().is_none());
    }
}
