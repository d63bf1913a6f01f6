//! Proxies to third-party food databases: barcode lookup and name search via
//! Open Food Facts, natural-language search and image recognition via Gemini.
//! Stateless: results only reach the food library when the user saves them.

mod client;
pub mod handlers;

use axum::Router;

use crate::state::AppState;

pub use client::{FoodLookup, FoodPayload, LookupError, RecognizedFood, ReqwestFoodLookup};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
