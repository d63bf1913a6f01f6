mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
mod repo;
mod services;

use axum::Router;

use crate::state::AppState;

pub use jwt::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
