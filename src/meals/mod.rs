pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;
pub mod summary;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::meal_routes()
}
