mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub use dto::{FoodFilter, FoodInput};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::food_routes()
}
