pub mod client;
mod dto;
pub mod handlers;
pub mod normalize;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_size: usize) -> Router<AppState> {
    handlers::upload_routes(max_upload_size)
}
