use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateMealRequest, DateQuery, MealResponse, MealsOfDay};
use super::services;
use crate::error::{ApiResponse, AppResult};
use crate::model::today;
use crate::state::AppState;

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/:id", get(get_meal).delete(delete_meal))
        .route("/meals/:id/entries/:entry_id", delete(delete_entry))
}

/// GET /meals?date=YYYY-MM-DD
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<ApiResponse<MealsOfDay>>> {
    let date = q.resolve(today())?;
    let meals =
        services::meals_by_date(state.meals.as_ref(), state.config.default_user_id, &date).await?;
    Ok(Json(ApiResponse::ok(MealsOfDay { date, meals })))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MealResponse>>> {
    let meal = services::get_meal(state.meals.as_ref(), state.config.default_user_id, id).await?;
    Ok(Json(ApiResponse::ok(meal)))
}

#[instrument(skip(state, req))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(req): Json<CreateMealRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MealResponse>>)> {
    let meal = services::create_meal(
        state.meals.as_ref(),
        state.foods.as_ref(),
        state.config.default_user_id,
        req,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("meal created", meal)),
    ))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    services::delete_meal(state.meals.as_ref(), state.config.default_user_id, id).await?;
    Ok(Json(ApiResponse::message("meal deleted")))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<()>>> {
    services::delete_entry(
        state.meals.as_ref(),
        state.config.default_user_id,
        id,
        entry_id,
    )
    .await?;
    Ok(Json(ApiResponse::message("meal entry deleted")))
}
