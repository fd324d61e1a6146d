use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CategoryOption, FoodFilter, FoodInput, FoodListItem, FoodPage, SearchParams};
use super::services;
use crate::error::{ApiResponse, AppResult};
use crate::model::Food;
use crate::state::AppState;

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/custom", post(create_custom_food))
        .route("/foods/categories/list", get(list_categories))
        .route(
            "/foods/:id",
            get(get_food).put(update_food).delete(delete_food),
        )
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<FoodPage>>> {
    let filter = FoodFilter::try_from(params)?;
    let (foods, total) = services::search_foods(state.foods.as_ref(), &filter).await?;
    Ok(Json(ApiResponse::ok(FoodPage {
        foods: foods.into_iter().map(FoodListItem::from).collect(),
        total,
        limit: filter.limit,
        offset: filter.offset,
    })))
}

pub async fn list_categories() -> Json<ApiResponse<Vec<CategoryOption>>> {
    Json(ApiResponse::ok(services::categories()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Food>>> {
    let food = services::get_food(state.foods.as_ref(), id).await?;
    Ok(Json(ApiResponse::ok(food)))
}

/// POST /foods: preset food with no owner.
#[instrument(skip(state, input))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(input): Json<FoodInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Food>>)> {
    let food = services::create_food(state.foods.as_ref(), &input, None).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("food created", food)),
    ))
}

/// POST /foods/custom: food owned by the current user.
#[instrument(skip(state, input))]
pub async fn create_custom_food(
    State(state): State<AppState>,
    Json(input): Json<FoodInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Food>>)> {
    let owner = state.config.default_user_id;
    let food = services::create_food(state.foods.as_ref(), &input, Some(owner)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("food created", food)),
    ))
}

#[instrument(skip(state, input))]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<FoodInput>,
) -> AppResult<Json<ApiResponse<Food>>> {
    let food = services::update_food(state.foods.as_ref(), id, &input).await?;
    Ok(Json(ApiResponse::ok_with_message("food updated", food)))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    services::delete_food(state.foods.as_ref(), id).await?;
    Ok(Json(ApiResponse::message("food deleted")))
}
