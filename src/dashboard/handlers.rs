use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{GoalData, UpdateGoalRequest};
use super::services;
use crate::error::{ApiResponse, AppResult};
use crate::meals::dto::{DailySummary, DateQuery};
use crate::model::today;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(summary))
        .route("/dashboard/goals/update", post(update_goal))
}

/// GET /dashboard/summary?date=YYYY-MM-DD
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> AppResult<Json<ApiResponse<DailySummary>>> {
    let date = q.resolve(today())?;
    let summary = services::daily_summary(
        state.meals.as_ref(),
        state.goals.as_ref(),
        state.config.default_user_id,
        &date,
        state.config.daily_calorie_goal,
    )
    .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

#[instrument(skip(state))]
pub async fn update_goal(
    State(state): State<AppState>,
    Json(body): Json<UpdateGoalRequest>,
) -> AppResult<Json<ApiResponse<GoalData>>> {
    let goal = services::update_goal(
        state.goals.as_ref(),
        state.config.default_user_id,
        body.daily_calorie_goal,
    )
    .await?;
    Ok(Json(ApiResponse::ok_with_message(
        "calorie goal updated",
        GoalData {
            daily_calorie_goal: goal,
        },
    )))
}
