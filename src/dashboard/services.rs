use std::ops::RangeInclusive;

use tracing::info;
use uuid::Uuid;

use super::repo::GoalStore;
use crate::error::{AppError, AppResult};
use crate::meals::dto::DailySummary;
use crate::meals::repo::MealStore;
use crate::meals::summary::{group_by_type, summarize};

pub const GOAL_RANGE: RangeInclusive<i32> = 500..=5000;

/// Stored goal for the user, or `fallback` when none is stored.
pub async fn calorie_goal(goals: &dyn GoalStore, user_id: Uuid, fallback: i32) -> AppResult<i32> {
    Ok(goals.calorie_goal(user_id).await?.unwrap_or(fallback))
}

pub async fn daily_summary(
    meals: &dyn MealStore,
    goals: &dyn GoalStore,
    user_id: Uuid,
    date: &str,
    fallback_goal: i32,
) -> AppResult<DailySummary> {
    let goal = calorie_goal(goals, user_id, fallback_goal).await?;
    let loaded = meals.list_by_date(user_id, date).await?;
    Ok(summarize(date, group_by_type(&loaded), goal))
}

pub async fn update_goal(goals: &dyn GoalStore, user_id: Uuid, goal: i32) -> AppResult<i32> {
    if !GOAL_RANGE.contains(&goal) {
        return Err(AppError::Validation(format!(
            "daily_calorie_goal must be between {} and {}",
            GOAL_RANGE.start(),
            GOAL_RANGE.end()
        )));
    }
    goals.set_calorie_goal(user_id, goal).await?;
    info!(%user_id, goal, "calorie goal updated");
    Ok(goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::FoodInput;
    use crate::foods::repo::FoodStore;
    use crate::memory::MemoryStore;
    use crate::meals::dto::CreateMealRequest;
    use crate::meals::services::create_meal;
    use serde_json::json;

    #[tokio::test]
    async fn goal_falls_back_until_stored() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert_eq!(calorie_goal(&store, user, 1200).await.unwrap(), 1200);

        update_goal(&store, user, 1800).await.unwrap();
        assert_eq!(calorie_goal(&store, user, 1200).await.unwrap(), 1800);
    }

    #[tokio::test]
    async fn out_of_range_goal_is_rejected() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for bad in [0, 499, 5001] {
            let err = update_goal(&store, user, bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(calorie_goal(&store, user, 1200).await.unwrap(), 1200);
        assert_eq!(update_goal(&store, user, 500).await.unwrap(), 500);
        assert_eq!(update_goal(&store, user, 5000).await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn summary_over_stored_meals() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let oatmeal: FoodInput =
            serde_json::from_value(json!({"name": "Oatmeal", "calories_per_serving": 200.0}))
                .unwrap();
        let pasta: FoodInput =
            serde_json::from_value(json!({"name": "Pasta", "calories_per_serving": 500.0}))
                .unwrap();
        let oatmeal = store.insert(&oatmeal, None).await.unwrap();
        let pasta = store.insert(&pasta, None).await.unwrap();

        for (meal_type, food_id, servings) in
            [("breakfast", oatmeal.id, 1.5), ("lunch", pasta.id, 1.0)]
        {
            let req: CreateMealRequest = serde_json::from_value(json!({
                "meal_type": meal_type,
                "date": "2024-03-10",
                "entries": [{"food_id": food_id, "servings": servings}]
            }))
            .unwrap();
            create_meal(&store, &store, user, req).await.unwrap();
        }

        let summary = daily_summary(&store, &store, user, "2024-03-10", 1200)
            .await
            .unwrap();
        assert_eq!(summary.total_calories, 800.0);
        assert_eq!(summary.calorie_goal, 1200);
        assert_eq!(summary.calories_remaining, 400.0);
        assert_eq!(summary.calories_used_percentage, 66.7);
        assert_eq!(summary.meals.breakfast.len(), 1);
        assert_eq!(summary.meals.lunch.len(), 1);

        // another user's day is untouched
        let other = daily_summary(&store, &store, Uuid::new_v4(), "2024-03-10", 1200)
            .await
            .unwrap();
        assert_eq!(other.total_calories, 0.0);
    }
}
