use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateMealRequest, MealResponse, MealsByType};
use super::repo::MealStore;
use super::summary::{group_by_type, meal_response};
use crate::error::{AppError, AppResult};
use crate::foods::repo::FoodStore;
use crate::model::today;

pub async fn meals_by_date(
    store: &dyn MealStore,
    user_id: Uuid,
    date: &str,
) -> AppResult<MealsByType> {
    let meals = store.list_by_date(user_id, date).await?;
    Ok(group_by_type(&meals))
}

pub async fn get_meal(store: &dyn MealStore, user_id: Uuid, meal_id: Uuid) -> AppResult<MealResponse> {
    let meal = store
        .get(user_id, meal_id)
        .await?
        .ok_or(AppError::NotFoundOrForbidden("meal"))?;
    Ok(meal_response(&meal))
}

/// Validates the request, checks every referenced food exists, then stores
/// the meal with all of its entries in one write.
pub async fn create_meal(
    meals: &dyn MealStore,
    foods: &dyn FoodStore,
    user_id: Uuid,
    req: CreateMealRequest,
) -> AppResult<MealResponse> {
    let new_meal = req.validate(today())?;

    for entry in &new_meal.entries {
        if foods.get(entry.food_id).await?.is_none() {
            warn!(food_id = %entry.food_id, "meal references unknown food");
            return Err(AppError::Validation(format!(
                "food {} does not exist",
                entry.food_id
            )));
        }
    }

    let meal = meals.create(user_id, &new_meal).await?;
    info!(
        meal_id = %meal.id,
        meal_type = %meal.meal_type,
        date = %meal.date,
        entries = meal.entries.len(),
        "meal created"
    );
    Ok(meal_response(&meal))
}

pub async fn delete_meal(store: &dyn MealStore, user_id: Uuid, meal_id: Uuid) -> AppResult<()> {
    if !store.delete(user_id, meal_id).await? {
        return Err(AppError::NotFoundOrForbidden("meal"));
    }
    info!(%meal_id, "meal deleted");
    Ok(())
}

pub async fn delete_entry(
    store: &dyn MealStore,
    user_id: Uuid,
    meal_id: Uuid,
    entry_id: Uuid,
) -> AppResult<()> {
    if !store.delete_entry(user_id, meal_id, entry_id).await? {
        return Err(AppError::NotFoundOrForbidden("meal entry"));
    }
    info!(%meal_id, %entry_id, "meal entry deleted");
    Ok(())
}
