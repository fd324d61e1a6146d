use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CategoryOption, FoodFilter, FoodInput};
use super::repo::{FoodDeletion, FoodStore};
use crate::error::{AppError, AppResult};
use crate::model::{Food, FoodCategory};

pub async fn search_foods(store: &dyn FoodStore, filter: &FoodFilter) -> AppResult<(Vec<Food>, i64)> {
    Ok(store.search(filter).await?)
}

pub async fn get_food(store: &dyn FoodStore, id: Uuid) -> AppResult<Food> {
    store.get(id).await?.ok_or(AppError::NotFound("food"))
}

/// Creates a food. It is custom exactly when an owner is given.
pub async fn create_food(
    store: &dyn FoodStore,
    input: &FoodInput,
    user_id: Option<Uuid>,
) -> AppResult<Food> {
    input.validate()?;
    let food = store.insert(input, user_id).await?;
    info!(food_id = %food.id, is_custom = food.is_custom, "food created");
    Ok(food)
}

pub async fn update_food(store: &dyn FoodStore, id: Uuid, input: &FoodInput) -> AppResult<Food> {
    input.validate()?;
    store
        .update(id, input)
        .await?
        .ok_or(AppError::NotFound("food"))
}

/// Deletes a food unless a meal entry still references it.
pub async fn delete_food(store: &dyn FoodStore, id: Uuid) -> AppResult<()> {
    let references = store.reference_count(id).await?;
    if references > 0 {
        warn!(food_id = %id, references, "refusing to delete referenced food");
        return Err(AppError::Conflict(format!(
            "food is used by {references} meal entries"
        )));
    }
    match store.delete(id).await? {
        FoodDeletion::Deleted => {
            info!(food_id = %id, "food deleted");
            Ok(())
        }
        FoodDeletion::NotFound => Err(AppError::NotFound("food")),
        // a meal entry was added after the count
        FoodDeletion::Referenced => {
            warn!(food_id = %id, "food became referenced during delete");
            Err(AppError::Conflict("food is used by meal entries".into()))
        }
    }
}

pub fn categories() -> Vec<CategoryOption> {
    FoodCategory::ALL
        .into_iter()
        .map(|c| CategoryOption {
            value: c,
            label: c.label(),
        })
        .collect()
}
