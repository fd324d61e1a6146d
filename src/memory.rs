//! In-process stores used by the tests in place of Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dashboard::repo::GoalStore;
use crate::foods::repo::{FoodDeletion, FoodStore};
use crate::foods::{FoodFilter, FoodInput};
use crate::meals::dto::NewMeal;
use crate::meals::repo::MealStore;
use crate::model::{Food, Meal, MealEntry};

#[derive(Default)]
struct Tables {
    foods: Vec<Food>,
    /// Stored without resolved foods; `hydrate` fills them in on read.
    meals: Vec<Meal>,
    goals: HashMap<Uuid, i32>,
}

impl Tables {
    fn hydrate(&self, meal: &Meal) -> Meal {
        let mut meal = meal.clone();
        for entry in &mut meal.entries {
            entry.food = self.foods.iter().find(|f| f.id == entry.food_id).cloned();
        }
        meal
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(food: &Food, filter: &FoodFilter) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let in_name = food.name.to_lowercase().contains(&needle);
        let in_brand = food
            .brand
            .as_deref()
            .is_some_and(|b| b.to_lowercase().contains(&needle));
        if !(in_name || in_brand) {
            return false;
        }
    }
    filter.category.map_or(true, |c| food.category == c)
        && filter.is_custom.map_or(true, |c| food.is_custom == c)
}

fn apply(food: &mut Food, input: &FoodInput) {
    food.name = input.name.trim().to_string();
    food.brand = input.brand.clone();
    food.image_url = input.image_url.clone();
    food.serving_size = input.serving_size;
    food.serving_unit = input.serving_unit.clone();
    food.calories_per_serving = input.calories_per_serving;
    food.carbohydrates = input.carbohydrates;
    food.protein = input.protein;
    food.fat = input.fat;
    food.fiber = input.fiber;
    food.sugar = input.sugar;
    food.category = input.category;
}

#[async_trait]
impl FoodStore for MemoryStore {
    async fn search(&self, filter: &FoodFilter) -> anyhow::Result<(Vec<Food>, i64)> {
        let tables = self.tables.lock().await;
        let mut hits: Vec<&Food> = tables.foods.iter().filter(|f| matches(f, filter)).collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        let tables = self.tables.lock().await;
        Ok(tables.foods.iter().find(|f| f.id == id).cloned())
    }

    async fn insert(&self, input: &FoodInput, user_id: Option<Uuid>) -> anyhow::Result<Food> {
        let mut food = Food {
            id: Uuid::new_v4(),
            name: String::new(),
            brand: None,
            image_url: None,
            serving_size: 0.0,
            serving_unit: String::new(),
            calories_per_serving: 0.0,
            carbohydrates: 0.0,
            protein: 0.0,
            fat: 0.0,
            fiber: 0.0,
            sugar: 0.0,
            category: input.category,
            is_custom: user_id.is_some(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        apply(&mut food, input);
        self.tables.lock().await.foods.push(food.clone());
        Ok(food)
    }

    async fn update(&self, id: Uuid, input: &FoodInput) -> anyhow::Result<Option<Food>> {
        let mut tables = self.tables.lock().await;
        let Some(food) = tables.foods.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        apply(food, input);
        Ok(Some(food.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<FoodDeletion> {
        let mut tables = self.tables.lock().await;
        if tables
            .meals
            .iter()
            .flat_map(|m| &m.entries)
            .any(|e| e.food_id == id)
        {
            return Ok(FoodDeletion::Referenced);
        }
        let before = tables.foods.len();
        tables.foods.retain(|f| f.id != id);
        Ok(if tables.foods.len() < before {
            FoodDeletion::Deleted
        } else {
            FoodDeletion::NotFound
        })
    }

    async fn reference_count(&self, id: Uuid) -> anyhow::Result<i64> {
        let tables = self.tables.lock().await;
        let n = tables
            .meals
            .iter()
            .flat_map(|m| &m.entries)
            .filter(|e| e.food_id == id)
            .count();
        Ok(n as i64)
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn list_by_date(&self, user_id: Uuid, date: &str) -> anyhow::Result<Vec<Meal>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .meals
            .iter()
            .filter(|m| m.user_id == user_id && m.date == date)
            .map(|m| tables.hydrate(m))
            .collect())
    }

    async fn get(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .meals
            .iter()
            .find(|m| m.id == meal_id && m.user_id == user_id)
            .map(|m| tables.hydrate(m)))
    }

    async fn create(&self, user_id: Uuid, meal: &NewMeal) -> anyhow::Result<Meal> {
        let mut tables = self.tables.lock().await;
        // same outcome as the foreign key failing inside the transaction
        if let Some(missing) = meal
            .entries
            .iter()
            .find(|e| !tables.foods.iter().any(|f| f.id == e.food_id))
        {
            anyhow::bail!("food {} does not exist", missing.food_id);
        }

        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        let stored = Meal {
            id,
            user_id,
            date: meal.date.clone(),
            meal_type: meal.meal_type,
            created_at: now,
            updated_at: now,
            entries: meal
                .entries
                .iter()
                .map(|e| MealEntry {
                    id: Uuid::new_v4(),
                    meal_id: id,
                    food_id: e.food_id,
                    servings: e.servings,
                    notes: e.notes.clone(),
                    image_url: e.image_url.clone(),
                    created_at: now,
                    food: None,
                })
                .collect(),
        };
        let hydrated = tables.hydrate(&stored);
        tables.meals.push(stored);
        Ok(hydrated)
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.meals.len();
        tables
            .meals
            .retain(|m| !(m.id == meal_id && m.user_id == user_id));
        Ok(tables.meals.len() < before)
    }

    async fn delete_entry(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        let Some(meal) = tables
            .meals
            .iter_mut()
            .find(|m| m.id == meal_id && m.user_id == user_id)
        else {
            return Ok(false);
        };
        let before = meal.entries.len();
        meal.entries.retain(|e| e.id != entry_id);
        if meal.entries.len() == before {
            return Ok(false);
        }
        meal.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }
}

#[async_trait]
impl GoalStore for MemoryStore {
    async fn calorie_goal(&self, user_id: Uuid) -> anyhow::Result<Option<i32>> {
        Ok(self.tables.lock().await.goals.get(&user_id).copied())
    }

    async fn set_calorie_goal(&self, user_id: Uuid, goal: i32) -> anyhow::Result<()> {
        self.tables.lock().await.goals.insert(user_id, goal);
        Ok(())
    }
}
