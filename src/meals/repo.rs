use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::NewMeal;
use crate::foods::repo::{FoodRow, FOOD_COLUMNS};
use crate::model::{Food, Meal, MealEntry};

#[async_trait]
pub trait MealStore: Send + Sync {
    /// The user's meals on `date`, oldest first, entries resolved.
    async fn list_by_date(&self, user_id: Uuid, date: &str) -> anyhow::Result<Vec<Meal>>;
    async fn get(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>>;
    /// Persists the meal and all of its entries, or nothing.
    async fn create(&self, user_id: Uuid, meal: &NewMeal) -> anyhow::Result<Meal>;
    /// Deletes the meal if `user_id` owns it.
    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool>;
    /// Deletes the entry if it belongs to `meal_id` and the meal to `user_id`.
    async fn delete_entry(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<bool>;
}

#[derive(Debug, FromRow)]
struct MealRow {
    id: Uuid,
    user_id: Uuid,
    date: String,
    meal_type: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    meal_id: Uuid,
    food_id: Uuid,
    servings: f64,
    notes: Option<String>,
    image_url: Option<String>,
    created_at: OffsetDateTime,
}

pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Attaches entries and their foods to the given meal rows.
    async fn hydrate(&self, rows: Vec<MealRow>) -> anyhow::Result<Vec<Meal>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let meal_ids: Vec<Uuid> = rows.iter().map(|m| m.id).collect();

        let entries = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, meal_id, food_id, servings, notes, image_url, created_at
              FROM meal_entries
             WHERE meal_id = ANY($1)
             ORDER BY meal_id, position
            "#,
        )
        .bind(&meal_ids[..])
        .fetch_all(&self.db)
        .await
        .context("list meal entries")?;

        let mut food_ids: Vec<Uuid> = entries.iter().map(|e| e.food_id).collect();
        food_ids.sort_unstable();
        food_ids.dedup();
        let foods: HashMap<Uuid, Food> = sqlx::query_as::<_, FoodRow>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE id = ANY($1)"
        ))
        .bind(&food_ids[..])
        .fetch_all(&self.db)
        .await
        .context("load entry foods")?
        .into_iter()
        .map(|r| Food::try_from(r).map(|f| (f.id, f)))
        .collect::<anyhow::Result<_>>()?;

        let mut by_meal: HashMap<Uuid, Vec<MealEntry>> = HashMap::new();
        for e in entries {
            by_meal.entry(e.meal_id).or_default().push(MealEntry {
                id: e.id,
                meal_id: e.meal_id,
                food_id: e.food_id,
                servings: e.servings,
                notes: e.notes,
                image_url: e.image_url,
                created_at: e.created_at,
                food: foods.get(&e.food_id).cloned(),
            });
        }

        rows.into_iter()
            .map(|r| {
                Ok(Meal {
                    entries: by_meal.remove(&r.id).unwrap_or_default(),
                    id: r.id,
                    user_id: r.user_id,
                    date: r.date,
                    meal_type: r.meal_type.parse()?,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn list_by_date(&self, user_id: Uuid, date: &str) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, user_id, date, meal_type, created_at, updated_at
              FROM meals
             WHERE user_id = $1 AND date = $2
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.db)
        .await
        .context("list meals by date")?;
        self.hydrate(rows).await
    }

    async fn get(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, user_id, date, meal_type, created_at, updated_at
              FROM meals
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get meal")?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, user_id: Uuid, meal: &NewMeal) -> anyhow::Result<Meal> {
        let meal_id = Uuid::new_v4();
        let mut tx = self.db.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            INSERT INTO meals (id, user_id, date, meal_type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(meal_id)
        .bind(user_id)
        .bind(&meal.date)
        .bind(meal.meal_type.as_str())
        .execute(&mut *tx)
        .await
        .context("insert meal")?;

        for (position, entry) in meal.entries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO meal_entries (id, meal_id, food_id, servings, notes, image_url, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(meal_id)
            .bind(entry.food_id)
            .bind(entry.servings)
            .bind(&entry.notes)
            .bind(&entry.image_url)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert meal entry for food {}", entry.food_id))?;
        }

        tx.commit().await.context("commit tx")?;

        self.get(user_id, meal_id)
            .await?
            .context("meal vanished after insert")
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
            .bind(meal_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete meal")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_entry(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let res = sqlx::query(
            r#"
            DELETE FROM meal_entries e
             USING meals m
             WHERE e.id = $1
               AND e.meal_id = $2
               AND m.id = e.meal_id
               AND m.user_id = $3
            "#,
        )
        .bind(entry_id)
        .bind(meal_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("delete meal entry")?;
        if res.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("UPDATE meals SET updated_at = now() WHERE id = $1")
            .bind(meal_id)
            .execute(&mut *tx)
            .await
            .context("touch meal")?;
        tx.commit().await.context("commit tx")?;
        Ok(true)
    }
}
