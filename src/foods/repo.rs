use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{FoodFilter, FoodInput};
use crate::model::Food;

#[async_trait]
pub trait FoodStore: Send + Sync {
    /// Returns one page ordered by name plus the total number of matches.
    async fn search(&self, filter: &FoodFilter) -> anyhow::Result<(Vec<Food>, i64)>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>>;
    async fn insert(&self, input: &FoodInput, user_id: Option<Uuid>) -> anyhow::Result<Food>;
    async fn update(&self, id: Uuid, input: &FoodInput) -> anyhow::Result<Option<Food>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<FoodDeletion>;
    /// Number of meal entries pointing at the food.
    async fn reference_count(&self, id: Uuid) -> anyhow::Result<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodDeletion {
    Deleted,
    NotFound,
    /// A meal entry still points at the food.
    Referenced,
}

pub(crate) const FOOD_COLUMNS: &str = "id, name, brand, image_url, serving_size, serving_unit, \
     calories_per_serving, carbohydrates, protein, fat, fiber, sugar, category, \
     is_custom, user_id, created_at";

#[derive(Debug, FromRow)]
pub struct FoodRow {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub serving_size: f64,
    pub serving_unit: String,
    pub calories_per_serving: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub category: String,
    pub is_custom: bool,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<FoodRow> for Food {
    type Error = anyhow::Error;

    fn try_from(r: FoodRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            brand: r.brand,
            image_url: r.image_url,
            serving_size: r.serving_size,
            serving_unit: r.serving_unit,
            calories_per_serving: r.calories_per_serving,
            carbohydrates: r.carbohydrates,
            protein: r.protein,
            fat: r.fat,
            fiber: r.fiber,
            sugar: r.sugar,
            category: r.category.parse()?,
            is_custom: r.is_custom,
            user_id: r.user_id,
            created_at: r.created_at,
        })
    }
}

/// Escapes LIKE metacharacters so the search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &FoodFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(is_custom) = filter.is_custom {
        qb.push(" AND is_custom = ").push_bind(is_custom);
    }
}

pub struct PgFoodStore {
    db: PgPool,
}

impl PgFoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn search(&self, filter: &FoodFilter) -> anyhow::Result<(Vec<Food>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM foods");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.db)
            .await
            .context("count foods")?;

        let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {FOOD_COLUMNS} FROM foods"));
        push_filters(&mut page, filter);
        page.push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let rows: Vec<FoodRow> = page
            .build_query_as()
            .fetch_all(&self.db)
            .await
            .context("search foods")?;

        let foods = rows
            .into_iter()
            .map(Food::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((foods, total))
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get food")?;
        row.map(Food::try_from).transpose()
    }

    async fn insert(&self, input: &FoodInput, user_id: Option<Uuid>) -> anyhow::Result<Food> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            INSERT INTO foods (id, name, brand, image_url, serving_size, serving_unit,
                               calories_per_serving, carbohydrates, protein, fat, fiber, sugar,
                               category, is_custom, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(&input.image_url)
        .bind(input.serving_size)
        .bind(&input.serving_unit)
        .bind(input.calories_per_serving)
        .bind(input.carbohydrates)
        .bind(input.protein)
        .bind(input.fat)
        .bind(input.fiber)
        .bind(input.sugar)
        .bind(input.category.as_str())
        .bind(user_id.is_some())
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("insert food")?;
        row.try_into()
    }

    async fn update(&self, id: Uuid, input: &FoodInput) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            UPDATE foods
               SET name = $2, brand = $3, image_url = $4, serving_size = $5,
                   serving_unit = $6, calories_per_serving = $7, carbohydrates = $8,
                   protein = $9, fat = $10, fiber = $11, sugar = $12, category = $13
             WHERE id = $1
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(&input.image_url)
        .bind(input.serving_size)
        .bind(&input.serving_unit)
        .bind(input.calories_per_serving)
        .bind(input.carbohydrates)
        .bind(input.protein)
        .bind(input.fat)
        .bind(input.fiber)
        .bind(input.sugar)
        .bind(input.category.as_str())
        .fetch_optional(&self.db)
        .await
        .context("update food")?;
        row.map(Food::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<FoodDeletion> {
        let res = sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await;
        match res {
            Ok(done) if done.rows_affected() > 0 => Ok(FoodDeletion::Deleted),
            Ok(_) => Ok(FoodDeletion::NotFound),
            // meal_entries.food_id is ON DELETE RESTRICT
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Ok(FoodDeletion::Referenced)
            }
            Err(e) => Err(anyhow::Error::new(e).context("delete food")),
        }
    }

    async fn reference_count(&self, id: Uuid) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_entries WHERE food_id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .context("count food references")?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rice"), "%rice%");
        assert_eq!(like_pattern("100%_juice"), "%100\\%\\_juice%");
    }

    #[test]
    fn filters_are_appended_in_order() {
        let filter = FoodFilter {
            search: Some("milk".into()),
            category: Some(crate::model::FoodCategory::Drink),
            is_custom: Some(false),
            limit: 10,
            offset: 0,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM foods");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM foods WHERE TRUE AND (name ILIKE $1 OR brand ILIKE $2) \
             AND category = $3 AND is_custom = $4"
        );
    }
}
