use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{Food, FoodCategory};

pub const MAX_LIMIT: i64 = 200;
pub const DEFAULT_LIMIT: i64 = 100;

/// Full set of caller-editable food fields, used for both create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodInput {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    #[serde(default = "default_serving_unit")]
    pub serving_unit: String,
    pub calories_per_serving: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub category: FoodCategory,
}

fn default_serving_size() -> f64 {
    100.0
}
fn default_serving_unit() -> String {
    "g".into()
}

impl FoodInput {
    pub fn validate(&self) -> AppResult<()> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::validation("name must be 1-100 characters"));
        }
        if self.brand.as_deref().is_some_and(|b| b.chars().count() > 100) {
            return Err(AppError::validation("brand must be at most 100 characters"));
        }
        if self.serving_unit.chars().count() > 20 {
            return Err(AppError::validation(
                "serving_unit must be at most 20 characters",
            ));
        }
        if !(self.serving_size.is_finite() && self.serving_size > 0.0) {
            return Err(AppError::validation("serving_size must be greater than 0"));
        }
        let nutrients = [
            ("calories_per_serving", self.calories_per_serving),
            ("carbohydrates", self.carbohydrates),
            ("protein", self.protein),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
        ];
        for (field, value) in nutrients {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Validation(format!("{field} must be >= 0")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_custom: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated catalog filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodFilter {
    pub search: Option<String>,
    pub category: Option<FoodCategory>,
    pub is_custom: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl TryFrom<SearchParams> for FoodFilter {
    type Error = AppError;

    fn try_from(p: SearchParams) -> Result<Self, Self::Error> {
        let limit = p.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        let offset = p.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::validation("offset must be >= 0"));
        }
        let category = match p.category.as_deref().filter(|c| !c.is_empty()) {
            Some(c) => Some(
                c.parse::<FoodCategory>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            search: p
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            category,
            is_custom: p.is_custom,
            limit,
            offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FoodListItem {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub calories_per_serving: f64,
    pub category: FoodCategory,
    pub is_custom: bool,
}

impl From<Food> for FoodListItem {
    fn from(f: Food) -> Self {
        Self {
            id: f.id,
            name: f.name,
            brand: f.brand,
            image_url: f.image_url,
            calories_per_serving: f.calories_per_serving,
            category: f.category,
            is_custom: f.is_custom,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FoodPage {
    pub foods: Vec<FoodListItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryOption {
    pub value: FoodCategory,
    pub label: &'static str,
}
