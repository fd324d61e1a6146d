use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{parse_date, Food, MacroNutrients, MealType};

pub const MAX_ENTRIES: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub meal_type: String,
    /// `YYYY-MM-DD`; today when omitted.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub entries: Vec<MealEntryInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealEntryInput {
    pub food_id: Uuid,
    #[serde(default = "default_servings")]
    pub servings: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_servings() -> f64 {
    1.0
}

/// A meal that passed validation and is ready to persist.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub meal_type: MealType,
    pub date: String,
    pub entries: Vec<MealEntryInput>,
}

impl CreateMealRequest {
    pub fn validate(self, today: String) -> AppResult<NewMeal> {
        let meal_type = self
            .meal_type
            .parse::<MealType>()
            .map_err(|_| AppError::validation("meal_type must be breakfast, lunch, dinner or snack"))?;

        let date = match self.date {
            Some(d) if parse_date(&d).is_none() => {
                return Err(AppError::Validation(format!(
                    "invalid date {d:?}, expected YYYY-MM-DD"
                )))
            }
            Some(d) => d,
            None => today,
        };

        if self.entries.is_empty() {
            return Err(AppError::validation("a meal needs at least one entry"));
        }
        if self.entries.len() > MAX_ENTRIES {
            return Err(AppError::Validation(format!(
                "a meal can have at most {MAX_ENTRIES} entries"
            )));
        }
        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| !(e.servings.is_finite() && e.servings > 0.0))
        {
            return Err(AppError::Validation(format!(
                "servings must be greater than 0 (food {})",
                bad.food_id
            )));
        }

        Ok(NewMeal {
            meal_type,
            date,
            entries: self.entries,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(alias = "date_str")]
    pub date: Option<String>,
}

impl DateQuery {
    /// The requested date, or today.
    pub fn resolve(self, today: String) -> AppResult<String> {
        match self.date.filter(|d| !d.is_empty()) {
            Some(d) if parse_date(&d).is_some() => Ok(d),
            Some(d) => Err(AppError::Validation(format!(
                "invalid date {d:?}, expected YYYY-MM-DD"
            ))),
            None => Ok(today),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealEntryResponse {
    pub id: Uuid,
    pub food_id: Uuid,
    pub servings: f64,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub food: Food,
    /// Derived, rounded to one decimal.
    pub calories: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealResponse {
    pub id: Uuid,
    pub meal_type: MealType,
    pub date: String,
    pub entries: Vec<MealEntryResponse>,
    pub total_calories: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Meals bucketed by type. All four keys are always serialized.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MealsByType {
    pub breakfast: Vec<MealResponse>,
    pub lunch: Vec<MealResponse>,
    pub dinner: Vec<MealResponse>,
    pub snack: Vec<MealResponse>,
}

impl MealsByType {
    pub fn bucket(&self, meal_type: MealType) -> &[MealResponse] {
        match meal_type {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
            MealType::Snack => &self.snack,
        }
    }

    pub fn bucket_mut(&mut self, meal_type: MealType) -> &mut Vec<MealResponse> {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MealResponse> {
        MealType::ALL.into_iter().flat_map(|t| self.bucket(t).iter())
    }
}

#[derive(Debug, Serialize)]
pub struct MealsOfDay {
    pub date: String,
    pub meals: MealsByType,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    pub date: String,
    pub total_calories: f64,
    pub calorie_goal: i32,
    pub calories_remaining: f64,
    pub calories_used_percentage: f64,
    pub macros: MacroNutrients,
    pub meals: MealsByType,
}
