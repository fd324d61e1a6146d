use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

/// Food category. Stored as lowercase text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Main,
    Side,
    Drink,
    Snack,
    Fruit,
    Vegetable,
    #[default]
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 7] = [
        FoodCategory::Main,
        FoodCategory::Side,
        FoodCategory::Drink,
        FoodCategory::Snack,
        FoodCategory::Fruit,
        FoodCategory::Vegetable,
        FoodCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FoodCategory::Main => "main",
            FoodCategory::Side => "side",
            FoodCategory::Drink => "drink",
            FoodCategory::Snack => "snack",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Vegetable => "vegetable",
            FoodCategory::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FoodCategory::Main => "Main dish",
            FoodCategory::Side => "Side dish",
            FoodCategory::Drink => "Drink",
            FoodCategory::Snack => "Snack",
            FoodCategory::Fruit => "Fruit",
            FoodCategory::Vegetable => "Vegetable",
            FoodCategory::Other => "Other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FoodCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown food category: {s}"))
    }
}

/// Meal type. Every day has exactly these four buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown meal type: {s}"))
    }
}

/// A reusable nutrition record. All nutrient values are per serving.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Food {
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
    pub category: FoodCategory,
    pub is_custom: bool,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A loaded meal aggregate: the meal row plus its entries in creation order.
#[derive(Debug, Clone)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String,
    pub meal_type: MealType,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub entries: Vec<MealEntry>,
}

/// One food consumed within a meal.
///
/// `food` is the resolved catalog row; it is `None` when the reference is
/// dangling, in which case aggregation skips the entry.
#[derive(Debug, Clone)]
pub struct MealEntry {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_id: Uuid,
    pub servings: f64,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub food: Option<Food>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroNutrients {
    pub carbohydrates: f64,
    pub protein: f64,
    pub fat: f64,
}

/// Rounds to one decimal place. Half-way cases round away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<Date> {
    if s.len() != 10 {
        return None;
    }
    Date::parse(s, format_description!("[year]-[month]-[day]")).ok()
}

/// Today's date (UTC) as `YYYY-MM-DD`.
pub fn today() -> String {
    let d = OffsetDateTime::now_utc().date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}
