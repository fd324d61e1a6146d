//! Calorie and macro rollups over loaded meals.
//!
//! Calorie figures are rounded to one decimal at every level: each entry,
//! each meal total (a sum of rounded entries) and the day total (a sum of
//! rounded meal totals). Macros are summed at full precision.

use tracing::debug;

use super::dto::{DailySummary, MealEntryResponse, MealResponse, MealsByType};
use crate::model::{round1, MacroNutrients, Meal};

/// Builds the response for one meal. Entries whose food is missing are
/// dropped and contribute nothing.
pub fn meal_response(meal: &Meal) -> MealResponse {
    let entries: Vec<MealEntryResponse> = meal
        .entries
        .iter()
        .filter_map(|entry| {
            let Some(food) = &entry.food else {
                debug!(entry_id = %entry.id, food_id = %entry.food_id, "skipping entry with missing food");
                return None;
            };
            Some(MealEntryResponse {
                id: entry.id,
                food_id: entry.food_id,
                servings: entry.servings,
                notes: entry.notes.clone(),
                image_url: entry.image_url.clone(),
                food: food.clone(),
                calories: round1(food.calories_per_serving * entry.servings),
                created_at: entry.created_at,
            })
        })
        .collect();

    let total_calories = round1(entries.iter().map(|e| e.calories).sum());

    MealResponse {
        id: meal.id,
        meal_type: meal.meal_type,
        date: meal.date.clone(),
        entries,
        total_calories,
        created_at: meal.created_at,
    }
}

/// Buckets meals into the four fixed types, keeping input order.
pub fn group_by_type(meals: &[Meal]) -> MealsByType {
    let mut grouped = MealsByType::default();
    for meal in meals {
        grouped.bucket_mut(meal.meal_type).push(meal_response(meal));
    }
    grouped
}

pub fn summarize(date: &str, meals: MealsByType, calorie_goal: i32) -> DailySummary {
    let mut total_calories = 0.0;
    let mut macros = MacroNutrients::default();

    for meal in meals.iter() {
        total_calories += meal.total_calories;
        for entry in &meal.entries {
            macros.carbohydrates += entry.food.carbohydrates * entry.servings;
            macros.protein += entry.food.protein * entry.servings;
            macros.fat += entry.food.fat * entry.servings;
        }
    }

    let goal = f64::from(calorie_goal);
    let calories_remaining = (goal - total_calories).max(0.0);
    let calories_used_percentage = if calorie_goal > 0 {
        total_calories / goal * 100.0
    } else {
        0.0
    };

    DailySummary {
        date: date.to_string(),
        total_calories: round1(total_calories),
        calorie_goal,
        calories_remaining: round1(calories_remaining),
        calories_used_percentage: round1(calories_used_percentage),
        macros,
        meals,
    }
}
