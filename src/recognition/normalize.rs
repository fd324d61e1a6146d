//! Turns a vision model's free-text reply into candidate foods.
//!
//! The reply is asked to be JSON but often arrives wrapped in prose or a
//! markdown fence. Extraction tries each strategy in [`STRATEGIES`] in order
//! and stops at the first one that yields a value with a usable shape.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::MacroNutrients;

pub const UNKNOWN_FOOD: &str = "unknown food";
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_SERVINGS: f64 = 1.0;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?is)```json\s*(.*?)\s*```").unwrap();
    static ref BRACED: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// One unconfirmed food guess from the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognizedFood {
    pub name: String,
    pub confidence: f64,
    pub estimated_calories: f64,
    pub estimated_macros: MacroNutrients,
    pub suggested_servings: f64,
}

type Strategy = fn(&str) -> Option<Vec<Value>>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("braced", parse_braced),
];

/// Extracts candidates, returning an empty list when nothing matched.
pub fn extract_candidates(raw: &str) -> Vec<RecognizedFood> {
    try_extract(raw).unwrap_or_default()
}

/// Like [`extract_candidates`] but distinguishes "no strategy matched"
/// (`None`) from a well-formed reply listing zero foods.
pub fn try_extract(raw: &str) -> Option<Vec<RecognizedFood>> {
    let (strategy, items) = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(raw).map(|items| (*name, items)))?;
    tracing::debug!(strategy, count = items.len(), "model reply parsed");

    Some(
        items
            .iter()
            .filter_map(RawCandidate::from_value)
            .map(RawCandidate::resolve)
            .collect(),
    )
}

fn parse_direct(raw: &str) -> Option<Vec<Value>> {
    parse_candidates(raw)
}

fn parse_fenced(raw: &str) -> Option<Vec<Value>> {
    let inner = FENCED_JSON.captures(raw)?.get(1)?;
    parse_candidates(inner.as_str())
}

fn parse_braced(raw: &str) -> Option<Vec<Value>> {
    let found = BRACED.find(raw)?;
    parse_candidates(found.as_str())
}

fn parse_candidates(text: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    candidate_list(value)
}

/// Applies the shape rules to a parsed value: a bare array, a `foods` array,
/// a single object with `name`, then the first key (in reply order) holding a
/// non-empty array of objects.
fn candidate_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if map.get("foods").is_some_and(Value::is_array) {
                return match map.remove("foods") {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                };
            }
            if map.contains_key("name") {
                return Some(vec![Value::Object(map)]);
            }
            let list_key = map
                .iter()
                .find(|(_, v)| is_object_list(v))
                .map(|(k, _)| k.clone())?;
            match map.remove(&list_key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_object_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object))
}

/// A candidate as read from the reply. Absent keys, `null` and values of the
/// wrong type are all `None`; [`RawCandidate::resolve`] fills the defaults.
#[derive(Debug, Default, PartialEq)]
struct RawCandidate {
    name: Option<String>,
    confidence: Option<f64>,
    estimated_calories: Option<f64>,
    estimated_macros: Option<RawMacros>,
    suggested_servings: Option<f64>,
}

#[derive(Debug, Default, PartialEq)]
struct RawMacros {
    carbohydrates: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
}

impl RawCandidate {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            name: string_field(map, "name"),
            confidence: number_field(map, "confidence"),
            estimated_calories: number_field(map, "estimated_calories"),
            estimated_macros: map
                .get("estimated_macros")
                .and_then(Value::as_object)
                .map(RawMacros::from_map),
            suggested_servings: number_field(map, "suggested_servings"),
        })
    }

    fn resolve(self) -> RecognizedFood {
        let macros = self.estimated_macros.unwrap_or_default();
        RecognizedFood {
            name: self.name.unwrap_or_else(|| UNKNOWN_FOOD.to_string()),
            confidence: self
                .confidence
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(DEFAULT_CONFIDENCE),
            estimated_calories: non_negative(self.estimated_calories),
            estimated_macros: MacroNutrients {
                carbohydrates: non_negative(macros.carbohydrates),
                protein: non_negative(macros.protein),
                fat: non_negative(macros.fat),
            },
            suggested_servings: self
                .suggested_servings
                .filter(|s| *s > 0.0)
                .unwrap_or(DEFAULT_SERVINGS),
        }
    }
}

impl RawMacros {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            carbohydrates: number_field(map, "carbohydrates"),
            protein: number_field(map, "protein"),
            fat: number_field(map, "fat"),
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers, or strings holding a number. Non-finite values count as missing.
fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn non_negative(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_foods_list_in_order() {
        let raw = r#"{"foods": [
            {"name": "rice", "confidence": 0.95, "estimated_calories": 200,
             "estimated_macros": {"carbohydrates": 45, "protein": 4, "fat": 0.5},
             "suggested_servings": 1.0},
            {"name": "egg", "confidence": 0.8, "estimated_calories": 70}
        ]}"#;
        let foods = extract_candidates(raw);
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0].name, "rice");
        assert_eq!(foods[0].estimated_macros.carbohydrates, 45.0);
        assert_eq!(foods[0].estimated_macros.fat, 0.5);
        assert_eq!(foods[1].name, "egg");
        assert_eq!(foods[1].estimated_calories, 70.0);
    }

    #[test]
    fn single_object_with_name_is_one_candidate() {
        let foods = extract_candidates(r#"{"name": "apple", "estimated_calories": 95}"#);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "apple");
    }

    #[test]
    fn narrative_text_yields_nothing() {
        assert!(extract_candidates("I see a lovely plate of pasta.").is_empty());
        assert!(try_extract("no json here").is_none());
        assert!(extract_candidates("").is_empty());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let foods = extract_candidates(r#"{"foods": [{"estimated_macros": {"protein": 12}}]}"#);
        let f = &foods[0];
        assert_eq!(f.name, UNKNOWN_FOOD);
        assert_eq!(f.confidence, 0.5);
        assert_eq!(f.suggested_servings, 1.0);
        assert_eq!(f.estimated_calories, 0.0);
        assert_eq!(f.estimated_macros.protein, 12.0);
        assert_eq!(f.estimated_macros.carbohydrates, 0.0);
        assert_eq!(f.estimated_macros.fat, 0.0);
    }

    #[test]
    fn null_and_wrong_types_count_as_missing() {
        let raw = r#"{"foods": [{"name": null, "confidence": "high",
            "estimated_macros": [1, 2, 3], "suggested_servings": null}]}"#;
        let f = &extract_candidates(raw)[0];
        assert_eq!(f.name, UNKNOWN_FOOD);
        assert_eq!(f.confidence, 0.5);
        assert_eq!(f.estimated_macros, MacroNutrients::default());
        assert_eq!(f.suggested_servings, 1.0);
    }

    #[test]
    fn one_bad_candidate_does_not_discard_the_rest() {
        let raw = r#"{"foods": ["garbage", {"name": "soup", "estimated_macros": "n/a"}, 42]}"#;
        let foods = extract_candidates(raw);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "soup");
        assert_eq!(foods[0].estimated_macros, MacroNutrients::default());
    }

    #[test]
    fn fenced_block_is_used_when_reply_has_prose() {
        let raw = "Here is the result:\n```json\n{\"foods\": [{\"name\": \"noodles\"}]}\n```\nEnjoy!";
        let foods = extract_candidates(raw);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "noodles");
    }

    #[test]
    fn braced_scan_is_the_last_resort() {
        let raw = "Sure! {\"foods\": [{\"name\": \"tofu\", \"confidence\": 0.7}]} hope that helps";
        let foods = extract_candidates(raw);
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "tofu");
        assert_eq!(foods[0].confidence, 0.7);
    }

    #[test]
    fn object_without_list_or_name_falls_through() {
        // Direct parse succeeds but has no usable shape; nothing else matches.
        assert!(try_extract(r#"{"status": "ok"}"#).is_none());
    }

    #[test]
    fn any_list_valued_key_is_accepted() {
        let foods = extract_candidates(r#"{"items": [{"name": "tea"}]}"#);
        assert_eq!(foods[0].name, "tea");
    }

    #[test]
    fn named_object_keeps_its_own_array_fields() {
        let raw = r#"{"name": "salad", "estimated_calories": 150, "ingredients": ["lettuce", "tomato"]}"#;
        let foods = try_extract(raw).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "salad");
        assert_eq!(foods[0].estimated_calories, 150.0);
    }

    #[test]
    fn list_key_must_hold_objects() {
        let foods = try_extract(r#"{"alternatives": ["x"], "items": [{"name": "tea"}]}"#).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "tea");

        let foods = try_extract(r#"{"items": [{"name": "tea"}], "alternatives": ["x"]}"#).unwrap();
        assert_eq!(foods[0].name, "tea");

        assert!(try_extract(r#"{"tags": ["spicy"], "notes": []}"#).is_none());
    }

    #[test]
    fn list_keys_are_tried_in_reply_order() {
        let raw = r#"{"main": [{"name": "curry"}], "drinks": [{"name": "lassi"}]}"#;
        assert_eq!(extract_candidates(raw)[0].name, "curry");
    }

    #[test]
    fn empty_foods_list_is_a_successful_parse() {
        assert_eq!(try_extract(r#"{"foods": []}"#), Some(vec![]));
    }

    #[test]
    fn numeric_strings_and_clamping() {
        let raw = r#"[{"name": "cake", "confidence": 1.7, "estimated_calories": "350",
            "estimated_macros": {"fat": -3}, "suggested_servings": 0}]"#;
        let f = &extract_candidates(raw)[0];
        assert_eq!(f.confidence, 1.0);
        assert_eq!(f.estimated_calories, 350.0);
        assert_eq!(f.estimated_macros.fat, 0.0);
        assert_eq!(f.suggested_servings, 1.0);
    }
}
