// ABOUTME: Meal-service rows and dish-line normalization.
// ABOUTME: Splits DDISH_NM on <br/> and pulls the numeric allergen markers off each dish.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::NeisError;

/// Allergen markers are appended to dish names as `(1)`, `(2)`... up to 19.
static ALLERGEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{1,2})\)").unwrap());

/// One dish on a day's menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    /// Display name with allergen markers stripped.
    pub name: String,
    /// Allergen numbers (1-19) found on the line, in order of appearance.
    pub allergens: Vec<u8>,
}

/// One day's meal service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDay {
    pub date: NaiveDate,
    /// Meal name as reported (조식/중식/석식).
    pub meal_name: String,
    pub dishes: Vec<Dish>,
}

impl MealDay {
    /// Maps one `mealServiceDietInfo` row.
    pub(crate) fn from_row(row: &serde_json::Value) -> Result<Self, NeisError> {
        let date_raw = str_field(row, "MLSV_YMD")?;
        let date = NaiveDate::parse_from_str(&date_raw, "%Y%m%d")
            .map_err(|e| NeisError::envelope(format!("bad MLSV_YMD {}: {}", date_raw, e)))?;

        let meal_name = str_field(row, "MMEAL_SC_NM").unwrap_or_default();
        let dishes = parse_dish_lines(&str_field(row, "DDISH_NM")?);

        Ok(MealDay {
            date,
            meal_name,
            dishes,
        })
    }
}

/// Splits a raw `DDISH_NM` blob into dishes.
///
/// Lines are `<br/>`-separated; each line may end in allergen markers
/// which move into `allergens` and disappear from the display name.
pub fn parse_dish_lines(raw: &str) -> Vec<Dish> {
    raw.split("<br/>")
        .map(parse_dish_line)
        .filter(|d| !d.name.is_empty())
        .collect()
}

fn parse_dish_line(line: &str) -> Dish {
    let mut allergens = Vec::new();
    for caps in ALLERGEN_RE.captures_iter(line) {
        if let Ok(n) = caps[1].parse::<u8>() {
            if (1..=19).contains(&n) && !allergens.contains(&n) {
                allergens.push(n);
            }
        }
    }

    // Only genuine markers are stripped; other parenthesized numbers are
    // part of the dish name and stay put.
    let name = ALLERGEN_RE.replace_all(line, |caps: &regex::Captures| {
        match caps[1].parse::<u8>() {
            Ok(n) if (1..=19).contains(&n) => String::new(),
            _ => caps[0].to_string(),
        }
    });
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");

    Dish { name, allergens }
}

fn str_field(row: &serde_json::Value, key: &str) -> Result<String, NeisError> {
    row.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| NeisError::envelope(format!("row missing {}", key)))
}
