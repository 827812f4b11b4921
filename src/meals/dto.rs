use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::meals::repo::Meal;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub filename: String,
    pub food_guess: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<Meal> for MealResponse {
    fn from(m: Meal) -> Self {
        Self {
            filename: m.filename,
            food_guess: m.food_guess,
            calories: m.calories,
            protein_g: m.protein_g,
            carbs_g: m.carbs_g,
            fat_g: m.fat_g,
            timestamp: m.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub food_guess: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}
