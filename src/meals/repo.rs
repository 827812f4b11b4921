use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: i64,
    pub filename: String,
    pub food_guess: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub was_refined: bool,
    pub refinement_context: Option<String>,
}

pub struct NewMeal<'a> {
    pub filename: &'a str,
    pub food_guess: &'a str,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub was_refined: bool,
    pub refinement_context: Option<&'a str>,
}

pub async fn insert(db: &PgPool, new: &NewMeal<'_>) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        r#"
        INSERT INTO meals (filename, food_guess, calories, protein_g, carbs_g, fat_g,
                           was_refined, refinement_context)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, filename, food_guess, calories, protein_g, carbs_g, fat_g,
                  "timestamp", was_refined, refinement_context
        "#,
    )
    .bind(new.filename)
    .bind(new.food_guess)
    .bind(new.calories)
    .bind(new.protein_g)
    .bind(new.carbs_g)
    .bind(new.fat_g)
    .bind(new.was_refined)
    .bind(new.refinement_context)
    .fetch_one(db)
    .await
    .context("insert meal")?;
    Ok(meal)
}

/// Newest first. The reverse-chronological feed is a hard contract.
pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, filename, food_guess, calories, protein_g, carbs_g, fat_g,
               "timestamp", was_refined, refinement_context
        FROM meals
        ORDER BY "timestamp" DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list meals")?;
    Ok(rows)
}

/// Returns `false` when no row matched.
pub async fn delete_by_filename(db: &PgPool, filename: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM meals
        WHERE filename = $1
        "#,
    )
    .bind(filename)
    .execute(db)
    .await
    .context("delete meal by filename")?;
    Ok(result.rows_affected() > 0)
}
