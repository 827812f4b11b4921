use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, FromRow)]
pub struct MealMacros {
    pub timestamp: OffsetDateTime,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

pub async fn meals_since(db: &PgPool, since: OffsetDateTime) -> anyhow::Result<Vec<MealMacros>> {
    sqlx::query_as::<_, MealMacros>(
        r#"
        SELECT "timestamp", calories, protein_g, carbs_g, fat_g
        FROM meals
        WHERE "timestamp" >= $1
        "#,
    )
    .bind(since)
    .fetch_all(db)
    .await
    .context("meals since cutoff")
}

/// Distinct UTC calendar dates with at least one meal, for the streak.
pub async fn meal_dates(db: &PgPool) -> anyhow::Result<Vec<Date>> {
    let rows: Vec<(Date,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT ("timestamp" AT TIME ZONE 'UTC')::date AS day
        FROM meals
        "#,
    )
    .fetch_all(db)
    .await
    .context("distinct meal dates")?;
    Ok(rows.into_iter().map(|(d,)| d).collect())
}
