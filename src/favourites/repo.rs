use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favourite {
    pub id: i64,
    pub food_name: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    food_name: &str,
    calories: i32,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
) -> anyhow::Result<Favourite> {
    let fav = sqlx::query_as::<_, Favourite>(
        r#"
        INSERT INTO favourites (food_name, calories, protein_g, carbs_g, fat_g)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, food_name, calories, protein_g, carbs_g, fat_g, created_at
        "#,
    )
    .bind(food_name)
    .bind(calories)
    .bind(protein_g)
    .bind(carbs_g)
    .bind(fat_g)
    .fetch_one(db)
    .await
    .context("insert favourite")?;
    Ok(fav)
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Favourite>> {
    let rows = sqlx::query_as::<_, Favourite>(
        r#"
        SELECT id, food_name, calories, protein_g, carbs_g, fat_g, created_at
        FROM favourites
        ORDER BY food_name
        "#,
    )
    .fetch_all(db)
    .await
    .context("list favourites")?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM favourites
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await
    .context("delete favourite")?;
    Ok(result.rows_affected() > 0)
}
