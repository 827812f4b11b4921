use anyhow::Context;
use sqlx::PgPool;
use time::Date;

pub async fn get_for_date(db: &PgPool, date: Date) -> anyhow::Result<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT amount_ml
        FROM water_log
        WHERE "date" = $1
        "#,
    )
    .bind(date)
    .fetch_optional(db)
    .await
    .context("get water log")?;
    Ok(row.map(|(ml,)| ml))
}

/// At most one row per calendar date: a second write for the same date
/// overwrites the amount in a single atomic statement.
pub async fn upsert_for_date(db: &PgPool, date: Date, amount_ml: i32) -> anyhow::Result<i32> {
    let (ml,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO water_log ("date", amount_ml)
        VALUES ($1, $2)
        ON CONFLICT ("date") DO UPDATE SET amount_ml = EXCLUDED.amount_ml
        RETURNING amount_ml
        "#,
    )
    .bind(date)
    .bind(amount_ml)
    .fetch_one(db)
    .await
    .context("upsert water log")?;
    Ok(ml)
}
