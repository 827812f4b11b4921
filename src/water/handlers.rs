use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::repo;

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
pub struct WaterQuery {
    pub day: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaterUpdate {
    pub amount_ml: i32,
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    pub date: String,
    pub amount_ml: i32,
}

pub(crate) fn parse_day(day: &str) -> Result<Date, ApiError> {
    Date::parse(day, &DATE_FMT)
        .map_err(|_| ApiError::BadRequest(format!("invalid date '{day}', expected YYYY-MM-DD")))
}

pub(crate) fn fmt_day(date: Date) -> anyhow::Result<String> {
    Ok(date.format(&DATE_FMT)?)
}

#[instrument(skip(state))]
pub async fn get_water(
    State(state): State<AppState>,
    Query(q): Query<WaterQuery>,
) -> Result<Json<WaterResponse>, ApiError> {
    let date = match q.day.as_deref() {
        Some(day) => parse_day(day)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let amount_ml = repo::get_for_date(&state.db, date).await?.unwrap_or(0);
    Ok(Json(WaterResponse {
        date: fmt_day(date)?,
        amount_ml,
    }))
}

#[instrument(skip(state))]
pub async fn set_water(
    State(state): State<AppState>,
    Json(body): Json<WaterUpdate>,
) -> Result<Json<WaterResponse>, ApiError> {
    if body.amount_ml < 0 {
        return Err(ApiError::BadRequest("amount_ml must be >= 0".into()));
    }
    let today = OffsetDateTime::now_utc().date();
    let amount_ml = repo::upsert_for_date(&state.db, today, body.amount_ml).await?;
    Ok(Json(WaterResponse {
        date: fmt_day(today)?,
        amount_ml,
    }))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn day_parse_and_format_roundtrip() {
        let d = parse_day("2025-06-01").unwrap();
        assert_eq!(d, date!(2025 - 06 - 01));
        assert_eq!(fmt_day(d).unwrap(), "2025-06-01");
    }

    #[test]
    fn bad_day_strings_are_rejected() {
        assert!(parse_day("2025-13-01").is_err());
        assert!(parse_day("yesterday").is_err());
        assert!(parse_day("2025/06/01").is_err());
    }
}
