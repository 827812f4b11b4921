use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::{
    format_description::FormatItem, macros::format_description, Date, Duration, OffsetDateTime,
    UtcOffset,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::repo::{self, MealMacros};

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DayBucket {
    pub date: String,
    pub calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub meal_count: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyStats {
    pub days: Vec<DayBucket>,
    pub streak: u32,
}

#[instrument(skip(state))]
pub async fn weekly_stats(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<WeeklyStats>, ApiError> {
    let days = q.days.unwrap_or(7).clamp(1, 90);
    let today = OffsetDateTime::now_utc().date();
    let since = (today - Duration::days(days - 1)).midnight().assume_utc();

    let meals = repo::meals_since(&state.db, since).await?;
    let day_list = bucket_days(&meals, today, days)?;

    let dates: HashSet<Date> = repo::meal_dates(&state.db).await?.into_iter().collect();
    let streak = current_streak(&dates, today);

    Ok(Json(WeeklyStats {
        days: day_list,
        streak,
    }))
}

/// One bucket per calendar day over the trailing window ending `today`,
/// zero-filled for days without meals.
fn bucket_days(meals: &[MealMacros], today: Date, days: i64) -> anyhow::Result<Vec<DayBucket>> {
    let start = today - Duration::days(days - 1);
    let mut buckets = (0..days)
        .map(|i| {
            let date = start + Duration::days(i);
            Ok(DayBucket {
                date: date.format(&DATE_FMT)?,
                calories: 0,
                protein_g: 0.0,
                carbs_g: 0.0,
                fat_g: 0.0,
                meal_count: 0,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for meal in meals {
        let day = meal.timestamp.to_offset(UtcOffset::UTC).date();
        if day < start || day > today {
            continue;
        }
        let bucket = &mut buckets[(day - start).whole_days() as usize];
        bucket.calories += i64::from(meal.calories);
        bucket.protein_g += meal.protein_g;
        bucket.carbs_g += meal.carbs_g;
        bucket.fat_g += meal.fat_g;
        bucket.meal_count += 1;
    }

    Ok(buckets)
}

/// Consecutive logged days ending today; 0 when today has no meal yet.
fn current_streak(dates: &HashSet<Date>, today: Date) -> u32 {
    let mut streak = 0;
    let mut check = today;
    while dates.contains(&check) {
        streak += 1;
        match check.previous_day() {
            Some(prev) => check = prev,
            None => break,
        }
    }
    streak
}
