use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::repo::{self, Favourite};

#[derive(Debug, Deserialize)]
pub struct FavouriteCreate {
    pub food_name: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Serialize)]
pub struct FavouriteResponse {
    pub id: i64,
    pub food_name: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

impl From<Favourite> for FavouriteResponse {
    fn from(f: Favourite) -> Self {
        Self {
            id: f.id,
            food_name: f.food_name,
            calories: f.calories,
            protein_g: f.protein_g,
            carbs_g: f.carbs_g,
            fat_g: f.fat_g,
        }
    }
}

#[instrument(skip(state))]
pub async fn list_favourites(
    State(state): State<AppState>,
) -> Result<Json<Vec<FavouriteResponse>>, ApiError> {
    let favs = repo::list(&state.db).await?;
    Ok(Json(favs.into_iter().map(FavouriteResponse::from).collect()))
}

#[instrument(skip(state, body))]
pub async fn create_favourite(
    State(state): State<AppState>,
    Json(body): Json<FavouriteCreate>,
) -> Result<Json<FavouriteResponse>, ApiError> {
    let food_name = body.food_name.trim();
    if food_name.is_empty() {
        return Err(ApiError::BadRequest("food_name must not be empty".into()));
    }
    let fav = repo::insert(
        &state.db,
        food_name,
        body.calories,
        body.protein_g,
        body.carbs_g,
        body.fat_g,
    )
    .await?;
    Ok(Json(fav.into()))
}

#[instrument(skip(state))]
pub async fn delete_favourite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("no favourite with id {id}")));
    }
    Ok(Json(DeleteResponse {
        message: "Deleted".into(),
    }))
}
