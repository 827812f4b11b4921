use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::is_safe_filename;

use super::dto::{DeleteResponse, MealResponse, Pagination, UploadResponse};
use super::repo;
use super::services::{self, UploadRequest};

// generous enough for the configured image ceiling plus multipart framing
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/", get(list_meals))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_meal))
        .route("/meals/:filename", delete(delete_meal))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MealResponse>>, ApiError> {
    let limit = p.limit.clamp(1, 200);
    let offset = p.offset.max(0);
    let meals = repo::list(&state.db, limit, offset).await?;
    Ok(Json(meals.into_iter().map(MealResponse::from).collect()))
}

/// POST /upload/ (multipart): `file` is the image, `context` optional
/// free text used to refine the estimate.
#[instrument(skip(state, multipart))]
pub async fn upload_meal(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut context: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {e}")))?;
                file = Some((original_name, content_type, bytes));
            }
            Some("context") => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read context field: {e}"))
                })?;
                context = Some(text);
            }
            _ => {}
        }
    }

    let (original_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("multipart field 'file' is required".into()))?;

    let (estimate, filename) = services::analyze_and_store(
        &state,
        UploadRequest {
            original_name,
            content_type,
            bytes,
            context,
        },
    )
    .await?;

    Ok(Json(UploadResponse {
        food_guess: estimate.food_guess,
        calories: estimate.calories,
        protein_g: estimate.protein_g,
        carbs_g: estimate.carbs_g,
        fat_g: estimate.fat_g,
        filename,
    }))
}

/// DELETE /upload/meals/{filename}: the DB row goes first; the asset
/// delete is best effort and never fails the request.
#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !is_safe_filename(&filename) {
        return Err(ApiError::NotFound(format!(
            "no meal recorded for '{filename}'"
        )));
    }

    let deleted = repo::delete_by_filename(&state.db, &filename).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "no meal recorded for '{filename}'"
        )));
    }

    match state.storage.delete(&filename).await {
        Ok(true) => info!(%filename, "deleted meal asset"),
        Ok(false) => warn!(%filename, "asset already missing on disk"),
        Err(e) => warn!(%filename, error = %e, "asset delete failed; record removed anyway"),
    }

    Ok(Json(DeleteResponse {
        message: format!("{filename} deleted successfully"),
    }))
}
