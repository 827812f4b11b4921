use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::client::{is_valid_code, BarcodeNutrition};

#[instrument(skip(state))]
pub async fn lookup_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<BarcodeNutrition>, ApiError> {
    if !is_valid_code(&code) {
        return Err(ApiError::BadRequest(
            "invalid barcode; expected 8-14 digits".into(),
        ));
    }
    let nutrition = state.barcode.lookup(&code).await?;
    Ok(Json(nutrition))
}
