use bytes::Bytes;
use rand::Rng;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::{error, info, warn};

use crate::analysis::image;
use crate::analysis::parser::{self, NutritionEstimate};
use crate::error::ApiError;
use crate::meals::repo::{self, NewMeal};
use crate::state::AppState;

pub const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

const TS_FMT: &[FormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

const BASE_PROMPT: &str = "You're a nutritionist. Identify the food in this photo \
and respond ONLY with valid JSON in this format:\n\
{\n\
  \"food_guess\": \"\",\n\
  \"calories\": 0,\n\
  \"protein_g\": 0,\n\
  \"carbs_g\": 0,\n\
  \"fat_g\": 0\n\
}";

pub struct UploadRequest {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub context: Option<String>,
}

/// The upload pipeline: validate, normalize, store the asset, ask the
/// vision model, parse its reply, persist the record.
///
/// Validation happens before any side effect. Once the asset is on disk
/// it stays there on failure (analysis, parse or insert) so a retry or
/// manual recovery does not lose the photo.
pub async fn analyze_and_store(
    state: &AppState,
    upload: UploadRequest,
) -> Result<(NutritionEstimate, String), ApiError> {
    if !ALLOWED_TYPES.contains(&upload.content_type.as_str()) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "unsupported file type '{}'; upload a JPEG, PNG or WebP image",
            upload.content_type
        )));
    }
    let max_bytes = state.config.upload.max_upload_bytes;
    if upload.bytes.len() > max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "file exceeds the {max_bytes} byte limit"
        )));
    }

    // CPU-bound decode/resize runs off the async workers.
    let raw = upload.bytes.clone();
    let max_px = state.config.upload.max_image_px;
    let quality = state.config.upload.jpeg_quality;
    let normalized = tokio::task::spawn_blocking(move || image::normalize(&raw, max_px, quality))
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?
        .map_err(|e| {
            warn!(error = %e, "upload failed to decode");
            ApiError::BadRequest("unsupported or corrupt image".into())
        })?;

    let filename = asset_filename(OffsetDateTime::now_utc(), &upload.original_name)?;
    let size = normalized.byte_len();
    let body = Bytes::from(normalized.bytes);
    state.storage.put(&filename, body.clone()).await?;
    info!(
        %filename,
        bytes = size,
        width = normalized.width,
        height = normalized.height,
        "stored normalized upload"
    );

    let context = upload
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let prompt = build_prompt(context);

    let reply = state
        .analysis
        .analyze_image(body, &prompt)
        .await
        .inspect_err(|e| {
            warn!(%filename, error = %e, stage = "analysis", "analysis failed; asset retained");
        })?;

    let estimate = parser::parse_estimate(&reply).inspect_err(|e| {
        warn!(%filename, error = %e, stage = "parse", "unparseable analysis reply; asset retained");
    })?;

    let new = NewMeal {
        filename: &filename,
        food_guess: &estimate.food_guess,
        calories: estimate.calories,
        protein_g: estimate.protein_g,
        carbs_g: estimate.carbs_g,
        fat_g: estimate.fat_g,
        was_refined: context.is_some(),
        refinement_context: context,
    };
    if let Err(e) = repo::insert(&state.db, &new).await {
        error!(%filename, error = %e, stage = "persist", "meal insert failed; orphaned asset retained");
        return Err(ApiError::Internal(e));
    }

    Ok((estimate, filename))
}

fn build_prompt(context: Option<&str>) -> String {
    match context {
        Some(c) => format!("{BASE_PROMPT}\n\nAdditional context from the user: \"{c}\""),
        None => BASE_PROMPT.to_string(),
    }
}

/// `{UTC second timestamp}_{6 hex digits}_{sanitized original name}`.
/// The entropy suffix keeps concurrent uploads within the same second
/// from colliding.
fn asset_filename(now: OffsetDateTime, original_name: &str) -> anyhow::Result<String> {
    let ts = now.format(&TS_FMT)?;
    let entropy: u32 = rand::thread_rng().gen_range(0..=0x00FF_FFFF);
    Ok(format!(
        "{ts}_{entropy:06x}_{}",
        sanitize_original_name(original_name)
    ))
}

fn sanitize_original_name(name: &str) -> String {
    // keep only the last path component, then the filename-safe charset
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "upload.jpg".to_string()
    } else {
        trimmed.to_string()
    }
}
