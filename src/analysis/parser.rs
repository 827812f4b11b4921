use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Structured nutrition estimate decoded from the model's reply. Numeric
/// fields default to zero so a partial reply still produces a record; a
/// missing food label makes the whole reply useless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub food_guess: String,
    #[serde(default)]
    pub calories: i32,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

/// Remove leading/trailing ```-fences (with or without a language tag)
/// that vision models like to wrap JSON in. Idempotent.
pub fn strip_code_fences(text: &str) -> String {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"^```[a-zA-Z0-9]*\s*|\s*```$").unwrap();
    }
    FENCE_RE.replace_all(text.trim(), "").trim().to_string()
}

pub fn parse_estimate(raw: &str) -> Result<NutritionEstimate, ApiError> {
    let cleaned = strip_code_fences(raw);
    let estimate: NutritionEstimate = serde_json::from_str(&cleaned)
        .map_err(|e| ApiError::UpstreamMalformed(format!("invalid JSON from model: {e}")))?;
    if estimate.food_guess.trim().is_empty() {
        return Err(ApiError::UpstreamMalformed(
            "model reply is missing a food label".into(),
        ));
    }
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn stripping_is_idempotent() {
        let raw = "```json\n{\"food_guess\":\"apple\"}\n```";
        let once = strip_code_fences(raw);
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn parses_fenced_estimate_exactly() {
        let raw = "```json\n{\"food_guess\":\"apple\",\"calories\":95,\"protein_g\":0.5,\"carbs_g\":25,\"fat_g\":0.3}\n```";
        let est = parse_estimate(raw).unwrap();
        assert_eq!(est.food_guess, "apple");
        assert_eq!(est.calories, 95);
        assert_eq!(est.protein_g, 0.5);
        assert_eq!(est.carbs_g, 25.0);
        assert_eq!(est.fat_g, 0.3);
    }

    #[test]
    fn missing_numeric_fields_default_to_zero() {
        let est = parse_estimate("{\"food_guess\":\"toast\"}").unwrap();
        assert_eq!(est.calories, 0);
        assert_eq!(est.protein_g, 0.0);
        assert_eq!(est.carbs_g, 0.0);
        assert_eq!(est.fat_g, 0.0);
    }

    #[test]
    fn missing_food_guess_is_malformed() {
        let err = parse_estimate("{\"calories\":100}").unwrap_err();
        assert!(matches!(err, ApiError::UpstreamMalformed(_)));
    }

    #[test]
    fn blank_food_guess_is_malformed() {
        let err = parse_estimate("{\"food_guess\":\"  \",\"calories\":100}").unwrap_err();
        assert!(matches!(err, ApiError::UpstreamMalformed(_)));
    }

    #[test]
    fn non_json_reply_is_malformed() {
        let err = parse_estimate("I think this is a sandwich.").unwrap_err();
        assert!(matches!(err, ApiError::UpstreamMalformed(_)));
    }
}
