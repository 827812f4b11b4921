use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::ApiError;

const OFF_URL: &str = "https://world.openfoodfacts.org/api/v0/product";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_valid_code(code: &str) -> bool {
    (8..=14).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

/// Open Food Facts reports nutriments per 100 g. The API mixes numbers
/// and numeric strings, so the raw fields stay as `Value` until coerced.
#[derive(Debug, Deserialize)]
pub struct OffResponse {
    #[serde(default)]
    pub status: i64,
    pub product: Option<OffProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OffProduct {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub serving_quantity: Option<Value>,
    #[serde(default)]
    pub nutriments: Nutriments,
}

#[derive(Debug, Default, Deserialize)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<Value>,
    #[serde(rename = "energy-kcal")]
    pub energy_kcal: Option<Value>,
    pub proteins_100g: Option<Value>,
    pub proteins: Option<Value>,
    pub carbohydrates_100g: Option<Value>,
    pub carbohydrates: Option<Value>,
    pub fat_100g: Option<Value>,
    pub fat: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarcodeNutrition {
    pub food_name: String,
    pub brand: String,
    pub serving_g: f64,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub barcode: String,
}

fn as_f64(v: &Option<Value>) -> Option<f64> {
    match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Scale per-100g nutriments to one serving; grams keep one decimal,
/// calories round to the nearest integer.
pub(crate) fn scale_product(product: &OffProduct, barcode: &str) -> BarcodeNutrition {
    let serving_g = as_f64(&product.serving_quantity)
        .filter(|v| *v > 0.0)
        .unwrap_or(100.0);
    let scale = serving_g / 100.0;
    let n = &product.nutriments;
    let per_serving = |per_100g: &Option<Value>, plain: &Option<Value>| {
        round1(as_f64(per_100g).or_else(|| as_f64(plain)).unwrap_or(0.0) * scale)
    };

    BarcodeNutrition {
        food_name: product
            .product_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unknown".into()),
        brand: product.brands.clone().unwrap_or_default(),
        serving_g,
        calories: (as_f64(&n.energy_kcal_100g)
            .or_else(|| as_f64(&n.energy_kcal))
            .unwrap_or(0.0)
            * scale)
            .round() as i32,
        protein_g: per_serving(&n.proteins_100g, &n.proteins),
        carbs_g: per_serving(&n.carbohydrates_100g, &n.carbohydrates),
        fat_g: per_serving(&n.fat_100g, &n.fat),
        barcode: barcode.to_string(),
    }
}

#[derive(Clone)]
pub struct OffClient {
    client: Client,
}

impl OffClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().timeout(LOOKUP_TIMEOUT).build()?;
        Ok(Self { client })
    }

    pub async fn lookup(&self, barcode: &str) -> Result<BarcodeNutrition, ApiError> {
        let url = format!("{OFF_URL}/{barcode}.json");
        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = %e, %barcode, "product database unreachable");
            ApiError::UpstreamUnavailable("product database unavailable".into())
        })?;

        if !response.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "product database returned {}",
                response.status()
            )));
        }

        let body: OffResponse = response.json().await.map_err(|e| {
            ApiError::UpstreamMalformed(format!("undecodable product reply: {e}"))
        })?;
        if body.status != 1 {
            return Err(ApiError::NotFound(format!(
                "no product found for barcode {barcode}"
            )));
        }
        let product = body
            .product
            .ok_or_else(|| ApiError::UpstreamMalformed("product payload missing".into()))?;

        Ok(scale_product(&product, barcode))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(v: Value) -> OffProduct {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn code_shape_validation() {
        assert!(is_valid_code("12345678"));
        assert!(is_valid_code("12345678901234"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("123456789012345"));
        assert!(!is_valid_code("1234567a"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn nutriments_scale_by_serving_size() {
        let p = product(json!({
            "product_name": "Oat bar",
            "brands": "Acme",
            "serving_quantity": 50,
            "nutriments": {
                "energy-kcal_100g": 400,
                "proteins_100g": 10,
                "carbohydrates_100g": 60.4,
                "fat_100g": 12.26
            }
        }));
        let out = scale_product(&p, "12345678");
        assert_eq!(out.serving_g, 50.0);
        assert_eq!(out.calories, 200);
        assert_eq!(out.protein_g, 5.0);
        assert_eq!(out.carbs_g, 30.2);
        assert_eq!(out.fat_g, 6.1);
        assert_eq!(out.barcode, "12345678");
    }

    #[test]
    fn string_serving_quantity_is_coerced() {
        let p = product(json!({
            "serving_quantity": "25",
            "nutriments": { "proteins_100g": "8" }
        }));
        let out = scale_product(&p, "87654321");
        assert_eq!(out.serving_g, 25.0);
        assert_eq!(out.protein_g, 2.0);
        assert_eq!(out.food_name, "Unknown");
    }

    #[test]
    fn missing_serving_defaults_to_100g() {
        let p = product(json!({
            "nutriments": { "energy-kcal_100g": 95, "fat": 1.5 }
        }));
        let out = scale_product(&p, "11112222");
        assert_eq!(out.serving_g, 100.0);
        assert_eq!(out.calories, 95);
        // falls back to the unsuffixed key
        assert_eq!(out.fat_g, 1.5);
    }

    #[test]
    fn missing_nutriments_become_zero() {
        let out = scale_product(&OffProduct::default(), "99998888");
        assert_eq!(out.calories, 0);
        assert_eq!(out.protein_g, 0.0);
        assert_eq!(out.carbs_g, 0.0);
        assert_eq!(out.fat_g, 0.0);
    }

    #[test]
    fn not_found_status_decodes() {
        let body: OffResponse =
            serde_json::from_str(r#"{"status":0,"status_verbose":"product not found"}"#).unwrap();
        assert_eq!(body.status, 0);
        assert!(body.product.is_none());
    }
}
