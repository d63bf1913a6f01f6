use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::LookupConfig;

/// FoodFact-shaped data coming back from an external provider. `id` is the
/// provider's identifier (the barcode, for Open Food Facts) when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default = "default_serving_size")]
    pub serving_size: String,
}

fn default_serving_size() -> String {
    "100g".to_string()
}

/// One candidate from image recognition. Candidates without nutrition are
/// kept so the client can show them greyed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedFood {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    pub nutrition: Option<FoodPayload>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

#[async_trait]
pub trait FoodLookup: Send + Sync {
    /// Open Food Facts product lookup; `Ok(None)` when the barcode is unknown.
    async fn barcode(&self, barcode: &str) -> Result<Option<FoodPayload>, LookupError>;
    /// Open Food Facts free-text search, filtered to usable results.
    async fn search(&self, query: &str) -> Result<Vec<FoodPayload>, LookupError>;
    /// Gemini natural-language food parsing ("two eggs and toast").
    async fn ai_search(&self, query: &str) -> Result<Vec<FoodPayload>, LookupError>;
    /// Gemini vision food recognition over a base64-encoded image.
    async fn recognize(
        &self,
        image_b64: &str,
        content_type: &str,
    ) -> Result<Vec<RecognizedFood>, LookupError>;
}

#[derive(Clone)]
pub struct ReqwestFoodLookup {
    http: reqwest::Client,
    config: LookupConfig,
}

impl ReqwestFoodLookup {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn gemini_key(&self) -> Result<&str, LookupError> {
        self.config
            .gemini_api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("GEMINI_API_KEY"))
    }

    async fn gemini_generate(&self, parts: Value) -> Result<String, LookupError> {
        let key = self.gemini_key()?;
        let url = format!(
            "{}/v1beta/models/gemini-pro:generateContent?key={}",
            self.config.gemini_base_url.trim_end_matches('/'),
            key
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "gemini request failed");
            return Err(LookupError::UpstreamStatus(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LookupError::Payload("no text candidate in response".into()))
    }
}

#[async_trait]
impl FoodLookup for ReqwestFoodLookup {
    async fn barcode(&self, barcode: &str) -> Result<Option<FoodPayload>, LookupError> {
        let url = format!(
            "{}/api/v2/product/{}.json",
            self.config.open_food_facts_base_url.trim_end_matches('/'),
            barcode
        );
        let response = self.http.get(&url).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::UpstreamStatus(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        if body["status"].as_i64() == Some(0) || body["product"].is_null() {
            return Ok(None);
        }
        debug!(barcode, "barcode resolved");
        Ok(Some(map_off_product(&body["product"])))
    }

    async fn search(&self, query: &str) -> Result<Vec<FoodPayload>, LookupError> {
        let url = format!(
            "{}/cgi/search.pl",
            self.config.open_food_facts_base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", "20"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(LookupError::UpstreamStatus(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        let products = body["products"].as_array().cloned().unwrap_or_default();
        Ok(filter_search_results(
            products.iter().map(map_off_product).collect(),
        ))
    }

    async fn ai_search(&self, query: &str) -> Result<Vec<FoodPayload>, LookupError> {
        let prompt = format!(
            "You are a nutrition expert. Analyze the following user query and identify the \
             food items. For each item, provide an estimated nutritional breakdown per \
             serving in a structured JSON format. The query is: \"{query}\". Return ONLY a \
             JSON array of objects, where each object has the keys: \"id\", \"name\", \
             \"calories\", \"protein\", \"carbs\", \"fats\", and \"serving_size\". The \
             \"id\" should be a unique string based on the food name. If you cannot \
             determine the nutritional information, omit the item from the array."
        );
        let text = self.gemini_generate(json!([{ "text": prompt }])).await?;
        parse_json_payload(&text)
    }

    async fn recognize(
        &self,
        image_b64: &str,
        content_type: &str,
    ) -> Result<Vec<RecognizedFood>, LookupError> {
        let prompt = "Identify the food items in this photo. Return ONLY a JSON array of \
                      objects with the keys \"name\", \"confidence\" (0 to 1), and \
                      \"nutrition\" (an object with \"calories\", \"protein\", \"carbs\", \
                      \"fats\", \"serving_size\", or null if you cannot estimate it).";
        let parts = json!([
            { "text": prompt },
            { "inline_data": { "mime_type": content_type, "data": image_b64 } }
        ]);
        let text = self.gemini_generate(parts).await?;
        parse_json_payload(&text)
    }
}

/// Map an Open Food Facts product object to our payload shape, defaulting the
/// same way the upstream data is usually incomplete: unknown name, zero
/// nutriments, 100g serving.
fn map_off_product(product: &Value) -> FoodPayload {
    let nutriments = &product["nutriments"];
    let num = |key: &str| nutriments[key].as_f64().unwrap_or(0.0);
    FoodPayload {
        id: product["code"].as_str().map(str::to_string),
        name: product["product_name"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown Food")
            .to_string(),
        calories: num("energy-kcal_100g"),
        protein: num("proteins_100g"),
        carbs: num("carbohydrates_100g"),
        fats: num("fat_100g"),
        serving_size: product["serving_size"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("100g")
            .to_string(),
    }
}

/// Drop search hits with no usable name or calorie figure.
fn filter_search_results(foods: Vec<FoodPayload>) -> Vec<FoodPayload> {
    foods
        .into_iter()
        .filter(|f| f.name != "Unknown Food" && f.calories > 0.0)
        .collect()
}

/// Gemini wraps its JSON in markdown fences more often than not.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_json_payload<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, LookupError> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| LookupError::Payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_off_product_fields() {
        let product = json!({
            "code": "737628064502",
            "product_name": "Rice Noodles",
            "serving_size": "57g",
            "nutriments": {
                "energy-kcal_100g": 385.0,
                "proteins_100g": 7.0,
                "carbohydrates_100g": 80.0,
                "fat_100g": 3.5
            }
        });
        let payload = map_off_product(&product);
        assert_eq!(payload.id.as_deref(), Some("737628064502"));
        assert_eq!(payload.name, "Rice Noodles");
        assert_eq!(payload.calories, 385.0);
        assert_eq!(payload.protein, 7.0);
        assert_eq!(payload.carbs, 80.0);
        assert_eq!(payload.fats, 3.5);
        assert_eq!(payload.serving_size, "57g");
    }

    #[test]
    fn defaults_missing_off_fields() {
        let payload = map_off_product(&json!({}));
        assert_eq!(payload.name, "Unknown Food");
        assert_eq!(payload.calories, 0.0);
        assert_eq!(payload.serving_size, "100g");
        assert!(payload.id.is_none());
    }

    #[test]
    fn search_filter_drops_unusable_hits() {
        let foods = vec![
            FoodPayload {
                id: None,
                name: "Unknown Food".into(),
                calories: 100.0,
                protein: 0.0,
                carbs: 0.0,
                fats: 0.0,
                serving_size: "100g".into(),
            },
            FoodPayload {
                id: None,
                name: "Oats".into(),
                calories: 0.0,
                protein: 13.0,
                carbs: 68.0,
                fats: 7.0,
                serving_size: "100g".into(),
            },
            FoodPayload {
                id: Some("1".into()),
                name: "Oats".into(),
                calories: 389.0,
                protein: 13.0,
                carbs: 68.0,
                fats: 7.0,
                serving_size: "100g".into(),
            },
        ];
        let kept = filter_search_results(foods);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].calories, 389.0);
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [1] "), "[1]");
    }

    #[test]
    fn parses_ai_search_payload() {
        let text = r#"```json
        [
            {"id": "banana", "name": "Banana", "calories": 105, "protein": 1.3,
             "carbs": 27, "fats": 0.4, "serving_size": "1 medium"}
        ]
        ```"#;
        let foods: Vec<FoodPayload> = parse_json_payload(text).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "Banana");
        assert_eq!(foods[0].calories, 105.0);
    }

    #[test]
    fn parses_recognition_payload_with_null_nutrition() {
        let text = r#"[
            {"name": "Grilled Chicken Breast", "confidence": 0.95,
             "nutrition": {"name": "Grilled Chicken Breast", "calories": 165,
                           "protein": 31, "carbs": 0, "fats": 3.6,
                           "serving_size": "100g"}},
            {"name": "A Glass of Water", "confidence": 0.75, "nutrition": null}
        ]"#;
        let items: Vec<RecognizedFood> = parse_json_payload(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].nutrition.as_ref().unwrap().calories, 165.0);
        assert!(items[1].nutrition.is_none());
    }

    #[test]
    fn rejects_non_json_payload() {
        let err = parse_json_payload::<Vec<FoodPayload>>("I could not parse that").unwrap_err();
        assert!(matches!(err, LookupError::Payload(_)));
    }
}
