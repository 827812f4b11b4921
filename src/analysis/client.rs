use std::time::Duration;

use axum::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::AnalysisConfig;
use crate::error::ApiError;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.2;

/// External vision-model boundary. Exactly one outbound call per upload;
/// the raw reply text is handed to the parser untouched.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze_image(&self, image_jpeg: Bytes, prompt: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiVision {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiVision {
    pub fn new(config: &AnalysisConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AnalysisClient for OpenAiVision {
    async fn analyze_image(&self, image_jpeg: Bytes, prompt: &str) -> Result<String, ApiError> {
        let encoded = general_purpose::STANDARD.encode(&image_jpeg);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{encoded}"),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "vision API request failed");
                if e.is_timeout() {
                    ApiError::UpstreamUnavailable("vision API timed out".into())
                } else {
                    ApiError::UpstreamUnavailable(format!("vision API unreachable: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "vision API returned error status");
            return Err(ApiError::UpstreamUnavailable(format!(
                "vision API returned {status}"
            )));
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "vision API reply did not decode");
            ApiError::UpstreamMalformed(format!("undecodable vision API reply: {e}"))
        })?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ApiError::UpstreamMalformed("vision API reply was empty".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: "what is this" },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/jpeg;base64,AAAA".into(),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(body["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn reply_content_extracts() {
        let raw = r#"{"choices":[{"message":{"content":"{\"food_guess\":\"apple\"}"}}]}"#;
        let reply: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            reply.choices[0].message.content.as_deref(),
            Some("{\"food_guess\":\"apple\"}")
        );
    }
}
