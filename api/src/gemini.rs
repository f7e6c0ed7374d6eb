//! Minimal client for Gemini `generateContent`, used for meal plans (text)
//! and the photo analyzer (text + inline image).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("AI 서비스에 연결할 수 없습니다: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI 서비스 오류 ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("AI 응답을 해석할 수 없습니다: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("AI가 요청을 거부했습니다: {0}")]
    Blocked(String),
    #[error("AI 응답이 비어 있습니다.")]
    EmptyResponse,
}

impl From<GeminiError> for AppError {
    fn from(err: GeminiError) -> Self {
        AppError::ExternalService {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploaded image handed to the model as inline base64 data.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &GeminiConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate(vec![Part::Text { text: prompt }]).await
    }

    pub async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, GeminiError> {
        self.generate(vec![
            Part::Text { text: prompt },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: STANDARD.encode(&image.bytes),
                },
            },
        ])
        .await
    }

    async fn generate(&self, parts: Vec<Part<'_>>) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: [Content { parts }],
        };

        tracing::debug!(model = %self.model, "Sending generateContent request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                model = %self.model,
                status = %status,
                "Gemini request returned non-success status"
            );
            return Err(api_error(status.as_u16(), &body));
        }

        extract_text(&body)
    }
}

fn api_error(status: u16, body: &str) -> GeminiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    GeminiError::Api { status, message }
}

/// Concatenated text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, GeminiError> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(GeminiError::Blocked(reason));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GeminiError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;

    /// Serve a fixed `generateContent` response on a local port and return a
    /// config pointing at it.
    pub(crate) async fn fake_gemini(status: StatusCode, body: serde_json::Value) -> GeminiConfig {
        let app = Router::new().route(
            "/v1beta/models/{*rest}",
            post(move |headers: HeaderMap| {
                let body = body.clone();
                async move {
                    if headers.get("x-goog-api-key").is_none() {
                        return (StatusCode::UNAUTHORIZED, axum::Json(serde_json::json!({})));
                    }
                    (status, axum::Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind fake gemini");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake gemini server");
        });

        GeminiConfig {
            api_key: Some("test-key".to_string()),
            model: "gemini-test".to_string(),
            api_base: format!("http://{addr}"),
        }
    }

    pub(crate) fn text_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    }

    #[test]
    fn request_body_uses_inline_data() {
        let request = GenerateRequest {
            contents: [Content {
                parts: vec![
                    Part::Text { text: "분석" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: STANDARD.encode([1u8, 2, 3]),
                        },
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "분석");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
    }

    #[test]
    fn text_parts_are_concatenated() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"안녕"},{"text":"하세요"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "안녕하세요");
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(extract_text(body), Err(GeminiError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        assert!(matches!(extract_text("{}"), Err(GeminiError::EmptyResponse)));
        let blank = r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#;
        assert!(matches!(extract_text(blank), Err(GeminiError::EmptyResponse)));
    }

    #[test]
    fn api_error_message_is_taken_from_envelope() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match api_error(400, body) {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            api_error(502, "bad gateway"),
            GeminiError::Api { message, .. } if message == "bad gateway"
        ));
    }

    #[test]
    fn missing_key_means_no_client() {
        let config = GeminiConfig {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://example.invalid/".to_string(),
        };
        assert!(GeminiClient::from_config(&config).is_none());

        let config = GeminiConfig {
            api_key: Some("k".to_string()),
            ..config
        };
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!format!("{client:?}").contains("\"k\""));
    }

    #[tokio::test]
    async fn round_trip_against_local_server() {
        let config = fake_gemini(StatusCode::OK, text_reply("식단입니다")).await;
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(client.generate_text("prompt").await.unwrap(), "식단입니다");

        let image = ImageInput {
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        };
        assert_eq!(
            client.generate_with_image("prompt", &image).await.unwrap(),
            "식단입니다"
        );
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let config = fake_gemini(
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({"error": {"message": "quota exceeded"}}),
        )
        .await;
        let client = GeminiClient::from_config(&config).unwrap();
        let err = client.generate_text("prompt").await.unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 429, .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
