//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! Use `AppJson<T>` / `AppQuery<T>` as drop-in replacements for `axum::Json<T>` and
//! `axum::extract::Query<T>`. Deserialization failures produce a JSON `AppError`
//! instead of axum's default plain-text response.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_HEADER: &str = "x-session-id";

/// JSON extractor that converts deserialization errors to structured `AppError` responses.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Query-string extractor with the same error shape as `AppJson`.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let body_text = rejection.body_text();
                Err(AppError::Validation {
                    field: extract_field_from_serde_message(&body_text)
                        .or_else(|| Some("query".to_string())),
                    message: format!("Invalid query string: {body_text}"),
                    received: None,
                    docs_hint: Some("Check the query parameters in GET /api-doc/openapi.json.".to_string()),
                })
            }
        }
    }
}

/// Session id from the `x-session-id` header. Whether the session still
/// exists is checked by the handler (404).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Validation {
                message: "세션 ID가 필요합니다.".to_string(),
                field: Some(SESSION_HEADER.to_string()),
                received: None,
                docs_hint: Some("POST /v1/sessions 로 세션을 먼저 생성하세요.".to_string()),
            })?;

        Uuid::parse_str(raw)
            .map(SessionId)
            .map_err(|_| AppError::Validation {
                message: "세션 ID 형식이 올바르지 않습니다.".to_string(),
                field: Some(SESSION_HEADER.to_string()),
                received: Some(serde_json::Value::String(raw.to_string())),
                docs_hint: Some("POST /v1/sessions 로 세션을 먼저 생성하세요.".to_string()),
            })
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();

    // "missing field `height_cm`" → field = "height_cm"
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or("body".to_string())),
        received: None,
        docs_hint: Some(
            "Check the request body against the endpoint's schema (GET /api-doc/openapi.json)."
                .to_string(),
        ),
    }
}

/// Try to extract a field name from serde's error messages.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}
