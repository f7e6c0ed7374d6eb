use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use matchum_core::bmi::ProfileError;
use matchum_core::error::{self, ApiError};
use matchum_core::intake::IntakeError;
use matchum_core::meal_plan::MealPlanError;
use matchum_core::nutrition::LookupError;
use matchum_core::session::SelectionError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Unknown food, session or route parameter (404)
    NotFound {
        message: String,
        received: Option<serde_json::Value>,
    },
    /// Another view has to run first, e.g. BMI before meal plan (409)
    MissingPrerequisite {
        message: String,
        docs_hint: Option<String>,
    },
    /// The AI collaborator failed or answered with something unusable (502)
    ExternalService { message: String },
    /// A view is disabled because its data, model or key is missing (503)
    Unavailable { message: String },
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
            received: None,
            docs_hint: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { message, received } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message,
                    field: None,
                    received,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::MissingPrerequisite { message, docs_hint } => (
                StatusCode::CONFLICT,
                ApiError {
                    error: error::codes::MISSING_PREREQUISITE.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::ExternalService { message } => {
                tracing::warn!(%request_id, "External service error: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        error: error::codes::EXTERNAL_SERVICE_FAILED.to_string(),
                        message,
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: Some("잠시 후 다시 시도해주세요.".to_string()),
                    },
                )
            }
            AppError::Unavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError {
                    error: error::codes::SERVICE_UNAVAILABLE.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!(%request_id, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        AppError::Validation {
            message: err.to_string(),
            field: Some(err.field().to_string()),
            received: Some(err.received()),
            docs_hint: None,
        }
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::UnknownFood(ref name) => AppError::NotFound {
                received: Some(serde_json::Value::String(name.clone())),
                message: err.to_string(),
            },
            LookupError::AmountOutOfRange(amount) => AppError::Validation {
                message: err.to_string(),
                field: Some("amount".to_string()),
                received: Some(serde_json::json!(amount)),
                docs_hint: None,
            },
        }
    }
}

impl From<MealPlanError> for AppError {
    fn from(err: MealPlanError) -> Self {
        match err {
            MealPlanError::MissingBmi => AppError::MissingPrerequisite {
                message: err.to_string(),
                docs_hint: Some("POST /v1/session/bmi".to_string()),
            },
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        AppError::MissingPrerequisite {
            message: err.to_string(),
            docs_hint: Some("PUT /v1/session/foods".to_string()),
        }
    }
}

impl From<SelectionError> for AppError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::UnknownFood(ref name) => AppError::Validation {
                received: Some(serde_json::Value::String(name.clone())),
                message: err.to_string(),
                field: Some("foods".to_string()),
                docs_hint: Some("GET /v1/foods".to_string()),
            },
        }
    }
}
