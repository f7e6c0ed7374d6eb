use axum::Router;
use matchum_core::session::SessionContext;

use crate::error::AppError;
use crate::extract::SessionId;
use crate::state::AppState;

pub mod analyzer;
pub mod bmi;
pub mod foods;
pub mod health;
pub mod home;
pub mod intake;
pub mod meal_plan;
pub mod session;

/// Every view that does not call the AI collaborator.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(home::router())
        .merge(session::router())
        .merge(bmi::router())
        .merge(foods::router())
        .merge(intake::router())
}

/// Gemini-backed views. `main` wraps these in the AI rate limit.
pub fn ai_router() -> Router<AppState> {
    Router::new()
        .merge(meal_plan::router())
        .merge(analyzer::router())
}

/// Run `f` against the caller's session, or 404 when it is unknown or expired.
pub(crate) async fn with_session<R>(
    state: &AppState,
    SessionId(id): SessionId,
    f: impl FnOnce(&mut SessionContext) -> R,
) -> Result<R, AppError> {
    state
        .sessions
        .with_session(id, f)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: "세션을 찾을 수 없습니다. 새 세션을 생성해주세요.".to_string(),
            received: Some(serde_json::Value::String(id.to_string())),
        })
}
