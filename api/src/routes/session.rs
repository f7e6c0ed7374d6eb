use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use matchum_core::bmi::UserProfile;
use matchum_core::error::ApiError;
use matchum_core::session::SessionContext;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, SESSION_HEADER, SessionId};
use crate::routes::with_session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/session", get(get_session))
        .route("/v1/session/profile", put(update_profile))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    /// Expiry if the session stays idle
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub context: SessionContext,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileUpdatedResponse {
    pub profile: UserProfile,
    /// True when a stored BMI result was dropped because the profile changed
    pub bmi_cleared: bool,
}

/// Start a new session. Send the returned id as `x-session-id` afterwards.
#[utoipa::path(
    post,
    path = "/v1/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionCreatedResponse)
    ),
    tag = "session"
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, HeaderMap, Json<SessionCreatedResponse>), AppError> {
    let (session_id, expires_at) = state.sessions.create().await;
    tracing::info!(%session_id, "Session created");

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&session_id.to_string())
        .map_err(|e| AppError::Internal(format!("session id header: {e}")))?;
    headers.insert(SESSION_HEADER, value);

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SessionCreatedResponse {
            session_id,
            expires_at,
        }),
    ))
}

/// Current profile, BMI result and food selection
#[utoipa::path(
    get,
    path = "/v1/session",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse),
        (status = 400, description = "Missing or malformed session id", body = ApiError),
        (status = 404, description = "Unknown or expired session", body = ApiError)
    ),
    tag = "session"
)]
pub async fn get_session(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<SessionResponse>, AppError> {
    let context = with_session(&state, session, |ctx| ctx.clone()).await?;
    Ok(Json(SessionResponse {
        session_id: session.0,
        context,
    }))
}

/// Store height, weight and age. Changing any field clears the BMI result.
#[utoipa::path(
    put,
    path = "/v1/session/profile",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    request_body = UserProfile,
    responses(
        (status = 200, description = "Profile stored", body = ProfileUpdatedResponse),
        (status = 400, description = "Value out of range", body = ApiError),
        (status = 404, description = "Unknown or expired session", body = ApiError)
    ),
    tag = "session"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(profile): AppJson<UserProfile>,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let outcome = with_session(&state, session, |ctx| {
        let had_bmi = ctx.bmi.is_some();
        ctx.update_profile(profile)
            .map(|changed| changed && had_bmi)
    })
    .await?;
    let bmi_cleared = outcome?;

    Ok(Json(ProfileUpdatedResponse {
        profile,
        bmi_cleared,
    }))
}
