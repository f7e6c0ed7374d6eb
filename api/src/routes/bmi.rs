use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use matchum_core::bmi::{self, AGE_RANGE_YEARS, BmiCriteria, BmiResult, UserProfile};
use matchum_core::error::ApiError;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppQuery, SessionId};
use crate::routes::with_session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/session/bmi", post(calculate_bmi))
        .route("/v1/bmi/criteria", get(criteria))
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CriteriaQuery {
    /// Age in years (1–100)
    pub age: u32,
}

/// Validate the profile, store it on the session and compute BMI.
///
/// On a validation error any BMI result already stored on the session is
/// cleared, so a later meal plan cannot use stale values.
#[utoipa::path(
    post,
    path = "/v1/session/bmi",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    request_body = UserProfile,
    responses(
        (status = 200, description = "BMI result", body = BmiResult),
        (status = 400, description = "Height, weight or age out of range", body = ApiError),
        (status = 404, description = "Unknown or expired session", body = ApiError)
    ),
    tag = "bmi"
)]
pub async fn calculate_bmi(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(profile): AppJson<UserProfile>,
) -> Result<Json<BmiResult>, AppError> {
    let result = with_session(&state, session, |ctx| {
        ctx.calculate_bmi(profile).cloned()
    })
    .await??;

    tracing::debug!(
        bmi = result.value,
        category = result.category.label(),
        "BMI calculated"
    );
    Ok(Json(result))
}

/// Age-banded criteria used for classification
#[utoipa::path(
    get,
    path = "/v1/bmi/criteria",
    params(CriteriaQuery),
    responses(
        (status = 200, description = "Criteria band for the age", body = BmiCriteria),
        (status = 400, description = "Age out of range", body = ApiError)
    ),
    tag = "bmi"
)]
pub async fn criteria(AppQuery(query): AppQuery<CriteriaQuery>) -> Result<Json<BmiCriteria>, AppError> {
    if !(AGE_RANGE_YEARS.0..=AGE_RANGE_YEARS.1).contains(&query.age) {
        return Err(AppError::Validation {
            message: "나이는 1세 ~ 100세 사이로 입력해주세요.".to_string(),
            field: Some("age".to_string()),
            received: Some(serde_json::json!(query.age)),
            docs_hint: None,
        });
    }
    Ok(Json(*bmi::criteria_for_age(query.age)))
}
