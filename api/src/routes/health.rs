use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ComponentStatus {
    pub food_table: bool,
    pub calorie_model: bool,
    /// True when the calorie model was trained from the built-in bootstrap rows
    pub calorie_model_provisional: bool,
    pub ai: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// "ok" when every component loaded, "degraded" otherwise
    pub status: String,
    pub version: String,
    pub components: ComponentStatus,
}

/// Health check endpoint. A missing component only disables its own views,
/// so this always answers 200 and reports which parts are degraded.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = ComponentStatus {
        food_table: state.foods.is_ready(),
        calorie_model: state.calorie_model.is_ready(),
        calorie_model_provisional: state
            .calorie_model
            .get()
            .is_ok_and(|model| model.is_provisional()),
        ai: state.gemini.is_ready(),
    };
    let all_ready = components.food_table && components.calorie_model && components.ai;

    Json(HealthResponse {
        status: if all_ready { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{app, get, send};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn reports_missing_ai_key_as_degraded() {
        let (status, body) = send(&app(test_state()), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["components"]["food_table"], true);
        assert_eq!(body["components"]["calorie_model"], true);
        assert_eq!(body["components"]["calorie_model_provisional"], false);
        assert_eq!(body["components"]["ai"], false);
    }
}
