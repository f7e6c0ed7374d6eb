use axum::extract::State;
use axum::routing::{post, put};
use axum::{Json, Router};
use matchum_core::error::ApiError;
use matchum_core::intake::IntakeReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, SessionId};
use crate::routes::with_session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/session/foods", put(select_foods))
        .route("/v1/session/intake", post(analyze_intake))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SelectFoodsRequest {
    pub foods: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SelectedFoodsResponse {
    pub selected_foods: Vec<String>,
}

/// Replace the session's food selection. Every name must exist in the table.
#[utoipa::path(
    put,
    path = "/v1/session/foods",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    request_body = SelectFoodsRequest,
    responses(
        (status = 200, description = "Selection stored", body = SelectedFoodsResponse),
        (status = 400, description = "Unknown food name", body = ApiError),
        (status = 404, description = "Unknown or expired session", body = ApiError),
        (status = 503, description = "Food table not loaded", body = ApiError)
    ),
    tag = "intake"
)]
pub async fn select_foods(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(req): AppJson<SelectFoodsRequest>,
) -> Result<Json<SelectedFoodsResponse>, AppError> {
    let table = state.foods.get()?;
    let selected_foods = with_session(&state, session, |ctx| {
        ctx.select_foods(table, req.foods)
            .map(|()| ctx.selected_foods.clone())
    })
    .await??;
    Ok(Json(SelectedFoodsResponse { selected_foods }))
}

/// Sodium and sugar for the selected foods, one 300 g serving each, against
/// the daily limits.
#[utoipa::path(
    post,
    path = "/v1/session/intake",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    responses(
        (status = 200, description = "Intake report", body = IntakeReport),
        (status = 404, description = "Unknown or expired session", body = ApiError),
        (status = 409, description = "No foods selected", body = ApiError),
        (status = 503, description = "Food table not loaded", body = ApiError)
    ),
    tag = "intake"
)]
pub async fn analyze_intake(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<IntakeReport>, AppError> {
    let table = state.foods.get()?;
    let report = with_session(&state, session, |ctx| ctx.intake_report(table)).await??;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{app, json_request, new_session, send};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn intake_without_selection_is_missing_prerequisite() {
        let app = app(test_state());
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            json_request("POST", "/v1/session/intake", Some(&id), json!(null)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "missing_prerequisite");
    }

    #[tokio::test]
    async fn selected_foods_are_totalled() {
        let app = app(test_state());
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                "/v1/session/foods",
                Some(&id),
                json!({"foods": ["김치찌개", "현미밥", "김치찌개"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected_foods"], json!(["김치찌개", "현미밥"]));

        let (status, body) = send(
            &app,
            json_request("POST", "/v1/session/intake", Some(&id), json!(null)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["serving_size_g"], 300.0);
        let sodium = body["sodium"]["consumed"].as_f64().unwrap();
        assert!((sodium - 1956.0).abs() < 1e-9);
        assert_eq!(body["sodium"]["within_limit"], true);
    }

    #[tokio::test]
    async fn unknown_food_selection_is_rejected() {
        let app = app(test_state());
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                "/v1/session/foods",
                Some(&id),
                json!({"foods": ["피자"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "foods");
        assert_eq!(body["received"], "피자");
    }
}
