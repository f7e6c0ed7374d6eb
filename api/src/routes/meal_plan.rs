use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use matchum_core::bmi::{BmiCategory, BmiCriteria, criteria_for_age};
use matchum_core::error::ApiError;
use matchum_core::meal_plan::{self, MEAL_PLAN_DISCLAIMERS};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, SessionId};
use crate::routes::with_session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/meal-plan", post(generate_meal_plan))
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct MealPlanRequest {
    /// Comma-separated foods to favour, e.g. "연어, 닭가슴살"
    pub preferred_foods: String,
    /// Comma-separated foods to leave out
    pub avoided_foods: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MealPlanResponse {
    pub bmi: f64,
    pub age_years: u32,
    pub category: BmiCategory,
    pub category_label: String,
    pub criteria: BmiCriteria,
    pub preferred_foods: Vec<String>,
    pub avoided_foods: Vec<String>,
    /// Markdown returned by the model, unparsed
    pub plan_markdown: String,
    pub disclaimers: Vec<String>,
}

/// Generate a one-day meal plan for the session's BMI and age.
///
/// Requires a BMI result on the session; that is checked before the model is
/// called. Model failures come back as 502 with the reason in the message.
#[utoipa::path(
    post,
    path = "/v1/meal-plan",
    params(("x-session-id" = Uuid, Header, description = "Session id")),
    request_body = MealPlanRequest,
    responses(
        (status = 200, description = "Generated plan", body = MealPlanResponse),
        (status = 404, description = "Unknown or expired session", body = ApiError),
        (status = 409, description = "BMI not calculated yet", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError),
        (status = 502, description = "Model call failed", body = ApiError),
        (status = 503, description = "GEMINI_API_KEY not configured", body = ApiError)
    ),
    tag = "meal-plan"
)]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(req): AppJson<MealPlanRequest>,
) -> Result<Json<MealPlanResponse>, AppError> {
    let (bmi, age) = with_session(&state, session, |ctx| ctx.meal_plan_inputs()).await?;

    let preferred_foods = meal_plan::parse_food_list(&req.preferred_foods);
    let avoided_foods = meal_plan::parse_food_list(&req.avoided_foods);
    let prompt = meal_plan::build_prompt(bmi, age, &preferred_foods, &avoided_foods)?;

    let gemini = state.gemini.get()?;
    let plan_markdown = gemini.generate_text(&prompt.text).await.map_err(|err| {
        AppError::ExternalService {
            message: meal_plan::generation_failure_message(&err.to_string()),
        }
    })?;

    tracing::info!(
        session_id = %session.0,
        category = prompt.category.label(),
        "Meal plan generated"
    );

    Ok(Json(MealPlanResponse {
        bmi: prompt.bmi,
        age_years: prompt.age_years,
        category: prompt.category,
        category_label: prompt.category.label().to_string(),
        criteria: *criteria_for_age(prompt.age_years),
        preferred_foods,
        avoided_foods,
        plan_markdown,
        disclaimers: MEAL_PLAN_DISCLAIMERS.iter().map(|s| s.to_string()).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::gemini::GeminiClient;
    use crate::gemini::tests::{fake_gemini, text_reply};
    use crate::routes::test_support::{app, json_request, new_session, send};
    use crate::state::Component;
    use crate::state::tests::test_state;

    async fn session_with_bmi(app: &axum::Router) -> String {
        let id = new_session(app).await;
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/v1/session/bmi",
                Some(&id),
                json!({"height_cm": 160.0, "weight_kg": 80.0, "age_years": 45}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn missing_bmi_is_rejected_before_the_model() {
        // No Gemini key either: the prerequisite check must win.
        let app = app(test_state());
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            json_request("POST", "/v1/meal-plan", Some(&id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "missing_prerequisite");
    }

    #[tokio::test]
    async fn missing_api_key_is_503() {
        let app = app(test_state());
        let id = session_with_bmi(&app).await;
        let (status, _) = send(
            &app,
            json_request("POST", "/v1/meal-plan", Some(&id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn plan_is_returned_with_category_and_disclaimers() {
        let config = fake_gemini(StatusCode::OK, text_reply("### 🌅 아침\n- 추천 식단: 현미밥")).await;
        let mut state = test_state();
        state.gemini = Component::ready(GeminiClient::from_config(&config).unwrap());
        let app = app(state);
        let id = session_with_bmi(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/v1/meal-plan",
                Some(&id),
                json!({"preferred_foods": "연어, 두부", "avoided_foods": ""}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "obese");
        assert_eq!(body["category_label"], "비만");
        assert_eq!(body["preferred_foods"], json!(["연어", "두부"]));
        assert_eq!(body["avoided_foods"], json!([]));
        assert!(body["plan_markdown"].as_str().unwrap().contains("현미밥"));
        assert_eq!(body["disclaimers"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn model_failure_is_502_with_reason() {
        let config = fake_gemini(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "backend exploded"}}),
        )
        .await;
        let mut state = test_state();
        state.gemini = Component::ready(GeminiClient::from_config(&config).unwrap());
        let app = app(state);
        let id = session_with_bmi(&app).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/v1/meal-plan", Some(&id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("식단 생성 중 오류가 발생했습니다: "));
        assert!(message.contains("backend exploded"));
    }
}
