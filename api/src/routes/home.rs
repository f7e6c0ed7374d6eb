use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/home", get(home))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeStat {
    pub value: String,
    pub label: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeFeature {
    pub icon: String,
    pub title: String,
    pub description: String,
    /// Endpoint backing the feature
    pub path: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeResponse {
    pub title: String,
    pub subtitle: String,
    pub stats: Vec<HomeStat>,
    pub features: Vec<HomeFeature>,
    pub call_to_action: String,
}

fn feature(icon: &str, title: &str, description: &str, path: &str) -> HomeFeature {
    HomeFeature {
        icon: icon.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        path: path.to_string(),
    }
}

/// Landing overview: service intro, live food count and the feature list.
#[utoipa::path(
    get,
    path = "/v1/home",
    responses((status = 200, description = "Home overview", body = HomeResponse)),
    tag = "home"
)]
pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let food_count = state
        .foods
        .get()
        .map(|table| table.len().to_string())
        .unwrap_or_else(|_| "-".to_string());

    Json(HomeResponse {
        title: "맛춤식에 오신 것을 환영합니다".to_string(),
        subtitle: "AI 기술을 활용한 맞춤형 식단 관리로 당신의 건강한 식생활을 설계해드립니다"
            .to_string(),
        stats: vec![
            HomeStat {
                value: food_count,
                label: "등록된 음식".to_string(),
            },
            HomeStat {
                value: "📷".to_string(),
                label: "AI 음식 사진 분석".to_string(),
            },
            HomeStat {
                value: "100%".to_string(),
                label: "AI 맞춤형 추천".to_string(),
            },
        ],
        features: vec![
            feature(
                "👤",
                "사용자 정보 입력",
                "키, 몸무게, 나이로 BMI와 적정 체중 범위를 계산합니다.",
                "/v1/session/bmi",
            ),
            feature(
                "🎯",
                "AI 기반 식단 분석",
                "음식 사진만으로 정확한 영양 정보를 분석하고 칼로리를 계산해드립니다.",
                "/v1/analyzer",
            ),
            feature(
                "📊",
                "영양 정보 확인",
                "음식을 검색해 영양 정보를 확인 하실 수 있습니다.",
                "/v1/foods",
            ),
            feature(
                "🍱",
                "AI 맞춤 추천",
                "사용자의 건강 상태와 선호도를 고려한 맞춤형 식단을 제안합니다.",
                "/v1/meal-plan",
            ),
            feature(
                "🧂",
                "나트륨 · 당류 섭취 분석",
                "선택한 음식의 나트륨과 당류를 하루 권장량과 비교합니다.",
                "/v1/session/intake",
            ),
        ],
        call_to_action: "사용자 정보를 입력하고 AI 기반의 맞춤형 식단 관리를 경험해보세요."
            .to_string(),
    })
}
