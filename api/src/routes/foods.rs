use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use matchum_core::error::ApiError;
use matchum_core::nutrition::{self, NutritionLookup};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/foods", get(list_foods))
        .route("/v1/foods/{name}", get(lookup_food))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FoodListResponse {
    pub count: usize,
    /// Sorted food names
    pub names: Vec<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AmountQuery {
    /// Serving in g/ml (1–1000, default 100)
    pub amount: Option<f64>,
}

/// Names available for lookup and intake selection
#[utoipa::path(
    get,
    path = "/v1/foods",
    responses(
        (status = 200, description = "Food names", body = FoodListResponse),
        (status = 503, description = "Food table not loaded", body = ApiError)
    ),
    tag = "foods"
)]
pub async fn list_foods(State(state): State<AppState>) -> Result<Json<FoodListResponse>, AppError> {
    let table = state.foods.get()?;
    let names: Vec<String> = table.names().into_iter().map(str::to_string).collect();
    Ok(Json(FoodListResponse {
        count: names.len(),
        names,
    }))
}

/// Nutrients for one serving with macro-energy feedback and daily-share badges
#[utoipa::path(
    get,
    path = "/v1/foods/{name}",
    params(
        ("name" = String, Path, description = "Food name as listed by GET /v1/foods"),
        AmountQuery
    ),
    responses(
        (status = 200, description = "Scaled nutrition", body = NutritionLookup),
        (status = 400, description = "Amount out of range", body = ApiError),
        (status = 404, description = "Unknown food", body = ApiError),
        (status = 503, description = "Food table not loaded", body = ApiError)
    ),
    tag = "foods"
)]
pub async fn lookup_food(
    State(state): State<AppState>,
    Path(name): Path<String>,
    AppQuery(query): AppQuery<AmountQuery>,
) -> Result<Json<NutritionLookup>, AppError> {
    let table = state.foods.get()?;
    let result = nutrition::lookup(table, name.trim(), query.amount)?;
    Ok(Json(result))
}
