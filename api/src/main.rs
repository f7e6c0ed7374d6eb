use std::net::SocketAddr;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod gemini;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "맛춤식 API",
        version = "0.1.0",
        description = "BMI, food nutrition lookup, sodium/sugar intake, AI meal plans and food-photo nutrient analysis."
    ),
    paths(
        routes::health::health_check,
        routes::home::home,
        routes::session::create_session,
        routes::session::get_session,
        routes::session::update_profile,
        routes::bmi::calculate_bmi,
        routes::bmi::criteria,
        routes::foods::list_foods,
        routes::foods::lookup_food,
        routes::intake::select_foods,
        routes::intake::analyze_intake,
        routes::meal_plan::generate_meal_plan,
        routes::analyzer::analyze_image,
    ),
    components(schemas(
        matchum_core::error::ApiError,
        matchum_core::bmi::UserProfile,
        matchum_core::bmi::BmiResult,
        matchum_core::bmi::BmiCategory,
        matchum_core::bmi::BmiCriteria,
        matchum_core::bmi::IdealWeightRange,
        matchum_core::bmi::WeightAdvice,
        matchum_core::foods::FoodRecord,
        matchum_core::nutrition::NutritionLookup,
        matchum_core::nutrition::ScaledNutrients,
        matchum_core::nutrition::MacroShares,
        matchum_core::nutrition::MacroFeedback,
        matchum_core::nutrition::DailyShare,
        matchum_core::intake::IntakeReport,
        matchum_core::intake::IntakeItem,
        matchum_core::intake::IntakeTotal,
        matchum_core::session::SessionContext,
        matchum_core::extraction::Nutrient,
        matchum_core::analysis::ImageAnalysis,
        matchum_core::analysis::NutrientReading,
        matchum_core::analysis::CalorieCorrection,
        routes::health::HealthResponse,
        routes::home::HomeResponse,
        routes::session::SessionCreatedResponse,
        routes::session::SessionResponse,
        routes::session::ProfileUpdatedResponse,
        routes::foods::FoodListResponse,
        routes::intake::SelectFoodsRequest,
        routes::intake::SelectedFoodsResponse,
        routes::meal_plan::MealPlanRequest,
        routes::meal_plan::MealPlanResponse,
        routes::analyzer::AnalyzerForm,
    )),
    tags(
        (name = "system", description = "Health and component readiness"),
        (name = "home", description = "Landing page content"),
        (name = "session", description = "Per-session profile, BMI and food selection"),
        (name = "bmi", description = "BMI calculation and age-banded criteria"),
        (name = "foods", description = "Food table lookup"),
        (name = "intake", description = "Sodium and sugar intake for selected foods"),
        (name = "meal-plan", description = "AI one-day meal plan from BMI and age"),
        (name = "analyzer", description = "Food-photo nutrient extraction with calorie correction"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchum_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env();
    let app_state = state::AppState::load(&config);

    let cors_layer = middleware::cors::build_cors_layer(&config.cors_origins);

    // AI views share one per-IP rate limit
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::api_router())
        .merge(routes::ai_router().layer(middleware::rate_limit::ai_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("맛춤식 API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %err, "Server error");
        std::process::exit(1);
    }
}
