use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FOOD_TABLE: &str = "./food1.csv";
pub const DEFAULT_CALORIE_MODEL: &str = "./models/food_calorie_model.json";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;
/// One year. Session expiry must stay inside the `DateTime` range.
pub const MAX_SESSION_TTL_MINUTES: i64 = 525_600;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub food_table_path: PathBuf,
    pub calorie_model_path: PathBuf,
    /// Train the provisional stump model when the artifact is missing
    pub bootstrap_model: bool,
    pub session_ttl_minutes: i64,
    pub cors_origins: Vec<String>,
    pub gemini: GeminiConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_empty(lookup(key));

        let port = get("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let session_ttl_minutes = get("MATCHUM_SESSION_TTL_MINUTES")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| (1..=MAX_SESSION_TTL_MINUTES).contains(v))
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);

        let cors_origins = get("MATCHUM_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            port,
            food_table_path: get("MATCHUM_FOOD_TABLE")
                .unwrap_or_else(|| DEFAULT_FOOD_TABLE.to_string())
                .into(),
            calorie_model_path: get("MATCHUM_CALORIE_MODEL")
                .unwrap_or_else(|| DEFAULT_CALORIE_MODEL.to_string())
                .into(),
            bootstrap_model: get("MATCHUM_BOOTSTRAP_MODEL")
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
            session_ttl_minutes,
            cors_origins,
            gemini: GeminiConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_base: get("GEMINI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            },
        }
    }
}
