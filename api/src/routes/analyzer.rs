use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use matchum_core::analysis::{self, CalorieCorrection, ImageAnalysis};
use matchum_core::error::ApiError;
use matchum_core::extraction;

use crate::error::AppError;
use crate::gemini::ImageInput;
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Extension → MIME type for the formats the analyzer accepts.
const ALLOWED_FORMATS: [(&str, &str); 6] = [
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/analyzer", post(analyze_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

/// Multipart form accepted by the analyzer (documentation only)
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AnalyzerForm {
    /// jpg, jpeg, png, gif, webp or bmp
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// Optional food name; takes priority over what the model sees
    pub food_name: Option<String>,
}

/// MIME type for an upload, from its file extension or, failing that, its
/// declared content type. `None` for anything outside the allowed formats.
fn image_mime_type(file_name: Option<&str>, content_type: Option<&str>) -> Option<&'static str> {
    let by_extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .and_then(|ext| {
            ALLOWED_FORMATS
                .iter()
                .find(|(allowed, _)| *allowed == ext)
                .map(|(_, mime)| *mime)
        });
    if by_extension.is_some() || file_name.is_some_and(|name| name.contains('.')) {
        return by_extension;
    }

    let content_type = content_type?.to_ascii_lowercase();
    ALLOWED_FORMATS
        .iter()
        .map(|(_, mime)| *mime)
        .find(|mime| *mime == content_type)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation {
        message: format!("업로드를 읽을 수 없습니다: {}", err.body_text()),
        field: Some("image".to_string()),
        received: None,
        docs_hint: None,
    }
}

/// Estimate nutrients from a food photo and cross-check the calories.
///
/// Parsing is best-effort: fields the model did not state come back null
/// (shown as "N/A") and the calorie correction is reported as unavailable
/// with the missing nutrients listed.
#[utoipa::path(
    post,
    path = "/v1/analyzer",
    request_body(content = AnalyzerForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted nutrients and calorie correction", body = ImageAnalysis),
        (status = 400, description = "No image or unsupported format", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError),
        (status = 502, description = "Model call failed", body = ApiError),
        (status = 503, description = "Calorie model or GEMINI_API_KEY missing", body = ApiError)
    ),
    tag = "analyzer"
)]
pub async fn analyze_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageAnalysis>, AppError> {
    let mut image: Option<ImageInput> = None;
    let mut food_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = image_mime_type(file_name.as_deref(), field.content_type())
                    .ok_or_else(|| AppError::Validation {
                        message: "지원하지 않는 이미지 형식입니다. (jpg, jpeg, png, gif, webp, bmp)"
                            .to_string(),
                        field: Some("image".to_string()),
                        received: file_name.clone().map(serde_json::Value::String),
                        docs_hint: None,
                    })?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    image = Some(ImageInput {
                        mime_type: mime_type.to_string(),
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some("food_name") => {
                food_name = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| {
        AppError::validation("분석할 음식 사진을 업로드해주세요.", "image")
    })?;

    let model = state.calorie_model.get()?;
    let gemini = state.gemini.get()?;

    let prompt = extraction::build_analysis_prompt(food_name.as_deref());
    let reply = gemini.generate_with_image(&prompt, &image).await?;
    let result = analysis::analyze_reply(&reply, model);

    match &result.calorie_correction {
        CalorieCorrection::Corrected {
            raw_ai_kcal,
            corrected_kcal,
            provisional,
        } => tracing::info!(
            food = %result.food_name,
            raw_ai_kcal = ?raw_ai_kcal,
            corrected_kcal,
            provisional,
            "Image analysed"
        ),
        CalorieCorrection::Unavailable { missing, .. } => tracing::warn!(
            food = %result.food_name,
            missing = ?missing,
            "Image analysed without calorie correction"
        ),
    }

    Ok(Json(result))
}
