use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::extract::SESSION_HEADER;

/// Build a CORS layer for the dashboard front end.
///
/// - Origins: from `MATCHUM_CORS_ORIGINS` (default: `http://localhost:3000`);
///   entries that are not valid header values are skipped
/// - Methods: GET, POST, PUT, OPTIONS
/// - Headers: Content-Type, x-session-id
/// - Max age: 3600s
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static(SESSION_HEADER),
        ])
        .expose_headers([HeaderName::from_static(SESSION_HEADER)])
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    async fn ok() -> StatusCode {
        StatusCode::OK
    }

    async fn preflight(origin: &str) -> axum::response::Response {
        let app = Router::new()
            .route("/v1/foods", get(ok))
            .layer(build_cors_layer(&["https://matchum.example".to_string()]));
        app.oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/v1/foods")
                .header("origin", origin)
                .header("access-control-request-method", "GET")
                .header("access-control-request-headers", SESSION_HEADER)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should succeed")
    }

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let response = preflight("https://matchum.example").await;
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "https://matchum.example"
        );
    }

    #[tokio::test]
    async fn other_origin_is_not_echoed() {
        let response = preflight("https://evil.example").await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
