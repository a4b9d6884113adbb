//! CORS layer built from `server.cors`.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use coursechat_core::config::CorsConfig;

/// Builds the CORS layer. `"*"` in origins or headers allows any value;
/// entries that do not parse are logged and skipped.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(&config.allowed_origins))
        .allow_methods(parse_all::<Method>("method", &config.allowed_methods))
        .allow_headers(allow_headers(&config.allowed_headers))
        .max_age(Duration::from_secs(config.max_age_seconds))
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if is_wildcard(origins) {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(parse_all::<HeaderValue>("origin", origins))
    }
}

fn allow_headers(headers: &[String]) -> AllowHeaders {
    if is_wildcard(headers) {
        AllowHeaders::from(Any)
    } else {
        AllowHeaders::list(parse_all::<HeaderName>("header", headers))
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

fn parse_all<T: std::str::FromStr>(what: &str, values: &[String]) -> Vec<T> {
    values
        .iter()
        .filter_map(|raw| match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(kind = what, value = %raw, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}
