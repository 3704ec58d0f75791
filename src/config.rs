use std::env;

const DEFAULT_API_BASE: &str = "http://localhost:5000";
const DEFAULT_PAGE_SIZE: u32 = 12;
const DEFAULT_TRENDING_MIN_VIEWS: u64 = 100;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Base URL of the analysis API, without a trailing slash.
pub fn api_base() -> String {
    env::var("ANALYSIS_API_URL")
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

/// Rows requested per page. Clamped so a bad value cannot hammer the API
/// or disable the full-page pagination heuristic.
pub fn page_size() -> u32 {
    env::var("ANALYSIS_PAGE_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, 50)
}

/// View count an analysis must exceed to count as trending.
pub fn trending_min_views() -> u64 {
    env::var("TRENDING_MIN_VIEWS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TRENDING_MIN_VIEWS)
}

/// Serve the generated offline corpus instead of hitting the API. On when
/// FEED_SOURCE=fake, or when no API URL is configured at all.
pub fn use_fake_feed() -> bool {
    match env::var("FEED_SOURCE") {
        Ok(v) => v.trim().eq_ignore_ascii_case("fake"),
        Err(_) => env::var("ANALYSIS_API_URL").is_err(),
    }
}

pub fn http_timeout_secs() -> u64 {
    env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
        .clamp(1, 120)
}
