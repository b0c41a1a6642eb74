//! Mapbox client error types.

/// Errors from the Mapbox Directions HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum MapboxError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered but found no walking route between the points
    #[error("no route found ({code})")]
    NoRoute { code: String },

    /// Rate limited by the API
    #[error("rate limited by Mapbox API")]
    RateLimited,

    /// Invalid access token or unauthorized
    #[error("unauthorized (invalid access token)")]
    Unauthorized,

    /// Client could not be constructed from its configuration
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(" (body: {body})"),
        None => String::new(),
    }
}
