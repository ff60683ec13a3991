use poem::http::StatusCode;
use poem::{Body, Response};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Search query cannot be empty")]
    EmptyQuery,
    #[error("API key is required")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("API key has expired")]
    ExpiredApiKey,
    #[error("API Key is blocked by admin.")]
    BlockedApiKey,
    #[error("No results found for the given query")]
    NoResults,
    #[error("Could not extract audio stream URL")]
    NoAudioStream,
    #[error("Error extracting audio: {0}")]
    Extraction(String),
    #[error("Internal server error occurred while processing the request")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyQuery => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey
            | ApiError::InvalidApiKey
            | ApiError::ExpiredApiKey
            | ApiError::BlockedApiKey => StatusCode::FORBIDDEN,
            ApiError::NoResults => StatusCode::NOT_FOUND,
            ApiError::NoAudioStream | ApiError::Extraction(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(why: redis::RedisError) -> Self {
        log::error!("Redis operation failed: {why}");
        ApiError::Internal
    }
}

/// Success envelope: `{"success": true, "data": ...}`.
pub fn success<T: Serialize>(data: &T) -> Response {
    let body = Body::from_json(json!({
        "success": true,
        "data": data,
    }))
    .unwrap();
    Response::builder()
        .status(StatusCode::OK)
        .content_type("application/json")
        .body(body)
}

/// Failure envelope: `{"success": false, "error": ..., "query": ...}`.
/// Every error path goes through here so the client always sees one shape.
pub fn failure(error: &ApiError, query: &str) -> Response {
    let body = Body::from_json(json!({
        "success": false,
        "error": error.to_string(),
        "query": query,
    }))
    .unwrap();
    Response::builder()
        .status(error.status())
        .content_type("application/json")
        .body(body)
}
