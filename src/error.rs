use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// Failures while retrieving a feed. Never shown to visitors; the retriever
/// collapses all of them to an empty post list.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid relay url: {0}")]
    RelayUrl(#[from] url::ParseError),
    #[error("relay request failed: {0}")]
    Relay(#[from] reqwest::Error),
    #[error("malformed relay envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("feed parse failed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => {
                tracing::debug!(message = %msg, "rejected request");
                (StatusCode::BAD_REQUEST, "BadRequest".to_string(), msg)
            }
        };

        let body = Json(ErrorBody {
            error: ErrorDetail { code, message },
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
