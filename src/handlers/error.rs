// src/handlers/error.rs
use std::fmt;

use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::AnalysisError;

/// Rejection carried through warp and turned into a JSON error body by the
/// route recovery. The category lets callers tell a network failure from
/// upstream format drift.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub category: &'static str,
    pub status: StatusCode,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            message: message.into(),
            category: "bad_request",
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::UnknownTicker(_) => StatusCode::NOT_FOUND,
            AnalysisError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Extraction(_) | AnalysisError::Assembly(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError {
            message: err.to_string(),
            category: err.category(),
            status,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
