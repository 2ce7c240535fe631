// src/error.rs
use thiserror::Error;

/// Failure taxonomy for a stock analysis. Cloneable so a single in-flight
/// load can hand the same failure to every waiting caller.
#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("no usable fiscal periods: {0}")]
    Assembly(String),

    #[error("unknown NGX ticker: {0}")]
    UnknownTicker(String),
}

impl AnalysisError {
    /// Coarse reason category, so operators can tell "upstream down" from
    /// "upstream changed its page format".
    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::Fetch(_) => "network",
            AnalysisError::Extraction(_) => "structural_drift",
            AnalysisError::Assembly(_) => "no_data",
            AnalysisError::UnknownTicker(_) => "unknown_ticker",
        }
    }
}
