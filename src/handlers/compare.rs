// src/handlers/compare.rs
use std::sync::Arc;

use futures::future::join_all;
use log::{error, info};
use serde::Deserialize;
use warp::reply::Json;
use warp::Rejection;

use crate::models::NapkinResult;
use crate::services::analyzer::analyze;
use crate::services::financials::FinancialsService;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub tickers: String,
}

/// Side-by-side analysis of 2-3 tickers. The loads run concurrently; the
/// shared rate limiter still spaces their page requests globally. A ticker
/// that fails is skipped unless every one of them fails.
pub async fn get_comparison(
    query: CompareQuery,
    service: Arc<FinancialsService>,
) -> Result<Json, Rejection> {
    let tickers: Vec<String> = query
        .tickers
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    if tickers.len() < 2 || tickers.len() > 3 {
        return Err(warp::reject::custom(ApiError::bad_request(
            "compare expects 2 or 3 comma-separated tickers",
        )));
    }
    info!("Handling comparison request for {:?}", tickers);

    let outcomes = join_all(tickers.iter().map(|t| service.stock_financials(t))).await;

    let mut results: Vec<NapkinResult> = Vec::new();
    let mut first_error = None;
    for (ticker, outcome) in tickers.iter().zip(outcomes) {
        match outcome {
            Ok(history) => results.push(analyze(&history)),
            Err(e) => {
                error!("Comparison load for {} failed ({}): {}", ticker, e.category(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if results.is_empty() {
        if let Some(e) = first_error {
            return Err(warp::reject::custom(ApiError::from(e)));
        }
    }
    Ok(warp::reply::json(&results))
}
