// src/handlers/analyze.rs
use std::sync::Arc;

use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use crate::services::analyzer::analyze;
use crate::services::financials::FinancialsService;

use super::error::ApiError;

pub async fn get_analysis(
    ticker: String,
    service: Arc<FinancialsService>,
) -> Result<Json, Rejection> {
    info!("Handling analysis request for {}", ticker);

    match service.stock_financials(&ticker).await {
        Ok(history) => {
            let result = analyze(&history);
            info!(
                "{} scored {} green / {} yellow / {} red: {:?}",
                result.ticker, result.green_count, result.yellow_count, result.red_count,
                result.recommendation
            );
            Ok(warp::reply::json(&result))
        }
        Err(e) => {
            error!("Analysis for {} failed ({}): {}", ticker, e.category(), e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
