// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::analyze::get_analysis;
use crate::handlers::compare::{get_comparison, CompareQuery};
use crate::handlers::error::ApiError;
use crate::handlers::search::{get_search, SearchQuery};
use crate::services::financials::FinancialsService;

// Recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, category, message) = if err.is_not_found() {
        (
            warp::http::StatusCode::NOT_FOUND,
            "not_found",
            "Not Found".to_string(),
        )
    } else if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, api_error.category, api_error.message.clone())
    } else {
        (
            warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
            "category": category,
        })),
        code,
    ))
}

pub fn routes(
    service: Arc<FinancialsService>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let service_filter = warp::any().map(move || service.clone());

    let analyze_route = warp::path!("api" / "v1" / "analyze" / String)
        .and(warp::get())
        .and(service_filter.clone())
        .and_then(get_analysis);

    let compare_route = warp::path!("api" / "v1" / "compare")
        .and(warp::get())
        .and(warp::query::<CompareQuery>())
        .and(service_filter.clone())
        .and_then(get_comparison);

    let search_route = warp::path!("api" / "v1" / "search")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and_then(get_search);

    info!("All routes configured successfully.");

    analyze_route
        .or(compare_route)
        .or(search_route)
        .recover(handle_rejection)
}
