// src/handlers/search.rs
use serde::Deserialize;
use warp::reply::Json;
use warp::Rejection;

use crate::services::tickers;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn get_search(query: SearchQuery) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&tickers::search(&query.q)))
}
