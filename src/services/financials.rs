// src/services/financials.rs
use std::env;
use std::sync::Arc;

use log::info;

use crate::error::AnalysisError;
use crate::models::{FinancialHistory, StatementKind, StatementRecord};
use crate::services::assemble::assemble;
use crate::services::cache::FinancialsCache;
use crate::services::extract::extract;
use crate::services::fetcher::PageFetcher;
use crate::services::tickers;

const DEFAULT_BASE_URL: &str = "https://stockanalysis.com/quote/ngx";

/// Fetch-extract-assemble pipeline behind the single-flight cache. One
/// instance is shared by all request handlers, so the rate limiter and the
/// cache are process-wide.
pub struct FinancialsService {
    fetcher: Arc<PageFetcher>,
    cache: FinancialsCache,
    base_url: String,
}

impl FinancialsService {
    /// Build with `NAPKIN_BASE_URL` honored for mirrors and local testing.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let base_url = env::var("NAPKIN_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: String) -> Result<Self, AnalysisError> {
        Ok(Self {
            fetcher: Arc::new(PageFetcher::new()?),
            cache: FinancialsCache::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Financial history for one ticker, served from cache when fresh.
    /// Unknown tickers are rejected before any request goes out.
    pub async fn stock_financials(&self, ticker: &str) -> Result<Arc<FinancialHistory>, AnalysisError> {
        let ticker = ticker.trim().to_uppercase();
        let company_name = tickers::company_name(&ticker)
            .ok_or_else(|| AnalysisError::UnknownTicker(ticker.clone()))?;

        // The loader owns everything it needs: the cache runs it detached,
        // so it must outlive this request.
        let fetcher = self.fetcher.clone();
        let base_url = self.base_url.clone();
        let load_ticker = ticker.clone();
        self.cache
            .get_or_load(&ticker, move || {
                load(fetcher, base_url, load_ticker, company_name)
            })
            .await
    }
}

/// One full load: three statement pages, serialized through the global
/// rate limiter, extracted and assembled. Any fetch or extraction failure
/// aborts the load; nothing partial is cached.
async fn load(
    fetcher: Arc<PageFetcher>,
    base_url: String,
    ticker: String,
    company_name: &'static str,
) -> Result<FinancialHistory, AnalysisError> {
    info!("Loading financials for {} ({})", ticker, company_name);

    let income = statement(&fetcher, &base_url, &ticker, StatementKind::Income).await?;
    let balance = statement(&fetcher, &base_url, &ticker, StatementKind::Balance).await?;
    let cashflow = statement(&fetcher, &base_url, &ticker, StatementKind::CashFlow).await?;

    assemble(&ticker, company_name, income, balance, cashflow)
}

async fn statement(
    fetcher: &PageFetcher,
    base_url: &str,
    ticker: &str,
    kind: StatementKind,
) -> Result<StatementRecord, AnalysisError> {
    let url = format!("{}/{}/{}", base_url, ticker, kind.path());
    let html = fetcher.fetch(&url).await?;
    extract(&html, kind)
}
