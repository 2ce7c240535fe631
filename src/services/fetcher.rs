// src/services/fetcher.rs
use std::time::Duration;

use log::info;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AnalysisError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Minimum spacing between any two outbound requests, across all tickers.
pub const REQUEST_SPACING: Duration = Duration::from_millis(1500);

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client that spaces every outbound request at least `spacing` apart,
/// process-wide. Concurrent analyses all reserve slots through the same gate,
/// so the combined cadence never exceeds what the upstream site tolerates.
pub struct PageFetcher {
    client: Client,
    next_slot: Mutex<Instant>,
    spacing: Duration,
}

impl PageFetcher {
    pub fn new() -> Result<Self, AnalysisError> {
        Self::with_spacing(REQUEST_SPACING)
    }

    pub fn with_spacing(spacing: Duration) -> Result<Self, AnalysisError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AnalysisError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            next_slot: Mutex::new(Instant::now()),
            spacing,
        })
    }

    /// Reserve the next send slot under the lock, then sleep until it outside
    /// the lock. Reserving before sleeping is what keeps the spacing global:
    /// every caller advances the shared counter exactly once.
    async fn acquire_slot(&self) -> Instant {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + self.spacing;
            slot
        };
        tokio::time::sleep_until(slot).await;
        slot
    }

    /// Fetch one page. A single attempt: the upstream source gets no retries,
    /// retrying would change the rate-limiting contract.
    pub async fn fetch(&self, url: &str) -> Result<String, AnalysisError> {
        self.acquire_slot().await;
        info!("Fetching page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| AnalysisError::Fetch(format!("{}: failed to read body: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_callers_get_globally_spaced_slots() {
        let spacing = Duration::from_millis(50);
        let fetcher = Arc::new(PageFetcher::with_spacing(spacing).unwrap());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let fetcher = fetcher.clone();
            handles.push(tokio::spawn(async move { fetcher.acquire_slot().await }));
        }

        let mut slots = Vec::new();
        for handle in handles {
            slots.push(handle.await.unwrap());
        }
        slots.sort();

        for pair in slots.windows(2) {
            assert!(
                pair[1] - pair[0] >= spacing,
                "slots {:?} and {:?} closer than {:?}",
                pair[0],
                pair[1],
                spacing
            );
        }
    }

    #[tokio::test]
    async fn sequential_calls_advance_the_slot() {
        let spacing = Duration::from_millis(20);
        let fetcher = PageFetcher::with_spacing(spacing).unwrap();

        let first = fetcher.acquire_slot().await;
        let second = fetcher.acquire_slot().await;
        assert!(second - first >= spacing);
    }
}
