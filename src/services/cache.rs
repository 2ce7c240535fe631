// src/services/cache.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use tokio::sync::{broadcast, Mutex};
use tokio::time::{Duration, Instant};

use crate::error::AnalysisError;
use crate::models::FinancialHistory;

/// Scraped financials stay fresh for one hour.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

type LoadResult = Result<Arc<FinancialHistory>, AnalysisError>;

enum Slot {
    Ready {
        value: Arc<FinancialHistory>,
        inserted_at: Instant,
    },
    InFlight(broadcast::Sender<LoadResult>),
}

/// Per-ticker TTL cache with single-flight loads: while a load is running,
/// later callers for the same ticker wait on it instead of fetching again.
/// Failures are handed to every waiter and nothing is cached, so the next
/// call starts over. Loads run in a detached task, so a caller that
/// disconnects mid-load still lets it complete and populate the cache.
pub struct FinancialsCache {
    ttl: Duration,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl FinancialsCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get_or_load<F, Fut>(&self, ticker: &str, loader: F) -> LoadResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FinancialHistory, AnalysisError>> + Send + 'static,
    {
        let mut rx = {
            let mut slots = self.slots.lock().await;

            let fresh = match slots.get(ticker) {
                Some(Slot::Ready { value, inserted_at }) if inserted_at.elapsed() < self.ttl => {
                    Some(value.clone())
                }
                _ => None,
            };
            if let Some(value) = fresh {
                info!("Cache hit for {}", ticker);
                return Ok(value);
            }

            if let Some(Slot::InFlight(tx)) = slots.get(ticker) {
                info!("Joining in-flight load for {}", ticker);
                tx.subscribe()
            } else {
                // Install the in-flight marker before releasing the lock so
                // no second loader can start for this ticker.
                let (tx, rx) = broadcast::channel(1);
                slots.insert(ticker.to_string(), Slot::InFlight(tx.clone()));

                info!("Cache miss for {}, loading", ticker);
                let slots_handle = self.slots.clone();
                let load_ticker = ticker.to_string();
                let fut = loader();
                tokio::spawn(async move {
                    let result = fut.await.map(Arc::new);

                    let mut slots = slots_handle.lock().await;
                    slots.remove(&load_ticker);
                    match &result {
                        Ok(value) => {
                            slots.insert(
                                load_ticker.clone(),
                                Slot::Ready {
                                    value: value.clone(),
                                    inserted_at: Instant::now(),
                                },
                            );
                        }
                        Err(e) => error!("Load for {} failed, not caching: {}", load_ticker, e),
                    }
                    drop(slots);

                    // No waiters is fine.
                    let _ = tx.send(result);
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Fetch(format!("load for {} was abandoned", ticker))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn history(ticker: &str) -> FinancialHistory {
        FinancialHistory {
            ticker: ticker.to_string(),
            company_name: "Test Plc".to_string(),
            periods: vec!["2023".to_string(), "2022".to_string()],
            revenue: vec![Some(2100.0), Some(1700.0)],
            profit_after_tax: vec![Some(676.9), Some(223.9)],
            eps: vec![Some(21.1), Some(7.1)],
            dps: vec![Some(4.0), Some(3.2)],
            total_debt: vec![Some(100.0), Some(120.0)],
            shareholders_equity: vec![Some(300.0), Some(250.0)],
            operating_cash_flow: vec![Some(500.0), Some(400.0)],
        }
    }

    #[tokio::test]
    async fn concurrent_loads_collapse_to_one() {
        let cache = Arc::new(FinancialsCache::with_ttl(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load("ZENITHBANK", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(history("ZENITHBANK"))
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[tokio::test]
    async fn failure_reaches_all_waiters_and_is_not_cached() {
        let cache = Arc::new(FinancialsCache::with_ttl(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load("GTCO", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err(AnalysisError::Fetch("upstream down".to_string()))
                    })
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Nothing was cached, a later call loads again.
        let result = cache
            .get_or_load("GTCO", || async move { Ok(history("GTCO")) })
            .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_the_ttl() {
        let cache = FinancialsCache::with_ttl(Duration::from_millis(80));
        let calls = Arc::new(AtomicUsize::new(0));

        let load = |calls: &Arc<AtomicUsize>| {
            let calls = calls.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(history("MTNN"))
            }
        };

        let first = cache.get_or_load("MTNN", load(&calls)).await.unwrap();
        let second = cache.get_or_load("MTNN", load(&calls)).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let third = cache.get_or_load("MTNN", load(&calls)).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abandoned_caller_still_populates_the_cache() {
        let cache = Arc::new(FinancialsCache::with_ttl(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load("MTNN", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(history("MTNN"))
                    })
                    .await
            })
        };

        // Drop the first caller mid-load, like a client disconnect.
        tokio::time::sleep(Duration::from_millis(50)).await;
        leader.abort();

        let fallback_calls = calls.clone();
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            cache.get_or_load("MTNN", move || async move {
                fallback_calls.fetch_add(1, Ordering::SeqCst);
                Ok(history("MTNN"))
            }),
        )
        .await
        .expect("later caller must not block on an abandoned load")
        .unwrap();

        assert_eq!(result.ticker, "MTNN");
        // The original load finished and was cached, the second loader never ran.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tickers_do_not_poison_each_other() {
        let cache = FinancialsCache::with_ttl(Duration::from_secs(60));

        let failed = cache
            .get_or_load("UBA", || async {
                Err(AnalysisError::Extraction("format drift".to_string()))
            })
            .await;
        assert!(failed.is_err());

        let ok = cache
            .get_or_load("DANGCEM", || async { Ok(history("DANGCEM")) })
            .await;
        assert!(ok.is_ok());
    }
}
