// src/services/mod.rs
pub mod analyzer;
pub mod assemble;
pub mod cache;
pub mod extract;
pub mod fetcher;
pub mod financials;
pub mod tickers;
