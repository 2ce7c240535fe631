// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stockanalysis.com statement page a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    /// URL path segment under `<base>/<ticker>/`.
    pub fn path(&self) -> &'static str {
        match self {
            StatementKind::Income => "financials/",
            StatementKind::Balance => "financials/balance-sheet/",
            StatementKind::CashFlow => "financials/cash-flow-statement/",
        }
    }
}

/// Partial per-statement extraction. Only the series carried by the source
/// statement kind are populated; everything else stays empty. Transient,
/// consumed by the assembler.
#[derive(Debug, Default, Clone)]
pub struct StatementRecord {
    pub periods: Vec<String>,
    pub revenue: Vec<Option<f64>>,
    pub profit_after_tax: Vec<Option<f64>>,
    pub eps: Vec<Option<f64>>,
    pub dps: Vec<Option<f64>>,
    pub total_debt: Vec<Option<f64>>,
    pub shareholders_equity: Vec<Option<f64>>,
    pub operating_cash_flow: Vec<Option<f64>>,
}

/// Aligned financial history for one ticker, most recent fiscal year first.
/// Every series shares the `periods` ordering; a `None` entry means the
/// source never published that figure for that year.
#[derive(Debug, Clone)]
pub struct FinancialHistory {
    pub ticker: String,
    pub company_name: String,
    pub periods: Vec<String>,
    pub revenue: Vec<Option<f64>>,
    pub profit_after_tax: Vec<Option<f64>>,
    pub eps: Vec<Option<f64>>,
    pub dps: Vec<Option<f64>>,
    pub total_debt: Vec<Option<f64>>,
    pub shareholders_equity: Vec<Option<f64>>,
    pub operating_cash_flow: Vec<Option<f64>>,
}

/// Tri-state outcome of one metric rule, plus an explicit "could not judge"
/// state that counts toward neither green nor red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    Green,
    Yellow,
    Red,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

/// One scored Napkin Math metric.
#[derive(Debug, Clone, Serialize)]
pub struct NapkinMetric {
    pub name: String,
    pub current_value: Option<f64>,
    pub previous_value: Option<f64>,
    /// YoY percentage change where the rule is trend-based.
    pub yoy_change: Option<f64>,
    pub signal: Signal,
    pub explanation: String,
}

/// Full analysis of one ticker: the eight metrics, their signal counts and
/// the overall recommendation. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct NapkinResult {
    pub ticker: String,
    pub company_name: String,
    pub current_year: String,
    pub previous_year: String,
    pub metrics: Vec<NapkinMetric>,
    pub green_count: usize,
    pub yellow_count: usize,
    pub red_count: usize,
    pub recommendation: Recommendation,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}
