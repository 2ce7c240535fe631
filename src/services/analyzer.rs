// src/services/analyzer.rs
//
// The eight Napkin Math checks. Each rule looks at the latest fiscal year
// against its own history or a fixed threshold and produces one signal.
// A metric that cannot be judged from the available periods scores
// insufficient-data, which counts toward neither the green nor the red total.
use chrono::Utc;

use crate::models::{FinancialHistory, NapkinMetric, NapkinResult, Recommendation, Signal};

fn at(series: &[Option<f64>], idx: usize) -> Option<f64> {
    series.get(idx).copied().flatten()
}

fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(c), Some(p)) if p != 0.0 => Some((c - p) / p.abs() * 100.0),
        _ => None,
    }
}

/// Format a Naira amount with a T/B/M suffix.
fn fmt_naira(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{}\u{20a6}{:.2}T", sign, abs / 1e12)
    } else if abs >= 1e9 {
        format!("{}\u{20a6}{:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}\u{20a6}{:.2}M", sign, abs / 1e6)
    } else {
        format!("{}\u{20a6}{:.2}", sign, abs)
    }
}

fn metric(
    name: &str,
    current: Option<f64>,
    previous: Option<f64>,
    yoy: Option<f64>,
    signal: Signal,
    explanation: String,
) -> NapkinMetric {
    NapkinMetric {
        name: name.to_string(),
        current_value: current,
        previous_value: previous,
        yoy_change: yoy,
        signal,
        explanation,
    }
}

fn evaluate_revenue(h: &FinancialHistory) -> NapkinMetric {
    let current = at(&h.revenue, 0);
    let previous = at(&h.revenue, 1);
    let yoy = pct_change(current, previous);

    let (signal, explanation) = match yoy {
        Some(yoy) if yoy >= 10.0 => (
            Signal::Green,
            format!("Revenue grew {:.1}% YoY, above the 10% growth threshold", yoy),
        ),
        Some(yoy) if yoy > 0.0 => (
            Signal::Yellow,
            format!("Revenue grew {:.1}% YoY, positive but below the 10% ideal", yoy),
        ),
        Some(yoy) => (
            Signal::Red,
            format!("Revenue changed {:.1}% YoY, flat or declining revenue is a red flag", yoy),
        ),
        None => (
            Signal::InsufficientData,
            "Fewer than two revenue figures available for a YoY comparison".to_string(),
        ),
    };
    metric("Revenue", current, previous, yoy, signal, explanation)
}

fn evaluate_pat(h: &FinancialHistory) -> NapkinMetric {
    let current = at(&h.profit_after_tax, 0);
    let previous = at(&h.profit_after_tax, 1);
    let yoy = pct_change(current, previous);

    let (signal, explanation) = match (current, previous) {
        (Some(c), Some(p)) if c > p => (
            Signal::Green,
            format!(
                "Profit After Tax rose from {} to {}, profitability is improving",
                fmt_naira(p),
                fmt_naira(c)
            ),
        ),
        (Some(c), Some(p)) if c < p => (
            Signal::Red,
            format!(
                "Profit After Tax fell from {} to {}, profit decline is a warning",
                fmt_naira(p),
                fmt_naira(c)
            ),
        ),
        (Some(_), Some(_)) => (
            Signal::Yellow,
            "Profit After Tax was flat YoY".to_string(),
        ),
        _ => (
            Signal::InsufficientData,
            "Fewer than two Profit After Tax figures available".to_string(),
        ),
    };
    metric("Profit After Tax", current, previous, yoy, signal, explanation)
}

fn evaluate_eps(h: &FinancialHistory) -> NapkinMetric {
    let current = at(&h.eps, 0);
    let previous = at(&h.eps, 1);
    let older = at(&h.eps, 2);
    let yoy = pct_change(current, previous);

    let (signal, explanation) = match (current, previous) {
        (Some(c), Some(p)) if c > p => (
            Signal::Green,
            format!("EPS increased from \u{20a6}{:.2} to \u{20a6}{:.2}", p, c),
        ),
        (Some(c), Some(p)) if c < p => match older {
            // A one-year dip stays yellow; two consecutive falling years is red.
            Some(o) if p < o => (
                Signal::Red,
                format!(
                    "EPS has fallen two years running (\u{20a6}{:.2} to \u{20a6}{:.2} to \u{20a6}{:.2})",
                    o, p, c
                ),
            ),
            _ => (
                Signal::Yellow,
                format!("EPS dipped from \u{20a6}{:.2} to \u{20a6}{:.2} this year", p, c),
            ),
        },
        (Some(_), Some(_)) => (Signal::Yellow, "EPS was flat YoY".to_string()),
        _ => (
            Signal::InsufficientData,
            "Fewer than two EPS figures available".to_string(),
        ),
    };
    metric("Earnings Per Share (EPS)", current, previous, yoy, signal, explanation)
}

fn evaluate_dps(h: &FinancialHistory) -> NapkinMetric {
    let current = at(&h.dps, 0);
    let previous = at(&h.dps, 1);
    let yoy = pct_change(current, previous);

    let (signal, explanation) = if h.dps.iter().all(Option::is_none) {
        (
            Signal::InsufficientData,
            "No dividend data published for this stock".to_string(),
        )
    } else {
        match (current, previous) {
            (Some(c), Some(p)) if p > 0.0 && c <= 0.0 => (
                Signal::Red,
                format!("Dividend was cut to zero after paying \u{20a6}{:.2} per share", p),
            ),
            (None, Some(p)) if p > 0.0 => (
                Signal::Red,
                format!("Dividend skipped, nothing reported after paying \u{20a6}{:.2} per share", p),
            ),
            (Some(c), Some(p)) if p > 0.0 && c < p => (
                Signal::Red,
                format!("DPS cut from \u{20a6}{:.2} to \u{20a6}{:.2}", p, c),
            ),
            (Some(c), Some(p)) if c > 0.0 && c >= p => (
                Signal::Green,
                format!("DPS steady or rising at \u{20a6}{:.2} per share", c),
            ),
            (Some(_), Some(_)) => (
                Signal::Yellow,
                "No dividend paid in either year, not unusual for growth names".to_string(),
            ),
            _ => (
                Signal::InsufficientData,
                "Not enough dividend history to judge the trend".to_string(),
            ),
        }
    };
    metric("Dividend Per Share (DPS)", current, previous, yoy, signal, explanation)
}

fn evaluate_payout_ratio(h: &FinancialHistory) -> NapkinMetric {
    let dps = at(&h.dps, 0);
    let eps = at(&h.eps, 0);

    let (ratio, signal, explanation) = match (dps, eps) {
        (Some(d), Some(e)) if e > 0.0 => {
            let ratio = d / e * 100.0;
            let (signal, explanation) = if (30.0..=70.0).contains(&ratio) {
                (
                    Signal::Green,
                    format!("Payout ratio of {:.0}% sits in the healthy 30-70% range", ratio),
                )
            } else if ratio > 100.0 {
                (
                    Signal::Red,
                    format!("Payout ratio of {:.0}% exceeds 100%, paying out more than earned", ratio),
                )
            } else if ratio < 30.0 {
                (
                    Signal::Yellow,
                    format!("Payout ratio of {:.0}% is low, most earnings are retained", ratio),
                )
            } else {
                (
                    Signal::Yellow,
                    format!("Payout ratio of {:.0}% is high, approaching the sustainability limit", ratio),
                )
            };
            (Some(ratio), signal, explanation)
        }
        (Some(_), Some(_)) => (
            None,
            Signal::Yellow,
            "EPS is zero or negative, payout ratio is not meaningful".to_string(),
        ),
        _ => (
            None,
            Signal::InsufficientData,
            "DPS or EPS missing for the latest year".to_string(),
        ),
    };
    metric("Payout Ratio", ratio, None, None, signal, explanation)
}

fn evaluate_debt_to_equity(h: &FinancialHistory) -> NapkinMetric {
    let debt = at(&h.total_debt, 0);
    let equity = at(&h.shareholders_equity, 0);

    let (ratio, signal, explanation) = match (debt, equity) {
        (Some(d), Some(e)) if e > 0.0 => {
            let ratio = d / e;
            let (signal, explanation) = if ratio < 1.5 {
                (
                    Signal::Green,
                    format!("D/E of {:.2}x is below the 1.5x comfort level", ratio),
                )
            } else if ratio > 2.0 {
                (
                    Signal::Red,
                    format!("D/E of {:.2}x exceeds 2.0x, the debt burden is a red flag", ratio),
                )
            } else {
                (
                    Signal::Yellow,
                    format!("D/E of {:.2}x is moderate, between the 1.5x and 2.0x marks", ratio),
                )
            };
            (Some(ratio), signal, explanation)
        }
        (Some(_), Some(e)) if e < 0.0 => (
            None,
            Signal::Red,
            "Negative shareholders' equity, liabilities exceed assets".to_string(),
        ),
        (Some(_), Some(_)) => (
            None,
            Signal::Yellow,
            "Shareholders' equity is zero, D/E is not meaningful".to_string(),
        ),
        _ => (
            None,
            Signal::InsufficientData,
            "Total debt or shareholders' equity missing for the latest year".to_string(),
        ),
    };
    metric("Debt-to-Equity", ratio, None, None, signal, explanation)
}

fn evaluate_roe(h: &FinancialHistory) -> NapkinMetric {
    let pat = at(&h.profit_after_tax, 0);
    let equity = at(&h.shareholders_equity, 0);

    let (roe, signal, explanation) = match (pat, equity) {
        (Some(p), Some(e)) if e > 0.0 => {
            let roe = p / e * 100.0;
            let (signal, explanation) = if roe > 15.0 {
                (
                    Signal::Green,
                    format!("ROE of {:.1}% is above the 15% threshold, strong returns", roe),
                )
            } else if roe < 8.0 {
                (
                    Signal::Red,
                    format!("ROE of {:.1}% is below 8%, poor return on equity", roe),
                )
            } else {
                (
                    Signal::Yellow,
                    format!("ROE of {:.1}% is moderate, between 8% and 15%", roe),
                )
            };
            (Some(roe), signal, explanation)
        }
        (Some(_), Some(_)) => (
            None,
            Signal::Yellow,
            "Shareholders' equity is zero or negative, ROE is not meaningful".to_string(),
        ),
        _ => (
            None,
            Signal::InsufficientData,
            "Profit After Tax or shareholders' equity missing for the latest year".to_string(),
        ),
    };
    metric("Return on Equity (ROE)", roe, None, None, signal, explanation)
}

fn evaluate_operating_cash_flow(h: &FinancialHistory) -> NapkinMetric {
    let current = at(&h.operating_cash_flow, 0);
    let previous = at(&h.operating_cash_flow, 1);
    let yoy = pct_change(current, previous);

    let (signal, explanation) = match (current, previous) {
        (Some(c), Some(p)) if c < 0.0 && p < 0.0 => (
            Signal::Red,
            format!(
                "Operating cash flow negative two years running ({} latest), business is burning cash",
                fmt_naira(c)
            ),
        ),
        (Some(c), Some(_)) if c < 0.0 => (
            Signal::Yellow,
            format!("Operating cash flow turned negative this year ({})", fmt_naira(c)),
        ),
        (Some(c), Some(p)) if c > 0.0 && c > p => (
            Signal::Green,
            format!("Operating cash flow of {} is positive and growing", fmt_naira(c)),
        ),
        (Some(c), Some(_)) => (
            Signal::Yellow,
            format!("Operating cash flow of {} is positive but not growing", fmt_naira(c)),
        ),
        _ => (
            Signal::InsufficientData,
            "Fewer than two operating cash flow figures available".to_string(),
        ),
    };
    metric("Operating Cash Flow", current, previous, yoy, signal, explanation)
}

/// Reduce green/red counts to one decision. SELL wins first so a stock with
/// many greens and two reds still reads SELL.
pub fn recommend(green_count: usize, red_count: usize) -> Recommendation {
    if red_count >= 2 {
        Recommendation::Sell
    } else if green_count >= 4 {
        Recommendation::Buy
    } else {
        Recommendation::Hold
    }
}

/// Score the eight Napkin Math metrics and reduce them to a recommendation.
pub fn analyze(history: &FinancialHistory) -> NapkinResult {
    let metrics = vec![
        evaluate_revenue(history),
        evaluate_pat(history),
        evaluate_eps(history),
        evaluate_dps(history),
        evaluate_payout_ratio(history),
        evaluate_debt_to_equity(history),
        evaluate_roe(history),
        evaluate_operating_cash_flow(history),
    ];

    let green_count = metrics.iter().filter(|m| m.signal == Signal::Green).count();
    let yellow_count = metrics.iter().filter(|m| m.signal == Signal::Yellow).count();
    let red_count = metrics.iter().filter(|m| m.signal == Signal::Red).count();

    let recommendation = recommend(green_count, red_count);
    let summary = match recommendation {
        Recommendation::Sell => format!(
            "SELL/AVOID, {} red flags detected across the eight checks",
            red_count
        ),
        Recommendation::Buy => format!(
            "BUY, {}/8 metrics look strong with {} red flag(s)",
            green_count, red_count
        ),
        Recommendation::Hold => format!(
            "HOLD, {} green, {} neutral, {} red, no strong signal either way",
            green_count, yellow_count, red_count
        ),
    };

    NapkinResult {
        ticker: history.ticker.clone(),
        company_name: history.company_name.clone(),
        current_year: history.periods.first().cloned().unwrap_or_default(),
        previous_year: history.periods.get(1).cloned().unwrap_or_default(),
        metrics,
        green_count,
        yellow_count,
        red_count,
        recommendation,
        summary,
        generated_at: Utc::now(),
    }
}
