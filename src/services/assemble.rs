// src/services/assemble.rs
use crate::error::AnalysisError;
use crate::models::{FinancialHistory, StatementRecord};

/// Merge the three statement extractions into one aligned history.
///
/// The merged period axis is the union of the labels reported by any
/// statement, kept in first-seen order (income, then balance, then cash
/// flow), never reordered or interpolated. A statement that lacks a period
/// contributes nulls for it. Only three empty period lists are an error.
pub fn assemble(
    ticker: &str,
    company_name: &str,
    income: StatementRecord,
    balance: StatementRecord,
    cashflow: StatementRecord,
) -> Result<FinancialHistory, AnalysisError> {
    let mut periods: Vec<String> = Vec::new();
    for record in [&income, &balance, &cashflow] {
        for label in &record.periods {
            if !periods.iter().any(|p| p == label) {
                periods.push(label.clone());
            }
        }
    }
    if periods.is_empty() {
        return Err(AnalysisError::Assembly(format!(
            "{}: no statement reported any fiscal period",
            ticker
        )));
    }

    let pick = |record: &StatementRecord, series: &[Option<f64>]| -> Vec<Option<f64>> {
        periods
            .iter()
            .map(|label| {
                record
                    .periods
                    .iter()
                    .position(|p| p == label)
                    .and_then(|i| series.get(i).copied().flatten())
            })
            .collect()
    };

    Ok(FinancialHistory {
        ticker: ticker.to_string(),
        company_name: company_name.to_string(),
        revenue: pick(&income, &income.revenue),
        profit_after_tax: pick(&income, &income.profit_after_tax),
        eps: pick(&income, &income.eps),
        dps: pick(&income, &income.dps),
        total_debt: pick(&balance, &balance.total_debt),
        shareholders_equity: pick(&balance, &balance.shareholders_equity),
        operating_cash_flow: pick(&cashflow, &cashflow.operating_cash_flow),
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(periods: &[&str]) -> StatementRecord {
        StatementRecord {
            periods: periods.iter().map(|p| p.to_string()).collect(),
            ..StatementRecord::default()
        }
    }

    #[test]
    fn identical_periods_stay_in_order_without_duplicates() {
        let mut income = record(&["2023", "2022"]);
        income.revenue = vec![Some(2100.0), Some(1700.0)];
        let balance = record(&["2023", "2022"]);
        let cashflow = record(&["2023", "2022"]);

        let history = assemble("MTNN", "MTN Nigeria", income, balance, cashflow).unwrap();
        assert_eq!(history.periods, vec!["2023", "2022"]);
        assert_eq!(history.revenue, vec![Some(2100.0), Some(1700.0)]);
    }

    #[test]
    fn disagreeing_periods_union_with_nulls() {
        let mut income = record(&["2023", "2022"]);
        income.eps = vec![Some(21.1), Some(7.1)];
        let mut balance = record(&["2023", "2022", "2021"]);
        balance.total_debt = vec![Some(100.0), Some(120.0), Some(150.0)];
        balance.shareholders_equity = vec![Some(300.0), Some(250.0), Some(200.0)];
        let mut cashflow = record(&["2023"]);
        cashflow.operating_cash_flow = vec![Some(500.0)];

        let history = assemble("GTCO", "Guaranty Trust Holding", income, balance, cashflow).unwrap();
        assert_eq!(history.periods, vec!["2023", "2022", "2021"]);
        assert_eq!(history.eps, vec![Some(21.1), Some(7.1), None]);
        assert_eq!(history.total_debt, vec![Some(100.0), Some(120.0), Some(150.0)]);
        assert_eq!(history.operating_cash_flow, vec![Some(500.0), None, None]);
    }

    #[test]
    fn all_empty_statements_fail_assembly() {
        let err = assemble(
            "NEWLISTING",
            "New Listing Plc",
            StatementRecord::default(),
            StatementRecord::default(),
            StatementRecord::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Assembly(_)));
    }

    #[test]
    fn short_series_are_padded_with_nulls() {
        let mut income = record(&["2023", "2022"]);
        income.revenue = vec![Some(2100.0)];
        let history = assemble(
            "WEMABANK",
            "Wema Bank",
            income,
            record(&[]),
            record(&[]),
        )
        .unwrap();
        assert_eq!(history.revenue, vec![Some(2100.0), None]);
    }
}
