// src/services/extract.rs
//
// stockanalysis.com renders statement pages with SvelteKit and inlines the
// statement figures as a JS object literal after a `financialData:` marker.
// The object uses unquoted keys and bare decimals, so it has to be repaired
// into JSON before serde_json can parse it. The key set is an upstream
// contract we do not control; a missing array is tolerated as nulls, only a
// missing marker or a broken payload is fatal.
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::models::{StatementKind, StatementRecord};

const MARKER: &str = "financialData:";
const MARKER_QUOTED: &str = "\"financialData\":";

static BARE_KEYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([{,])\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#).unwrap());
static BARE_DECIMALS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([:,\[])\s*(-?)\.([0-9])"#).unwrap());

/// Locate the object literal that follows the marker and return exactly the
/// substring from its opening `{` to the matching `}`. Brace depth is tracked
/// through nested objects, and braces inside quoted strings are ignored.
fn embedded_object(html: &str) -> Result<&str, AnalysisError> {
    // Pages carry the key either bare (a JS object literal) or quoted
    // (already-serialized JSON). Accept both.
    let after = if let Some(at) = html.find(MARKER) {
        &html[at + MARKER.len()..]
    } else if let Some(at) = html.find(MARKER_QUOTED) {
        &html[at + MARKER_QUOTED.len()..]
    } else {
        return Err(AnalysisError::Extraction(format!(
            "`{}` marker not found in page",
            MARKER
        )));
    };
    let open = after
        .find('{')
        .ok_or_else(|| AnalysisError::Extraction("no object literal after marker".to_string()))?;
    let body = &after[open..];

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&body[..i + 1]);
                }
            }
            _ => {}
        }
    }
    Err(AnalysisError::Extraction("unterminated object literal after marker".to_string()))
}

/// Turn the JS object literal into valid JSON: quote bare keys and pad
/// leading-dot number literals (`.28` and `-.28`).
fn repair_json(raw: &str) -> String {
    let quoted = BARE_KEYS.replace_all(raw, "$1\"$2\":");
    BARE_DECIMALS.replace_all(&quoted, "${1}${2}0.${3}").into_owned()
}

/// Fiscal period labels, `fiscalYear` first, `datekey` as fallback.
/// Full dates like "2023-12-31" are truncated to the year.
fn period_labels(data: &Value) -> Vec<String> {
    let arr = data
        .get("fiscalYear")
        .and_then(Value::as_array)
        .or_else(|| data.get("datekey").and_then(Value::as_array));
    let Some(arr) = arr else {
        return Vec::new();
    };
    arr.iter()
        .map(|v| match v {
            Value::String(s) if s.contains('-') && s.len() > 4 => {
                s.get(..4).unwrap_or(s).to_string()
            }
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read one metric array, padded or truncated to the period count. An absent
/// key is upstream drift we tolerate: the whole series becomes nulls.
fn series(data: &Value, key: &str, len: usize) -> Vec<Option<f64>> {
    let mut out: Vec<Option<f64>> = match data.get(key).and_then(Value::as_array) {
        Some(arr) => arr.iter().map(numeric).collect(),
        None => {
            warn!("embedded payload has no `{}` array, series treated as missing", key);
            Vec::new()
        }
    };
    out.resize(len, None);
    out
}

/// Drop trailing-twelve-month columns so that YoY comparisons line up on
/// full fiscal years.
fn drop_ttm_columns(record: &mut StatementRecord) {
    let mut keep: Vec<bool> = record
        .periods
        .iter()
        .map(|p| !p.eq_ignore_ascii_case("ttm"))
        .collect();
    // Under the `datekey` fallback a TTM column truncates to the same year
    // as the latest full fiscal column. Drop that leading duplicate too.
    if record.periods.len() >= 2 && record.periods[0] == record.periods[1] {
        keep[0] = false;
    }
    if keep.iter().all(|k| *k) {
        return;
    }

    fn filter<T>(values: &mut Vec<T>, keep: &[bool]) {
        let mut flags = keep.iter().copied();
        values.retain(|_| flags.next().unwrap_or(true));
    }

    filter(&mut record.revenue, &keep);
    filter(&mut record.profit_after_tax, &keep);
    filter(&mut record.eps, &keep);
    filter(&mut record.dps, &keep);
    filter(&mut record.total_debt, &keep);
    filter(&mut record.shareholders_equity, &keep);
    filter(&mut record.operating_cash_flow, &keep);
    filter(&mut record.periods, &keep);
}

/// Extract the statement figures embedded in a page.
pub fn extract(html: &str, kind: StatementKind) -> Result<StatementRecord, AnalysisError> {
    let object = embedded_object(html)?;
    let json = repair_json(object);
    let data: Value = serde_json::from_str(&json)
        .map_err(|e| AnalysisError::Extraction(format!("embedded payload is not well-formed: {}", e)))?;

    let periods = period_labels(&data);
    let len = periods.len();

    let mut record = StatementRecord {
        periods,
        ..StatementRecord::default()
    };
    match kind {
        StatementKind::Income => {
            record.revenue = series(&data, "revenue", len);
            record.profit_after_tax = series(&data, "netinc", len);
            record.eps = series(&data, "epsBasic", len);
            record.dps = series(&data, "dps", len);
        }
        StatementKind::Balance => {
            record.total_debt = series(&data, "debt", len);
            record.shareholders_equity = series(&data, "equity", len);
        }
        StatementKind::CashFlow => {
            record.operating_cash_flow = series(&data, "ncfo", len);
        }
    }
    drop_ttm_columns(&mut record);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income_page() -> String {
        // Unquoted keys and a bare decimal, as SvelteKit emits them.
        "<script>const data=[{type:\"data\",data:{financialData:{\
fiscalYear:[\"TTM\",\"2023\",\"2022\"],\
datekey:[\"2024-06-30\",\"2023-12-31\",\"2022-12-31\"],\
revenue:[2300,2100,1700],netinc:[700,676.9,223.9],\
epsBasic:[21.5,21.1,7.1],dps:[4,4,3.2],payoutratio:[.19,.19,.45]},\
other:{nested:{deep:1}}}}]</script>"
            .to_string()
    }

    #[test]
    fn extracts_exactly_the_balanced_object() {
        let html = "junk financialData:{a:{b:{c:\"}}}\"}},d:[1,2]} trailing {}";
        let object = embedded_object(html).unwrap();
        assert_eq!(object, "{a:{b:{c:\"}}}\"}},d:[1,2]}");
    }

    #[test]
    fn income_statement_round_trip() {
        let record = extract(&income_page(), StatementKind::Income).unwrap();
        // TTM column dropped, full fiscal years kept most recent first.
        assert_eq!(record.periods, vec!["2023", "2022"]);
        assert_eq!(record.revenue, vec![Some(2100.0), Some(1700.0)]);
        assert_eq!(record.profit_after_tax, vec![Some(676.9), Some(223.9)]);
        assert_eq!(record.eps, vec![Some(21.1), Some(7.1)]);
        assert_eq!(record.dps, vec![Some(4.0), Some(3.2)]);
        assert!(record.total_debt.is_empty());
    }

    #[test]
    fn missing_dps_array_degrades_to_nulls() {
        let html = "<script>financialData:{fiscalYear:[\"2023\",\"2022\"],\
revenue:[2100,1700],netinc:[676.9,223.9],epsBasic:[21.1,7.1]}</script>";
        let record = extract(html, StatementKind::Income).unwrap();
        assert_eq!(record.dps, vec![None, None]);
        assert_eq!(record.revenue, vec![Some(2100.0), Some(1700.0)]);
    }

    #[test]
    fn null_entries_become_none() {
        let html = "financialData:{fiscalYear:[\"2023\",\"2022\"],debt:[null,120.5],equity:[300,null]}";
        let record = extract(html, StatementKind::Balance).unwrap();
        assert_eq!(record.total_debt, vec![None, Some(120.5)]);
        assert_eq!(record.shareholders_equity, vec![Some(300.0), None]);
    }

    #[test]
    fn bare_decimals_are_repaired() {
        let html = "financialData:{fiscalYear:[\"2023\"],ncfo:[.75]}";
        let record = extract(html, StatementKind::CashFlow).unwrap();
        assert_eq!(record.operating_cash_flow, vec![Some(0.75)]);

        let html = "financialData:{fiscalYear:[\"2023\"],ncfo:[-.5]}";
        let record = extract(html, StatementKind::CashFlow).unwrap();
        assert_eq!(record.operating_cash_flow, vec![Some(-0.5)]);
    }

    #[test]
    fn datekey_fallback_truncates_to_year() {
        let html = "financialData:{datekey:[\"2023-12-31\",\"2022-12-31\"],ncfo:[10,12]}";
        let record = extract(html, StatementKind::CashFlow).unwrap();
        assert_eq!(record.periods, vec!["2023", "2022"]);
    }

    #[test]
    fn quoted_marker_form_is_accepted() {
        let html = "<script>{\"financialData\":{\"fiscalYear\":[\"2023\",\"2022\"],\
\"revenue\":[2100,1700],\"netinc\":[676.9,223.9],\"epsBasic\":[21.1,7.1],\"dps\":[4,3.2]}}</script>";
        let record = extract(html, StatementKind::Income).unwrap();
        assert_eq!(record.periods, vec!["2023", "2022"]);
        assert_eq!(record.revenue, vec![Some(2100.0), Some(1700.0)]);
        assert_eq!(record.eps, vec![Some(21.1), Some(7.1)]);
    }

    #[test]
    fn datekey_ttm_column_sharing_the_latest_year_is_dropped() {
        // No fiscalYear array: the TTM date truncates to "2023", colliding
        // with the latest full fiscal year.
        let html = "financialData:{datekey:[\"2023-06-30\",\"2023-12-31\",\"2022-12-31\"],\
ncfo:[11,10,12]}";
        let record = extract(html, StatementKind::CashFlow).unwrap();
        assert_eq!(record.periods, vec!["2023", "2022"]);
        assert_eq!(record.operating_cash_flow, vec![Some(10.0), Some(12.0)]);
    }

    #[test]
    fn missing_marker_is_fatal() {
        let err = extract("<html>no data here</html>", StatementKind::Income).unwrap_err();
        assert!(matches!(err, AnalysisError::Extraction(_)));
    }

    #[test]
    fn unterminated_payload_is_fatal() {
        let err = extract("financialData:{fiscalYear:[\"2023\"", StatementKind::Income).unwrap_err();
        assert!(matches!(err, AnalysisError::Extraction(_)));
    }
}
