// src/services/tickers.rs
use serde::Serialize;

/// NGX tickers the frontend can search and analyze, with company names.
/// Compiled in: the listing changes rarely and the upstream source keys
/// its URLs by these symbols.
pub static NGX_TICKERS: &[(&str, &str)] = &[
    ("ACCESSCORP", "Access Holdings"),
    ("AIRTELAFRI", "Airtel Africa"),
    ("BUACEMENT", "BUA Cement"),
    ("BUAFOODS", "BUA Foods"),
    ("CADBURY", "Cadbury Nigeria"),
    ("CONOIL", "Conoil"),
    ("DANGCEM", "Dangote Cement"),
    ("DANGSUGAR", "Dangote Sugar Refinery"),
    ("ETI", "Ecobank Transnational Incorporated"),
    ("FIDELITYBK", "Fidelity Bank"),
    ("FIDSON", "Fidson Healthcare"),
    ("FLOURMILL", "Flour Mills of Nigeria"),
    ("GEREGU", "Geregu Power"),
    ("GTCO", "Guaranty Trust Holding Company"),
    ("GUINNESS", "Guinness Nigeria"),
    ("INTBREW", "International Breweries"),
    ("JBERGER", "Julius Berger Nigeria"),
    ("LAFARGE", "Lafarge Africa"),
    ("MAYBAKER", "May & Baker Nigeria"),
    ("MTNN", "MTN Nigeria Communications"),
    ("NAHCO", "Nigerian Aviation Handling Company"),
    ("NB", "Nigerian Breweries"),
    ("NESTLE", "Nestle Nigeria"),
    ("OANDO", "Oando"),
    ("OKOMUOIL", "Okomu Oil Palm"),
    ("PRESCO", "Presco"),
    ("PZ", "PZ Cussons Nigeria"),
    ("SEPLAT", "Seplat Energy"),
    ("STANBIC", "Stanbic IBTC Holdings"),
    ("STERLINGNG", "Sterling Financial Holdings"),
    ("TOTALENERG", "TotalEnergies Marketing Nigeria"),
    ("TRANSCORP", "Transnational Corporation"),
    ("TRANSPOWER", "Transcorp Power"),
    ("UBA", "United Bank for Africa"),
    ("UCAP", "United Capital"),
    ("UNILEVER", "Unilever Nigeria"),
    ("WAPCO", "Lafarge Africa (WAPCO)"),
    ("WEMABANK", "Wema Bank"),
    ("ZENITHBANK", "Zenith Bank"),
];

const MAX_MATCHES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerMatch {
    pub ticker: String,
    pub name: String,
}

pub fn is_known(ticker: &str) -> bool {
    company_name(ticker).is_some()
}

pub fn company_name(ticker: &str) -> Option<&'static str> {
    NGX_TICKERS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(ticker.trim()))
        .map(|(_, name)| *name)
}

/// Substring search over tickers and company names. Ticker prefix matches
/// rank first, then ticker substrings, then name substrings.
pub fn search(query: &str) -> Vec<TickerMatch> {
    let q = query.trim().to_uppercase();
    if q.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(u8, TickerMatch)> = NGX_TICKERS
        .iter()
        .filter_map(|(ticker, name)| {
            let rank = if ticker.starts_with(&q) {
                0
            } else if ticker.contains(&q) {
                1
            } else if name.to_uppercase().contains(&q) {
                2
            } else {
                return None;
            };
            Some((
                rank,
                TickerMatch {
                    ticker: ticker.to_string(),
                    name: name.to_string(),
                },
            ))
        })
        .collect();

    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.ticker.cmp(&b.1.ticker)));
    ranked.into_iter().take(MAX_MATCHES).map(|(_, m)| m).collect()
}
