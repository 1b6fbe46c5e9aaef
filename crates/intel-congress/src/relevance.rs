/// An investor's holding: the ticker and the sector it belongs to.
#[derive(Debug, Clone)]
pub struct OwnedTicker {
    pub ticker: String,
    pub sector: Option<String>,
}

/// Deterministic relevance score for an article given its extracted tickers
/// and sector against a watchlist of owned tickers: base 0.5, +0.3 if any
/// extracted ticker is owned, +0.2 if the article's sector matches any
/// owned ticker's sector, clamped to [0, 1].
pub fn relevance_score(extracted_tickers: &[String], sector: Option<&str>, owned: &[OwnedTicker]) -> f64 {
    let mut score = 0.5_f64;

    let owns_extracted_ticker = extracted_tickers
        .iter()
        .any(|t| owned.iter().any(|o| o.ticker.eq_ignore_ascii_case(t)));
    if owns_extracted_ticker {
        score += 0.3;
    }

    if let Some(sector) = sector {
        let sector_matches = owned
            .iter()
            .any(|o| o.sector.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(sector)));
        if sector_matches {
            score += 0.2;
        }
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned() -> Vec<OwnedTicker> {
        vec![
            OwnedTicker { ticker: "AAPL".into(), sector: Some("Technology".into()) },
            OwnedTicker { ticker: "JPM".into(), sector: Some("Financials".into()) },
        ]
    }

    #[test]
    fn base_score_with_no_overlap() {
        assert_eq!(relevance_score(&["XOM".to_string()], Some("Energy"), &owned()), 0.5);
    }

    #[test]
    fn owned_ticker_bumps_score() {
        assert!((relevance_score(&["aapl".to_string()], None, &owned()) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn sector_match_and_ticker_match_clamp_to_one() {
        let score = relevance_score(&["AAPL".to_string()], Some("technology"), &owned());
        assert_eq!(score, 1.0);
    }
}
