use regex::Regex;
use std::sync::OnceLock;

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Z.]{0,4}$").expect("valid regex"))
}

/// Validates an AI-proposed ticker per spec §4.4 step 6: uppercase
/// alphanumeric (dots allowed for share classes like `BRK.B`), length 1-5,
/// no spaces or other specials. A trailing `?` (the LLM's own uncertainty
/// marker) is rejected before this check even runs.
pub fn is_valid_ticker(raw: &str) -> bool {
    if raw.ends_with('?') {
        return false;
    }
    ticker_pattern().is_match(raw)
}

/// Normalizes and de-duplicates a list of AI-proposed tickers: rejects
/// uncertain (`?`-suffixed) and malformed entries, uppercases, strips
/// whitespace, and removes duplicates while preserving first-seen order.
pub fn normalize_tickers(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for t in raw {
        let candidate = t.trim().to_uppercase();
        if !is_valid_ticker(&candidate) {
            continue;
        }
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_tickers() {
        assert!(is_valid_ticker("AAPL"));
        assert!(is_valid_ticker("BRK.B"));
        assert!(is_valid_ticker("C"));
    }

    #[test]
    fn rejects_invalid_tickers() {
        assert!(!is_valid_ticker(""));
        assert!(!is_valid_ticker("ABCDEF"));
        assert!(!is_valid_ticker("Apple"));
        assert!(!is_valid_ticker("AAPL?"));
    }

    #[test]
    fn normalize_dedupes_and_rejects_uncertain() {
        let raw = vec!["nvda".to_string(), "NVDA".to_string(), "AMD?".to_string()];
        assert_eq!(normalize_tickers(&raw), vec!["NVDA".to_string()]);
    }
}
