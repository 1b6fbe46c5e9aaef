use intel_core::TradeType;

/// Tickers that are themselves diversified funds, not single-issuer bets —
/// a trade here carries essentially no conflict-of-interest signal.
const ETF_WHITELIST: &[&str] = &[
    "SPY", "VOO", "VTI", "QQQ", "IVV", "VEA", "VWO", "AGG", "BND", "GLD", "IWM", "DIA",
];

const FUND_NAME_MARKERS: &[&str] = &["etf", "fund", "index", "ishares", "vanguard", "spdr"];
const BOND_SECTOR_MARKERS: &[&str] = &["bond", "treasury", "municipal", "note", "bill"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowRiskVerdict {
    pub reason: String,
}

/// Context needed to decide whether a trade is worth an LLM call at all.
pub struct LowRiskInput<'a> {
    pub trade_type: TradeType,
    pub ticker: &'a str,
    pub company_name: &'a str,
    pub sector: Option<&'a str>,
}

/// Filters out trades that can't meaningfully conflict with any committee
/// jurisdiction, so the analyzer never spends an LLM call on a Vanguard
/// index fund purchase or a municipal bond sale.
pub fn classify(input: &LowRiskInput) -> Option<LowRiskVerdict> {
    if !matches!(input.trade_type, TradeType::Purchase | TradeType::Sale) {
        return Some(LowRiskVerdict {
            reason: "non-investment transaction type".to_string(),
        });
    }

    if ETF_WHITELIST.contains(&input.ticker.to_uppercase().as_str()) {
        return Some(LowRiskVerdict {
            reason: format!("{} is a whitelisted diversified ETF", input.ticker),
        });
    }

    let company_lower = input.company_name.to_lowercase();
    if let Some(marker) = FUND_NAME_MARKERS.iter().find(|m| company_lower.contains(**m)) {
        return Some(LowRiskVerdict {
            reason: format!("company name contains fund marker '{marker}'"),
        });
    }

    if let Some(sector) = input.sector {
        let sector_lower = sector.to_lowercase();
        if let Some(marker) = BOND_SECTOR_MARKERS.iter().find(|m| sector_lower.contains(**m)) {
            return Some(LowRiskVerdict {
                reason: format!("sector contains fixed-income marker '{marker}'"),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(ticker: &'a str, company: &'a str, sector: Option<&'a str>) -> LowRiskInput<'a> {
        LowRiskInput {
            trade_type: TradeType::Purchase,
            ticker,
            company_name: company,
            sector,
        }
    }

    #[test]
    fn whitelisted_etf_is_low_risk() {
        assert!(classify(&input("SPY", "SPDR S&P 500 ETF Trust", None)).is_some());
    }

    #[test]
    fn bond_sector_is_low_risk() {
        assert!(classify(&input("XYZ", "Some Corp", Some("Municipal Bonds"))).is_some());
    }

    #[test]
    fn ordinary_equity_trade_is_not_low_risk() {
        assert!(classify(&input("NVDA", "NVIDIA Corporation", Some("Technology"))).is_none());
    }

    #[test]
    fn non_purchase_sale_is_low_risk() {
        let mut i = input("NVDA", "NVIDIA Corporation", Some("Technology"));
        i.trade_type = TradeType::Sale;
        assert!(classify(&i).is_none());
    }
}
