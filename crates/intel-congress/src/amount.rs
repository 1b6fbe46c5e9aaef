/// Disclosed trade amounts arrive as a range string ("$1,001 - $15,000") or
/// an open-ended one ("Over $50,000,000"); sessions need a single number to
/// compare against the sale-size thresholds.
pub fn parse_amount_midpoint(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();

    let numbers: Vec<f64> = cleaned
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();

    match numbers.as_slice() {
        [] => 0.0,
        [single] => *single,
        [low, high, ..] => (low + high) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_a_disclosed_range() {
        assert_eq!(parse_amount_midpoint("$1,001 - $15,000"), 8_000.5);
    }

    #[test]
    fn falls_back_to_single_value_for_open_ended_amounts() {
        assert_eq!(parse_amount_midpoint("Over $50,000,000"), 50_000_000.0);
    }

    #[test]
    fn unparseable_input_is_zero() {
        assert_eq!(parse_amount_midpoint("unknown"), 0.0);
    }
}
