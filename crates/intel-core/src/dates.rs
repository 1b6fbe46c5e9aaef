use chrono::NaiveDate;

/// Date formats seen across congress disclosure feeds, tried in order.
const KNOWN_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%B %d, %Y"];

/// Parses a disclosure date string against each known format in turn,
/// returning the first match.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    KNOWN_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_format() {
        assert_eq!(parse_flexible_date("2026-03-05"), NaiveDate::from_ymd_opt(2026, 3, 5));
    }

    #[test]
    fn parses_us_slash_format() {
        assert_eq!(parse_flexible_date("03/05/2026"), NaiveDate::from_ymd_opt(2026, 3, 5));
    }

    #[test]
    fn rejects_unknown_format() {
        assert_eq!(parse_flexible_date("not-a-date"), None);
    }
}
