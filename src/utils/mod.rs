//! Project-specific utilities live here.

/// Parse a pagination parameter, falling back to `default` when the value is
/// absent, not a non-negative integer, or zero.
pub fn parse_count_or(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).and_then(|value| value.parse::<u64>().ok()) {
        Some(0) | None => default,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_integers() {
        assert_eq!(parse_count_or(Some("20"), 10), 20);
        assert_eq!(parse_count_or(Some(" 7 "), 10), 7);
    }

    #[test]
    fn falls_back_on_missing_or_malformed_input() {
        assert_eq!(parse_count_or(None, 10), 10);
        assert_eq!(parse_count_or(Some(""), 10), 10);
        assert_eq!(parse_count_or(Some("abc"), 10), 10);
        assert_eq!(parse_count_or(Some("1.5"), 10), 10);
    }

    #[test]
    fn falls_back_on_negative_and_zero() {
        assert_eq!(parse_count_or(Some("-5"), 10), 10);
        assert_eq!(parse_count_or(Some("0"), 10), 10);
        assert_eq!(parse_count_or(Some("-1"), 0), 0);
    }
}
