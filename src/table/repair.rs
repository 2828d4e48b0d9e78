//! Value-level rules behind `clean`, `correct` and the scoring parser.
//!
//! Rounding is half-to-even throughout, so `2.5` becomes `2` and `3.5`
//! becomes `4`.

/// Parses a trimmed value as a finite float.
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Renders `value` rounded half-to-even with no fractional part.
pub fn round_to_integer_string(value: f64) -> String {
    // `+ 0.0` turns a negative zero into a positive one.
    format!("{:.0}", value.round_ties_even() + 0.0)
}

/// A non-negative finite number, rounded to an integer string.
///
/// Blank, non-numeric, negative and non-finite values yield `None`.
pub fn round_non_negative(raw: &str) -> Option<String> {
    parse_finite(raw)
        .filter(|v| *v >= 0.0)
        .map(round_to_integer_string)
}

/// Cleaning rule: keep a rounded non-negative value, blank everything else.
pub fn clean_value(raw: &str) -> String {
    round_non_negative(raw).unwrap_or_default()
}

/// Correction rule: keep a rounded non-negative value, otherwise the default.
pub fn correct_value(raw: &str, default: &str) -> String {
    round_non_negative(raw).unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_non_negative() {
        assert_eq!(round_non_negative("3.4").as_deref(), Some("3"));
        assert_eq!(round_non_negative(" 7 ").as_deref(), Some("7"));
        assert_eq!(round_non_negative("2.5").as_deref(), Some("2"));
        assert_eq!(round_non_negative("3.5").as_deref(), Some("4"));
        assert_eq!(round_non_negative("-0").as_deref(), Some("0"));
        assert_eq!(round_non_negative("1e2").as_deref(), Some("100"));
        assert_eq!(round_non_negative("-1"), None);
        assert_eq!(round_non_negative("abc"), None);
        assert_eq!(round_non_negative(""), None);
        assert_eq!(round_non_negative("inf"), None);
        assert_eq!(round_non_negative("NaN"), None);
    }

    #[test]
    fn test_clean_and_correct_values() {
        assert_eq!(clean_value("x"), "");
        assert_eq!(clean_value("0.6"), "1");
        assert_eq!(correct_value("x", "5"), "5");
        assert_eq!(correct_value("", "0"), "0");
        assert_eq!(correct_value("-2", ""), "");
        assert_eq!(correct_value("9.9", "5"), "10");
    }

    #[test]
    fn test_round_to_integer_string_negative() {
        assert_eq!(round_to_integer_string(-3.6), "-4");
        assert_eq!(round_to_integer_string(-0.4), "0");
        assert_eq!(round_to_integer_string(4.0), "4");
    }
}
