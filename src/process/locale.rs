// src/process/locale.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// What is left of a pt-BR number once separators have been rewritten.
static PLAIN_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal regex should compile"));

/// Trim whitespace and strip one pair of outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Parse a pt-BR formatted number (`.` thousands, `,` decimal).
///
/// A trailing `%` is dropped without rescaling, so `"12,3%"` is `12.3`.
/// Blank, placeholder (`"-"`) and malformed text is `None`, never `0.0`.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned = clean_str(text);
    let cleaned = cleaned.strip_suffix('%').unwrap_or(cleaned).trim_end();
    if cleaned.is_empty() {
        return None;
    }

    let without_thousands: String = cleaned.chars().filter(|c| *c != '.').collect();
    if without_thousands.matches(',').count() > 1 {
        return None;
    }
    let plain = without_thousands.replacen(',', ".", 1);
    if !PLAIN_DECIMAL.is_match(&plain) {
        return None;
    }

    plain.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_numbers() {
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("12,3%"), Some(12.3));
        assert_eq!(parse_decimal("-4,10%"), Some(-4.1));
        assert_eq!(parse_decimal("5,2"), Some(5.2));
        assert_eq!(parse_decimal("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_decimal(" 0,00 "), Some(0.0));
        assert_eq!(parse_decimal("\"7,5\""), Some(7.5));
    }

    #[test]
    fn blank_and_placeholder_are_missing() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("%"), None);
    }

    #[test]
    fn malformed_text_is_missing_not_zero() {
        assert_eq!(parse_decimal("1,2,3"), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("12a"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("1e5"), None);
        assert_eq!(parse_decimal(","), None);
    }

    #[test]
    fn parsing_is_deterministic() {
        for text in ["1.234,56", "12,3%", "", "-", "bogus"] {
            assert_eq!(parse_decimal(text), parse_decimal(text));
        }
    }
}
