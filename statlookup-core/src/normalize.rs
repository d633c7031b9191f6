//! Identifier normalization for WDS requests.
//!
//! Users paste identifiers in whatever shape they copied them: `v86822802`,
//! `V86822802 `, `86822802`, or a product id like `35-10-0003`. Everything is
//! reduced to its ASCII digits before it goes upstream. An identifier that has
//! no digits left (or overflows `u64`) is `None` and gets dropped from the batch.

use serde_json::{Number, Value};

/// `latestN` used when the caller sends nothing usable.
pub const DEFAULT_LATEST_N: u32 = 12;
pub const MIN_LATEST_N: u32 = 1;
pub const MAX_LATEST_N: u32 = 1000;

/// Normalize a JSON vector id (string or number). Strips one leading `v`/`V`.
pub fn normalize_vector_id(raw: Option<&Value>) -> Option<u64> {
    raw.and_then(value_text).and_then(|s| parse_vector_id(&s))
}

/// Normalize a JSON product id (string or number).
pub fn normalize_product_id(raw: Option<&Value>) -> Option<u64> {
    raw.and_then(value_text).and_then(|s| parse_product_id(&s))
}

pub fn parse_vector_id(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let unprefixed = trimmed
        .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'v'))
        .unwrap_or(trimmed);
    digits_only(unprefixed)
}

pub fn parse_product_id(text: &str) -> Option<u64> {
    digits_only(text.trim())
}

/// Clamp a requested period count into `[1, 1000]`, defaulting to 12.
pub fn clamp_latest_n(raw: Option<&Value>) -> u32 {
    raw.and_then(value_text)
        .map(|s| parse_latest_n(&s))
        .unwrap_or(DEFAULT_LATEST_N)
}

/// Reads a leading base-10 integer the way a browser's `parseInt` does:
/// leading whitespace and a sign are accepted, anything after the digits is
/// ignored. No digits at all means the default.
pub fn parse_latest_n(text: &str) -> u32 {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: Vec<i64> = rest
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10).map(i64::from))
        .collect();
    if digits.is_empty() {
        return DEFAULT_LATEST_N;
    }

    let magnitude = digits
        .iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(*d));
    let n = if negative { -magnitude } else { magnitude };

    n.clamp(i64::from(MIN_LATEST_N), i64::from(MAX_LATEST_N)) as u32
}

/// Split a comma-separated id list (`"v1,v2, 3"`) into valid vector ids,
/// preserving order and dropping anything that does not normalize.
pub fn split_vector_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(parse_vector_id)
        .collect()
}

/// Text form of a JSON scalar. Arrays join with commas, mirroring how form
/// values are stringified by the browser; objects and null have no text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| value_text(v).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

/// Whole numbers print without a fraction or exponent, so `86822802.0` and
/// `1.81e7` keep their digits when the id is reduced to digits afterwards.
fn number_text(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

fn digits_only(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vector_prefix_is_optional() {
        assert_eq!(parse_vector_id("v86822802"), Some(86822802));
        assert_eq!(parse_vector_id("86822802"), Some(86822802));
        assert_eq!(parse_vector_id("  V86822802 "), Some(86822802));
        assert_eq!(
            normalize_vector_id(Some(&json!("v86822802"))),
            normalize_vector_id(Some(&json!(86822802)))
        );
    }

    #[test]
    fn test_only_one_leading_v_is_stripped() {
        // The second `v` is not a digit either, so it falls away with the rest.
        assert_eq!(parse_vector_id("vv123"), Some(123));
        assert_eq!(parse_vector_id("v"), None);
    }

    #[test]
    fn test_product_id_keeps_digits() {
        assert_eq!(parse_product_id("35-10-0003"), Some(35100003));
        assert_eq!(normalize_product_id(Some(&json!(18100004))), Some(18100004));
        assert_eq!(normalize_product_id(Some(&json!(" 18100004\n"))), Some(18100004));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(normalize_vector_id(None), None);
        assert_eq!(normalize_vector_id(Some(&Value::Null)), None);
        assert_eq!(normalize_vector_id(Some(&json!("abc"))), None);
        assert_eq!(normalize_vector_id(Some(&json!({"id": 1}))), None);
        assert_eq!(normalize_product_id(Some(&json!(""))), None);
        assert_eq!(normalize_product_id(Some(&json!(true))), None);
        // 25 digits do not fit in u64
        assert_eq!(parse_product_id("1234567890123456789012345"), None);
    }

    #[test]
    fn test_latest_n_clamps() {
        assert_eq!(clamp_latest_n(Some(&json!(0))), 1);
        assert_eq!(clamp_latest_n(Some(&json!(5000))), 1000);
        assert_eq!(clamp_latest_n(Some(&json!(-4))), 1);
        assert_eq!(clamp_latest_n(Some(&json!(24))), 24);
        assert_eq!(clamp_latest_n(Some(&json!("36"))), 36);
    }

    #[test]
    fn test_latest_n_defaults() {
        assert_eq!(clamp_latest_n(None), 12);
        assert_eq!(clamp_latest_n(Some(&Value::Null)), 12);
        assert_eq!(clamp_latest_n(Some(&json!(""))), 12);
        assert_eq!(clamp_latest_n(Some(&json!("lots"))), 12);
        assert_eq!(clamp_latest_n(Some(&json!({}))), 12);
    }

    #[test]
    fn test_latest_n_parses_leading_integer() {
        assert_eq!(parse_latest_n("  7 periods"), 7);
        assert_eq!(parse_latest_n("5.9"), 5);
        assert_eq!(parse_latest_n("+3"), 3);
        assert_eq!(parse_latest_n("99999999999999999999999"), 1000);
        assert_eq!(parse_latest_n("-99999999999999999999999"), 1);
    }

    #[test]
    fn test_split_vector_ids() {
        assert_eq!(
            split_vector_ids("v86822802, 86822803,,x, V41690973 "),
            vec![86822802, 86822803, 41690973]
        );
        assert!(split_vector_ids("").is_empty());
        assert!(split_vector_ids(" , ,v").is_empty());
    }

    #[test]
    fn test_array_values_join_like_form_input() {
        assert_eq!(value_text(&json!(["v1", 2])), Some("v1,2".to_string()));
    }

    #[test]
    fn test_whole_float_ids_keep_their_digits() {
        let float_id: Value = serde_json::from_str("86822802.0").unwrap();
        assert_eq!(normalize_vector_id(Some(&float_id)), Some(86822802));

        let exponent_id: Value = serde_json::from_str("1.81e7").unwrap();
        assert_eq!(normalize_product_id(Some(&exponent_id)), Some(18100000));

        assert_eq!(clamp_latest_n(Some(&json!(5.0))), 5);
        assert_eq!(value_text(&json!(2.5)), Some("2.5".to_string()));
    }
}
