//! Tolerant decoders for numeric fields.
//!
//! The movie catalog was imported from a public data set where numbers are
//! sometimes stored as strings (`"2012è"`, `""`), and the frontend posts form
//! values as strings. These helpers accept either shape and fall back to
//! `None` instead of failing the whole document.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Parse the leading integer of a string, ignoring trailing garbage.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

/// Parse the leading decimal number of a string, ignoring trailing garbage.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut seen_dot = false;
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let ok = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (c == '.' && !seen_dot);
        if !ok {
            break;
        }
        if c == '.' {
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    s[..end].parse().ok().filter(|f: &f64| f.is_finite())
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Int(i) => Some(i),
        Loose::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Loose::Float(_) => None,
        Loose::Text(s) => parse_int_prefix(&s),
        Loose::Other(_) => None,
    })
}

pub fn opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_i64(deserializer)?.and_then(|i| i32::try_from(i).ok()))
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Int(i) => Some(i as f64),
        Loose::Float(f) if f.is_finite() => Some(f),
        Loose::Float(_) => None,
        Loose::Text(s) => parse_float_prefix(&s),
        Loose::Other(_) => None,
    })
}

/// Accept a string or a bare number and keep its textual form.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Int(i) => Some(i.to_string()),
        Loose::Float(f) => Some(f.to_string()),
        Loose::Text(s) => Some(s),
        Loose::Other(_) => None,
    })
}

/// Same rules as [`opt_i32`] for a value already read from the database,
/// e.g. the members of an aggregation `$addToSet`.
pub fn bson_to_i32(value: &bson::Bson) -> Option<i32> {
    let wide = match value {
        bson::Bson::Int32(i) => Some(i64::from(*i)),
        bson::Bson::Int64(i) => Some(*i),
        bson::Bson::Double(f) if f.is_finite() => Some(f.trunc() as i64),
        bson::Bson::String(s) => parse_int_prefix(s),
        _ => None,
    };
    wide.and_then(|i| i32::try_from(i).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_bson_to_i32() {
        use bson::Bson;

        assert_eq!(bson_to_i32(&Bson::Int32(1995)), Some(1995));
        assert_eq!(bson_to_i32(&Bson::Int64(1995)), Some(1995));
        assert_eq!(bson_to_i32(&Bson::Double(1995.0)), Some(1995));
        assert_eq!(bson_to_i32(&Bson::String("1995è".to_string())), Some(1995));
        assert_eq!(bson_to_i32(&Bson::Null), None);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_i32")]
        year: Option<i32>,
        #[serde(default, deserialize_with = "opt_f64")]
        rating: Option<f64>,
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("2012"), Some(2012));
        assert_eq!(parse_int_prefix("2012è"), Some(2012));
        assert_eq!(parse_int_prefix("  -7 days"), Some(-7));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("7.5"), Some(7.5));
        assert_eq!(parse_float_prefix("8.1/10"), Some(8.1));
        assert_eq!(parse_float_prefix("1.2.3"), Some(1.2));
        assert_eq!(parse_float_prefix("n/a"), None);
    }

    #[test]
    fn test_lenient_fields_accept_numbers_and_strings() {
        let probe: Probe = serde_json::from_str(r#"{"year": "1999", "rating": 8}"#).unwrap();
        assert_eq!(probe.year, Some(1999));
        assert_eq!(probe.rating, Some(8.0));

        let probe: Probe = serde_json::from_str(r#"{"year": 2001.0, "rating": ""}"#).unwrap();
        assert_eq!(probe.year, Some(2001));
        assert_eq!(probe.rating, None);

        let probe: Probe = serde_json::from_str(r#"{"year": null}"#).unwrap();
        assert_eq!(probe.year, None);
        assert_eq!(probe.rating, None);
    }
}
