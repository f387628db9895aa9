//! Boolean-like backend flags
//!
//! The backend emits `script_generated` / `assets_generated` either as JSON
//! booleans or as the strings `"true"` / `"false"`. Everything that crosses the
//! data-access boundary goes through [`deserialize`] so the rest of the crate
//! only ever sees a plain `bool`.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Parse a string flag representation.
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitive and
/// surrounding whitespace ignored.
pub fn parse(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(Error::InvalidValue {
            field: "flag".to_string(),
            message: format!("unrecognized flag value '{other}'"),
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Text(String),
    Number(i64),
}

/// Serde helper: decode a boolean, a boolean string, a number or `null`.
///
/// Unrecognized strings decode to `false` and are logged rather than failing
/// the whole record.
pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFlag>::deserialize(deserializer)?;
    Ok(match raw {
        None => false,
        Some(RawFlag::Bool(value)) => value,
        Some(RawFlag::Number(value)) => value != 0,
        Some(RawFlag::Text(text)) => parse(&text).unwrap_or_else(|err| {
            warn!(error = %err, "Treating unrecognized flag as false");
            false
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize")]
        flag: bool,
    }

    fn decode(json: &str) -> bool {
        serde_json::from_str::<Probe>(json).unwrap().flag
    }

    #[test]
    fn test_parse_variants() {
        assert!(parse("true").unwrap());
        assert!(parse(" TRUE ").unwrap());
        assert!(parse("1").unwrap());
        assert!(!parse("false").unwrap());
        assert!(!parse("").unwrap());
        assert!(parse("maybe").is_err());
    }

    #[test]
    fn test_deserialize_bool_and_string_forms() {
        assert!(decode(r#"{"flag": true}"#));
        assert!(decode(r#"{"flag": "true"}"#));
        assert!(!decode(r#"{"flag": false}"#));
        assert!(!decode(r#"{"flag": "false"}"#));
    }

    #[test]
    fn test_deserialize_missing_null_and_garbage() {
        assert!(!decode(r#"{}"#));
        assert!(!decode(r#"{"flag": null}"#));
        assert!(!decode(r#"{"flag": "pending"}"#));
        assert!(decode(r#"{"flag": 1}"#));
    }
}
