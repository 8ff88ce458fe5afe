//! Helpers for Discord ids stored in JSON documents.
//!
//! Documents written by older tooling hold ids either as numbers or as
//! strings; both are accepted on read and numbers are written back.

use serde::{Deserialize, Deserializer};
use std::num::NonZeroU64;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn value(self) -> Option<u64> {
        match self {
            RawId::Number(n) => Some(n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Deserialize an optional id given as number or string
pub fn opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.and_then(RawId::value))
}

/// Deserialize a list of ids, dropping entries that are not ids
pub fn list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawId>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.into_iter().filter_map(RawId::value).collect())
}

/// Convert a raw id into a typed serenity id, rejecting zero
pub fn typed<T: From<NonZeroU64>>(raw: u64) -> Option<T> {
    NonZeroU64::new(raw).map(T::from)
}

/// Parse an id from a bare number or a mention (`<@&1>`, `<@1>`, `<@!1>`, `<#1>`)
pub fn extract_id(token: &str) -> Option<u64> {
    let token = token.trim();
    let inner = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| {
            t.strip_prefix("@&")
                .or_else(|| t.strip_prefix("@!"))
                .or_else(|| t.strip_prefix('@'))
                .or_else(|| t.strip_prefix('#'))
                .unwrap_or("")
        })
        .unwrap_or(token);

    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// Parse a comma separated list of ids or mentions, skipping anything else
pub fn parse_id_list(csv: &str) -> Vec<u64> {
    csv.split(',').filter_map(extract_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::serenity_prelude::UserId;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt")]
        single: Option<u64>,
        #[serde(default, deserialize_with = "list")]
        many: Vec<u64>,
    }

    #[test]
    fn test_numbers_and_strings_are_accepted() {
        let sample: Sample =
            serde_json::from_str(r#"{"single": "42", "many": [1, "2", "x", 3]}"#).unwrap();
        assert_eq!(sample.single, Some(42));
        assert_eq!(sample.many, vec![1, 2, 3]);

        let empty: Sample = serde_json::from_str(r#"{"single": null}"#).unwrap();
        assert_eq!(empty.single, None);
        assert!(empty.many.is_empty());
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id("<@&111>"), Some(111));
        assert_eq!(extract_id(" 222 "), Some(222));
        assert_eq!(extract_id("<#333>"), Some(333));
        assert_eq!(extract_id("<@!444>"), Some(444));
        assert_eq!(extract_id("Staff"), None);
        assert_eq!(extract_id("<@&>"), None);
        assert_eq!(extract_id(""), None);
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("<@&111>, 222,abc, 333"), vec![111, 222, 333]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn test_typed_rejects_zero() {
        assert_eq!(typed::<UserId>(0), None);
        assert_eq!(typed::<UserId>(5), Some(UserId::new(5)));
    }
}
