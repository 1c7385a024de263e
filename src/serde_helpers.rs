//! Serde helpers shared by configuration and JSON-RPC decoding

use serde::{Deserialize, Deserializer};

/// Deserializer for `Option<serde_json::Value>` fields that keeps an explicit `null`.
///
/// Combined with `#[serde(default)]`, a missing key becomes `None` while a key set
/// to `null` becomes `Some(Value::Null)`. Plain `Option<Value>` would collapse both.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Deserializer for a list of strings given either as a sequence or as one
/// comma-separated string (the form environment variables usually take).
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::Joined(joined) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    })
}
