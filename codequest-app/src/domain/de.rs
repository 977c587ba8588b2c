//! Lenient field decoders for records the backend shapes inconsistently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Identifier sent either as a JSON string or a JSON number.
pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Unparseable timestamps read as `None` instead of failing the record.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "id")]
        id: String,
        #[serde(default, deserialize_with = "opt_id")]
        parent: Option<String>,
        #[serde(default, deserialize_with = "lenient_datetime")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_numeric_and_text_ids() {
        let probe: Probe = serde_json::from_str(r#"{"id": 42, "parent": "7"}"#).unwrap();
        assert_eq!(probe.id, "42");
        assert_eq!(probe.parent.as_deref(), Some("7"));
    }

    #[test]
    fn test_bad_timestamp_is_none() {
        let probe: Probe = serde_json::from_str(r#"{"id": "a", "at": "2023-01-01"}"#).unwrap();
        assert!(probe.at.is_none());

        let probe: Probe =
            serde_json::from_str(r#"{"id": "a", "at": "2024-05-01T10:00:00.000Z"}"#).unwrap();
        assert!(probe.at.is_some());
    }
}
