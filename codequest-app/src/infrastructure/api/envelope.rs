use codequest_errors::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys a list may be wrapped under, in lookup order.
const LIST_KEYS: &[&str] = &[
    "data",
    "items",
    "posts",
    "comments",
    "categories",
    "tags",
    "users",
];

/// How a list response was wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Bare,
    Keyed(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub envelope: Envelope,
    pub items: Vec<Value>,
}

impl Listing {
    /// Decodes every item, skipping the ones that do not fit.
    pub fn decode<T>(self, decode: impl Fn(Value) -> Result<T, serde_json::Error>) -> Vec<T> {
        self.items
            .into_iter()
            .filter_map(|item| match decode(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!("Skipping undecodable list item: {}", e);
                    None
                }
            })
            .collect()
    }

    pub fn decode_as<T: DeserializeOwned>(self) -> Vec<T> {
        self.decode(serde_json::from_value)
    }
}

/// Single seam for the backend's list shapes: a bare array, or an object
/// holding the array under one of [`LIST_KEYS`].
pub fn normalize_list(value: Value) -> Result<Listing, AppError> {
    match value {
        Value::Array(items) => Ok(Listing {
            envelope: Envelope::Bare,
            items,
        }),
        Value::Object(mut object) => {
            for key in LIST_KEYS {
                if matches!(object.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = object.remove(*key) {
                        return Ok(Listing {
                            envelope: Envelope::Keyed(*key),
                            items,
                        });
                    }
                }
            }
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            Err(AppError::ParseFailure(format!(
                "no list found in response object (keys: {})",
                keys.join(", ")
            )))
        }
        other => Err(AppError::ParseFailure(format!(
            "expected a list response, got {}",
            kind(&other)
        ))),
    }
}

/// Unwraps `{ "data": {...} }` around a single entity.
pub fn normalize_entity(value: Value) -> Value {
    match value {
        Value::Object(mut object) if matches!(object.get("data"), Some(Value::Object(_))) => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
