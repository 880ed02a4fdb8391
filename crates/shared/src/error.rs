use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error envelope returned by the analyzer on non-success statuses.
///
/// `detail` is usually a string, but request validation failures carry a
/// list of `{ "loc": [...], "msg": "...", "type": "..." }` objects instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn from_json_slice(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Human-readable message carried by the body, if any.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// Extracts the `detail` message from a raw error response body.
pub fn detail_message(body: &[u8]) -> Option<String> {
    ApiErrorBody::from_json_slice(body)?.message()
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed analysis payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("score {field} out of range: {value} (expected 0-10)")]
    ScoreOutOfRange { field: &'static str, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_used_verbatim() {
        assert_eq!(
            detail_message(br#"{"detail":"file too large"}"#).as_deref(),
            Some("file too large")
        );
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body = br#"{"detail":[{"loc":["body","rhp"],"msg":"field required","type":"missing"},{"msg":"second"}]}"#;
        assert_eq!(
            detail_message(body).as_deref(),
            Some("field required; second")
        );
    }

    #[test]
    fn missing_or_unusable_detail_yields_none() {
        assert_eq!(detail_message(b""), None);
        assert_eq!(detail_message(b"<html>502</html>"), None);
        assert_eq!(detail_message(br#"{"error":"nope"}"#), None);
        assert_eq!(detail_message(br#"{"detail":42}"#), None);
        assert_eq!(detail_message(br#"{"detail":"   "}"#), None);
    }
}
