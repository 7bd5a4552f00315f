//! Human-readable messages from arbitrarily wrapped error values.
//!
//! Native failures arrive as strings, as serialized objects nesting the real
//! message several levels deep (`{error: {details: [{message}]}}`), or as
//! Rust error chains. [`ErrorValue`] captures all of these shapes and
//! [`ErrorValue::message`] walks them with a depth bound.

use serde_json::{Number, Value};

/// Deepest nesting level searched for a message.
pub const MAX_MESSAGE_DEPTH: usize = 6;

/// Keys searched for a nested message, in priority order.
pub const MESSAGE_KEYS: &[&str] = &["message", "error", "details", "reason", "cause", "data"];

const UNKNOWN_ERROR: &str = "Unknown error";

/// Tagged union of every error shape we know how to read.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    Null,
    Text(String),
    Number(Number),
    Bool(bool),
    /// A typed error with an optional cause chain.
    ErrorLike {
        name: Option<String>,
        message: String,
        cause: Option<Box<ErrorValue>>,
    },
    Array(Vec<ErrorValue>),
    Object(Vec<(String, ErrorValue)>),
}

impl ErrorValue {
    pub fn text(message: impl Into<String>) -> Self {
        ErrorValue::Text(message.into())
    }

    /// Build from a Rust error, following its `source()` chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        ErrorValue::ErrorLike {
            name: None,
            message: error.to_string(),
            cause: error.source().map(|s| Box::new(ErrorValue::from_error(s))),
        }
    }

    /// Canonical message: the first non-empty message found by a bounded
    /// depth-first search, falling back to JSON text or string coercion.
    pub fn message(&self) -> String {
        if let Some(found) = self.find_message(0) {
            return found;
        }
        match self {
            ErrorValue::Null => UNKNOWN_ERROR.to_string(),
            ErrorValue::ErrorLike { name, .. } => {
                name.clone().unwrap_or_else(|| UNKNOWN_ERROR.to_string())
            }
            other => {
                let json = other.to_json().to_string();
                if json.is_empty() || json == "{}" || json == "[]" || json == "\"\"" {
                    UNKNOWN_ERROR.to_string()
                } else {
                    json
                }
            }
        }
    }

    fn find_message(&self, depth: usize) -> Option<String> {
        if depth > MAX_MESSAGE_DEPTH {
            return None;
        }
        match self {
            ErrorValue::Null => None,
            ErrorValue::Text(s) => non_empty(s),
            ErrorValue::Number(n) => Some(n.to_string()),
            ErrorValue::Bool(b) => Some(b.to_string()),
            ErrorValue::ErrorLike { message, cause, .. } => non_empty(message)
                .or_else(|| cause.as_ref().and_then(|c| c.find_message(depth + 1))),
            ErrorValue::Array(items) => items.iter().find_map(|i| i.find_message(depth + 1)),
            ErrorValue::Object(fields) => MESSAGE_KEYS.iter().find_map(|key| {
                fields
                    .iter()
                    .find(|(k, _)| k == key)
                    .and_then(|(_, v)| v.find_message(depth + 1))
            }),
        }
    }

    /// Best-effort JSON rendering, used as the last-resort message.
    pub fn to_json(&self) -> Value {
        match self {
            ErrorValue::Null => Value::Null,
            ErrorValue::Text(s) => Value::String(s.clone()),
            ErrorValue::Number(n) => Value::Number(n.clone()),
            ErrorValue::Bool(b) => Value::Bool(*b),
            ErrorValue::ErrorLike { name, message, .. } => {
                serde_json::json!({ "name": name, "message": message })
            }
            ErrorValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ErrorValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl From<&Value> for ErrorValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ErrorValue::Null,
            Value::String(s) => ErrorValue::Text(s.clone()),
            Value::Number(n) => ErrorValue::Number(n.clone()),
            Value::Bool(b) => ErrorValue::Bool(*b),
            Value::Array(items) => ErrorValue::Array(items.iter().map(ErrorValue::from).collect()),
            Value::Object(map) => ErrorValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), ErrorValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ErrorValue {
    fn from(value: Value) -> Self {
        ErrorValue::from(&value)
    }
}

impl From<&str> for ErrorValue {
    fn from(value: &str) -> Self {
        ErrorValue::Text(value.to_string())
    }
}

impl From<String> for ErrorValue {
    fn from(value: String) -> Self {
        ErrorValue::Text(value)
    }
}

/// Shorthand for `ErrorValue::from(value).message()`.
pub fn normalize_error_message(value: impl Into<ErrorValue>) -> String {
    value.into().message()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_is_trimmed() {
        assert_eq!(normalize_error_message("  boom \n"), "boom");
    }

    #[test]
    fn finds_deeply_nested_message() {
        let raw = json!({"error": {"details": [{"code": 3}, {"reason": {"message": "quota exceeded"}}]}});
        assert_eq!(normalize_error_message(raw), "quota exceeded");
    }

    #[test]
    fn key_priority_prefers_message() {
        let raw = json!({"data": "secondary", "message": "primary"});
        assert_eq!(normalize_error_message(raw), "primary");
    }

    #[test]
    fn depth_bound_falls_back_to_json() {
        let mut raw = json!("too deep");
        for _ in 0..(MAX_MESSAGE_DEPTH + 2) {
            raw = json!({ "cause": raw });
        }
        let message = normalize_error_message(raw.clone());
        assert_eq!(message, raw.to_string());
    }

    #[test]
    fn object_without_known_keys_is_stringified() {
        assert_eq!(normalize_error_message(json!({"code": 500})), "{\"code\":500}");
    }

    #[test]
    fn scalars_are_coerced() {
        assert_eq!(normalize_error_message(json!(404)), "404");
        assert_eq!(normalize_error_message(json!(false)), "false");
        assert_eq!(normalize_error_message(Value::Null), "Unknown error");
        assert_eq!(normalize_error_message(json!({})), "Unknown error");
    }

    #[test]
    fn error_like_uses_cause_when_message_empty() {
        let value = ErrorValue::ErrorLike {
            name: Some("InvokeError".into()),
            message: String::new(),
            cause: Some(Box::new(ErrorValue::text("disk full"))),
        };
        assert_eq!(value.message(), "disk full");
    }

    #[test]
    fn rust_error_chain_is_captured() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.jsonl");
        assert_eq!(ErrorValue::from_error(&io).message(), "missing.jsonl");
    }
}
