//! Request bodies as clients send them, and as handlers receive them.

use bytes::Bytes;
use serde_json::{Map, Value};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// One entry of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: Bytes,
    },
}

/// Ordered multipart form entries. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: FormValue) -> &mut Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, FormValue::Text(value.into()));
        self
    }

    pub fn with_file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.append(
            name,
            FormValue::File {
                file_name: Some(file_name.into()),
                content_type: content_type.map(str::to_string),
                bytes: bytes.into(),
            },
        );
        self
    }

    /// First entry under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text entries as a JSON object; later duplicates win, files are skipped.
    pub fn text_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, value) in &self.entries {
            if let FormValue::Text(text) = value {
                map.insert(name.clone(), Value::String(text.clone()));
            }
        }
        map
    }
}

/// A request body in whatever shape the caller supplied it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawBody {
    #[default]
    None,
    Text(String),
    /// Ordered `key=value` pairs, as a query-string builder produces them.
    UrlEncoded(Vec<(String, String)>),
    Blob {
        bytes: Bytes,
        content_type: Option<String>,
    },
    Bytes(Bytes),
    FormData(FormData),
    /// An already-structured value, e.g. an ajax `data` object.
    Json(Value),
}

impl RawBody {
    pub fn is_none(&self) -> bool {
        matches!(self, RawBody::None)
    }
}

impl From<Value> for RawBody {
    fn from(value: Value) -> Self {
        RawBody::Json(value)
    }
}

impl From<&str> for RawBody {
    fn from(value: &str) -> Self {
        RawBody::Text(value.to_string())
    }
}

impl From<String> for RawBody {
    fn from(value: String) -> Self {
        RawBody::Text(value)
    }
}

/// The body a route handler receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(FormData),
    /// Text that did not parse as JSON.
    Text(String),
}

impl RequestBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a top-level field of a JSON object body or a form body.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            RequestBody::Json(value) => value.get(name).cloned(),
            RequestBody::Form(form) => match form.get(name)? {
                FormValue::Text(text) => Some(Value::String(text.clone())),
                FormValue::File { .. } => None,
            },
            _ => None,
        }
    }

    pub fn str_field(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn bool_field(&self, name: &str) -> bool {
        match self.field(name) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Normalize a raw body for a handler.
///
/// Text-like bodies are parsed as JSON when they can be, url-encoded
/// content becomes a JSON object (last duplicate key wins), multipart
/// forms pass through, and anything else is kept as text.
pub fn normalize_body(raw: RawBody, content_type: Option<&str>) -> RequestBody {
    match raw {
        RawBody::None => RequestBody::Empty,
        RawBody::Json(value) => RequestBody::Json(value),
        RawBody::FormData(form) => RequestBody::Form(form),
        RawBody::UrlEncoded(pairs) => RequestBody::Json(pairs_to_object(pairs)),
        RawBody::Text(text) => normalize_text(text, content_type),
        RawBody::Bytes(bytes) => {
            normalize_text(String::from_utf8_lossy(&bytes).into_owned(), content_type)
        }
        RawBody::Blob {
            bytes,
            content_type: blob_type,
        } => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            normalize_text(text, blob_type.as_deref().or(content_type))
        }
    }
}

fn normalize_text(text: String, content_type: Option<&str>) -> RequestBody {
    if text.trim().is_empty() {
        return RequestBody::Empty;
    }
    if content_type.is_some_and(is_form_urlencoded) {
        let pairs = url::form_urlencoded::parse(text.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        return RequestBody::Json(pairs_to_object(pairs));
    }
    match serde_json::from_str(&text) {
        Ok(value) => RequestBody::Json(value),
        Err(_) => RequestBody::Text(text),
    }
}

fn pairs_to_object(pairs: Vec<(String, String)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key, Value::String(value));
    }
    Value::Object(map)
}

fn is_form_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}
