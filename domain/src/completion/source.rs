//! Completion sources and the wire format each one speaks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider wire format used when synthesizing frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    OpenAi,
    Anthropic,
    Google,
    Cohere,
}

/// The declared `chat_completion_source` of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CompletionSource(String);

impl CompletionSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Downstream parsers expect provider-native shapes; everything that is
    /// not Anthropic, Google or Cohere speaks the OpenAI dialect.
    pub fn wire_format(&self) -> WireFormat {
        match self.0.as_str() {
            "claude" | "anthropic" => WireFormat::Anthropic,
            "makersuite" | "vertexai" | "google" | "gemini" => WireFormat::Google,
            "cohere" => WireFormat::Cohere,
            _ => WireFormat::OpenAi,
        }
    }
}

impl fmt::Display for CompletionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompletionSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
