//! Bridge transcripts as JSONL.
//!
//! One line per [`TranscriptEvent`]:
//!
//! ```text
//! {"seq":1,"at":"2026-10-17T09:14:03.221Z","event":"stream_opened","stream_id":"18f3-1",...}
//! ```
//!
//! `seq` orders records written within the same millisecond. Payload fields
//! sit next to the header; a payload that is not an object lands under
//! `value`. Files are appended to, so one transcript can span several runs.

use hearth_application::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use hearth_domain::JsonObject;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Serialize)]
struct TranscriptLine<'a> {
    seq: u64,
    at: String,
    event: &'a str,
    #[serde(flatten)]
    fields: JsonObject,
}

impl<'a> TranscriptLine<'a> {
    fn new(seq: u64, event: &'a TranscriptEvent) -> Self {
        let fields = match &event.payload {
            Value::Object(map) => map.clone(),
            Value::Null => JsonObject::new(),
            other => JsonObject::from_iter([("value".to_string(), other.clone())]),
        };
        Self {
            seq,
            at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event: event.event_type,
            fields,
        }
    }
}

/// Appends transcript lines to a file. Each line reaches the file as soon
/// as it is complete.
pub struct JsonlTranscriptLogger {
    file: Mutex<LineWriter<File>>,
    path: PathBuf,
    next_seq: AtomicU64,
    write_failed: AtomicBool,
}

impl JsonlTranscriptLogger {
    /// Open `path` for appending, creating it and missing parent
    /// directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Writing bridge transcript to {}", path.display());
        Ok(Self {
            file: Mutex::new(LineWriter::new(file)),
            path: path.to_path_buf(),
            next_seq: AtomicU64::new(1),
            write_failed: AtomicBool::new(false),
        })
    }

    /// Like [`open`](Self::open), but a transcript that cannot be opened
    /// is only worth a warning.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        Self::open(path)
            .inspect_err(|e| warn!("Transcript {} disabled: {}", path.display(), e))
            .ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &TranscriptLine<'_>) -> io::Result<()> {
        let mut encoded = serde_json::to_vec(line)?;
        encoded.push(b'\n');
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(&encoded)
    }
}

impl TranscriptLogger for JsonlTranscriptLogger {
    fn log(&self, event: TranscriptEvent) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.append(&TranscriptLine::new(seq, &event)) {
            // One warning per transcript; later failures are dropped quietly.
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                warn!("Transcript {} is not being written: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::jsonl;
    use serde_json::json;

    fn transcript(path: &Path) -> Vec<JsonObject> {
        jsonl::decode(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn stream_lifecycle_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bridge.transcript.jsonl");
        let logger = JsonlTranscriptLogger::new(&path).unwrap();

        logger.log(TranscriptEvent::new(
            "stream_opened",
            json!({"stream_id": "18f3-1", "source": "openrouter"}),
        ));
        logger.log(TranscriptEvent::new(
            "route_dispatched",
            json!({"method": "POST", "path": "/api/backends/chat-completions/generate", "status": 200}),
        ));
        logger.log(TranscriptEvent::new(
            "stream_closed",
            json!({"stream_id": "18f3-1", "phase": "done", "terminated": true}),
        ));

        // Lines are on disk without dropping the logger.
        let lines = transcript(&path);
        let events: Vec<&str> = lines.iter().map(|l| l["event"].as_str().unwrap()).collect();
        assert_eq!(events, ["stream_opened", "route_dispatched", "stream_closed"]);
        let seqs: Vec<u64> = lines.iter().map(|l| l["seq"].as_u64().unwrap()).collect();
        assert_eq!(seqs, [1, 2, 3]);
        assert_eq!(lines[0]["source"], "openrouter");
        assert_eq!(lines[2]["terminated"], true);
        assert!(lines[1]["at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn scalar_payloads_are_kept_under_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        let logger = JsonlTranscriptLogger::new(&path).unwrap();
        logger.log(TranscriptEvent::new("note", json!("interceptor installed")));
        logger.log(TranscriptEvent::new("note", Value::Null));

        let lines = transcript(&path);
        assert_eq!(lines[0]["value"], "interceptor installed");
        assert_eq!(lines[1].len(), 3, "only the header: {:?}", lines[1]);
    }

    #[test]
    fn later_runs_append_to_the_same_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        for run in 0..2 {
            let logger = JsonlTranscriptLogger::open(&path).unwrap();
            logger.log(TranscriptEvent::new("note", json!({ "run": run })));
        }
        let lines = transcript(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["run"], 1);
        assert_eq!(lines[1]["seq"], 1);
    }

    #[test]
    fn unusable_path_disables_the_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        assert!(JsonlTranscriptLogger::open(blocker.join("t.jsonl")).is_err());
        assert!(JsonlTranscriptLogger::new(blocker.join("t.jsonl")).is_none());
    }
}
