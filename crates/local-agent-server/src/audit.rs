// local-agent-server/src/audit.rs
// ============================================================================
// Module: Audit Logging
// Description: Append-only JSON-line records of every tool invocation.
// Purpose: Leave one durable record per `/tool/run` call, success or failure.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`AuditLog`] assigns each request an audit id, formats a [`ToolRunRecord`],
//! and hands it to an [`AuditSink`]. Sinks are best-effort: a write failure
//! is swallowed and never changes the response. The file sink serializes
//! writers with a mutex so records never interleave, and flushes per record.
//!
//! Operational events (startup, warnings) use [`LifecycleEvent`] and always
//! go to stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

use crate::tools::ToolError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix appended to truncated messages.
pub const TRUNCATION_MARKER: &str = "…(truncated)";
/// Longest caller-supplied tool name kept in a record.
const MAX_TOOL_LABEL_CHARS: usize = 64;

// ============================================================================
// SECTION: Records
// ============================================================================

/// One audit record per `/tool/run` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRunRecord {
    /// Event identifier (`tool_run`).
    pub event: &'static str,
    /// Audit id returned to the caller.
    pub audit_id: String,
    /// Request start (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Caller-supplied tool name; null when the request never got that far.
    pub tool: Option<String>,
    /// Serialized arguments; null for auth failures.
    pub args: Option<String>,
    /// `OK` or `ERROR`.
    pub status: &'static str,
    /// Error class for failures.
    pub error_kind: Option<&'static str>,
    /// Truncated result or error text.
    pub message: String,
}

/// Operational event written to stderr.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event-specific fields.
    #[serde(flatten)]
    pub fields: Value,
}

impl LifecycleEvent {
    /// Creates an event with the current timestamp.
    #[must_use]
    pub fn new(event: &'static str, fields: Value) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            fields,
        }
    }

    /// Writes the event to stderr as one JSON line.
    pub fn emit(&self) {
        if let Ok(payload) = serde_json::to_string(self) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Records one tool run. Failures are swallowed.
    fn record(&self, record: &ToolRunRecord);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, record: &ToolRunRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: &ToolRunRecord) {
        if let Ok(mut payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            payload.push('\n');
            let _ = file.write_all(payload.as_bytes());
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Audit id and start time reserved for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTicket {
    /// Audit id (`<timestamp_ms>-<sequence>`).
    pub audit_id: String,
    /// Request start (milliseconds since epoch).
    pub timestamp_ms: u128,
}

/// Request-level audit facade.
#[derive(Clone)]
pub struct AuditLog {
    /// Record destination.
    sink: Arc<dyn AuditSink>,
    /// Process-wide sequence for audit ids.
    sequence: Arc<AtomicU64>,
    /// Message truncation length in characters.
    max_message_chars: usize,
}

impl AuditLog {
    /// Creates an audit log over a sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, max_message_chars: usize) -> Self {
        Self {
            sink,
            sequence: Arc::new(AtomicU64::new(0)),
            max_message_chars,
        }
    }

    /// Reserves a unique audit id for a new request.
    #[must_use]
    pub fn ticket(&self) -> AuditTicket {
        let timestamp_ms = now_ms();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        AuditTicket {
            audit_id: format!("{timestamp_ms}-{sequence}"),
            timestamp_ms,
        }
    }

    /// Records the outcome of one request.
    pub fn record(
        &self,
        ticket: &AuditTicket,
        tool: Option<&str>,
        args: Option<&Value>,
        outcome: &Result<Value, ToolError>,
    ) {
        let (status, error_kind, message) = match outcome {
            Ok(result) => ("OK", None, render_result(result)),
            Err(err) => ("ERROR", Some(err.kind()), err.to_string()),
        };
        let record = ToolRunRecord {
            event: "tool_run",
            audit_id: ticket.audit_id.clone(),
            timestamp_ms: ticket.timestamp_ms,
            tool: tool.map(|name| truncate_chars(name, MAX_TOOL_LABEL_CHARS)),
            args: args.map(|value| {
                serde_json::to_string(value).unwrap_or_else(|_| "\"<unserializable>\"".to_string())
            }),
            status,
            error_kind,
            message: truncate_chars(&message, self.max_message_chars),
        };
        self.sink.record(&record);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a tool result as audit text.
fn render_result(result: &Value) -> String {
    match result {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Truncates to `max` characters, appending [`TRUNCATION_MARKER`] when cut.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[.. cut]),
        None => text.to_string(),
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
