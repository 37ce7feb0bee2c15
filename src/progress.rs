//! Ingestion progress reporting.
//!
//! Reports observable progress during `docfeed ingest` so users see the
//! reset happen, which files are being read, and which inputs were skipped
//! or failed. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts. Skip events exist on purpose: unsupported
//! extensions, blank records, and dropped JSON elements are deliberate
//! drops, but they must be visible, not silent.

use std::io::Write;

/// A single progress event for an ingestion run.
#[derive(Clone, Debug)]
pub enum IngestEvent {
    /// The persisted store is being destroyed before the rebuild.
    Resetting { location: String },
    /// The source directory is being enumerated.
    Scanning { dir: String },
    /// One record was chunked and loaded: n of total.
    Ingesting { title: String, n: u64, total: u64 },
    /// An input was deliberately skipped (unsupported extension, blank
    /// record, element without a text field).
    Skipped { subject: String, reason: String },
    /// Extraction failed for one file; the run continues without it.
    Failed { path: String, error: String },
}

/// Reports ingestion progress. Implementations write to stderr.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IngestEvent);
}

/// Human-friendly progress on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IngestEvent) {
        let line = match &event {
            IngestEvent::Resetting { location } => {
                format!("ingest  resetting store at {}\n", location)
            }
            IngestEvent::Scanning { dir } => format!("ingest  scanning {}\n", dir),
            IngestEvent::Ingesting { title, n, total } => format!(
                "ingest  {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                title
            ),
            IngestEvent::Skipped { subject, reason } => {
                format!("ingest  skipped {} ({})\n", subject, reason)
            }
            IngestEvent::Failed { path, error } => {
                format!("ingest  FAILED {}: {}\n", path, error)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: IngestEvent) {
        let obj = match &event {
            IngestEvent::Resetting { location } => serde_json::json!({
                "event": "resetting",
                "location": location
            }),
            IngestEvent::Scanning { dir } => serde_json::json!({
                "event": "scanning",
                "dir": dir
            }),
            IngestEvent::Ingesting { title, n, total } => serde_json::json!({
                "event": "ingesting",
                "title": title,
                "n": n,
                "total": total
            }),
            IngestEvent::Skipped { subject, reason } => serde_json::json!({
                "event": "skipped",
                "subject": subject,
                "reason": reason
            }),
            IngestEvent::Failed { path, error } => serde_json::json!({
                "event": "failed",
                "path": path,
                "error": error
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IngestEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
