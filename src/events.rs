//! Round event logging.
//!
//! Optional append-only diagnostics in NDJSON format (one JSON object per
//! line). When a round log path is configured, the orchestrator appends an
//! event per protocol step so a round that spans several hosts can be
//! reconstructed afterwards. Logging is best-effort: a failed append never
//! fails the round.

use crate::error::{FanoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Protocol steps that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Participant appended its identity to the registry.
    Register,
    /// This participant led the first barrier and published the task list.
    Publish,
    /// First barrier was missed (timeout or stale state); round continued.
    MissedBarrier,
    /// Quota-sized drain completed.
    Claim,
    /// Remainder sweep completed.
    Sweep,
    /// Registry removed at end of round.
    Cleanup,
}

/// One NDJSON event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The protocol step.
    pub action: EventAction,

    /// Participant identity (`pid@host`).
    pub actor: String,

    /// Freeform step-specific details.
    pub details: Value,
}

impl Event {
    /// Create a new event for the given step and actor.
    pub fn new(action: EventAction, actor: &str) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor.to_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| FanoutError::Io(format!("failed to serialize event: {}", e)))
    }
}

/// Append an event as one JSON line, creating the log file if needed.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            FanoutError::Io(format!(
                "failed to open event log '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        FanoutError::Io(format!(
            "failed to write event log '{}': {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn append_creates_file_with_one_line_per_event() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("round.ndjson");

        append_event(&path, &Event::new(EventAction::Register, "101@host")).unwrap();
        append_event(
            &path,
            &Event::new(EventAction::Claim, "101@host").with_details(json!({"claimed": 3})),
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, EventAction::Register);
        assert_eq!(first.actor, "101@host");

        let second: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.details["claimed"], 3);
    }

    #[test]
    fn events_serialize_to_single_lines_with_snake_case_actions() {
        let event = Event::new(EventAction::MissedBarrier, "7@host");
        let line = event.to_ndjson_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("\"missed_barrier\""));
    }
}
