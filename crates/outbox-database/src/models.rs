//! Database model types.

use serde::{Deserialize, Serialize};

/// Event severity, ordered by classification precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Fatal,
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    /// Parse a stored severity name. Unknown names read as `Info`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Self::Critical,
            "FATAL" => Self::Fatal,
            "ERROR" => Self::Error,
            "WARNING" | "WARN" => Self::Warning,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified event ready to be appended to the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutboxEvent {
    pub event_id: String,
    /// ISO-8601 UTC timestamp of classification.
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

/// A persisted outbox record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEvent {
    /// Store-assigned, monotonically increasing id. Defines drain order.
    pub local_id: i64,
    pub event_id: String,
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
    pub sent: bool,
}

/// Result of appending an event.
///
/// A duplicate `event_id` is an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    AlreadyExists,
}

impl AppendOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Stable identity of a file, independent of its path.
///
/// On Unix this is the (device, inode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    pub device: u64,
    pub inode: u64,
}

/// Persisted read position of the tailer for one watched path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailCursor {
    pub path: String,
    pub identity: FileIdentity,
    /// Byte offset just past the last fully consumed line.
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_round_trips_through_storage_string() {
        for severity in [
            Severity::Critical,
            Severity::Fatal,
            Severity::Error,
            Severity::Warning,
            Severity::Info,
        ] {
            assert_eq!(Severity::parse_lossy(severity.as_str()), severity);
        }
    }

    #[test]
    fn test_severity_warn_alias_and_unknown() {
        assert_eq!(Severity::parse_lossy("warn"), Severity::Warning);
        assert_eq!(Severity::parse_lossy("debug"), Severity::Info);
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_append_outcome() {
        assert!(AppendOutcome::Inserted.is_inserted());
        assert!(!AppendOutcome::AlreadyExists.is_inserted());
    }
}
