//! Line classification.

use chrono::{SecondsFormat, Utc};
use outbox_database::{NewOutboxEvent, Severity};
use uuid::Uuid;

/// Longest message kept per event, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Keywords in precedence order. The first one found wins.
const PRECEDENCE: [(&str, Severity); 5] = [
    ("CRITICAL", Severity::Critical),
    ("FATAL", Severity::Fatal),
    ("ERROR", Severity::Error),
    ("WARNING", Severity::Warning),
    ("WARN", Severity::Warning),
];

/// Severity of a line: first keyword hit in [`PRECEDENCE`], else `Info`.
///
/// Matching is a case-insensitive substring test against the whole line.
pub fn severity_of(line: &str) -> Severity {
    let upper = line.to_uppercase();
    for (keyword, severity) in PRECEDENCE {
        if upper.contains(keyword) {
            return severity;
        }
    }
    Severity::Info
}

/// Turn a raw line into an outbox event.
///
/// Returns `None` for empty or blank lines. The event gets a fresh UUID v4
/// id and the current UTC time.
pub fn classify(line: &str) -> Option<NewOutboxEvent> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return None;
    }

    Some(NewOutboxEvent {
        event_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        message: truncate_chars(line, MAX_MESSAGE_CHARS).to_string(),
        severity: severity_of(line),
    })
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_beats_warning() {
        assert_eq!(
            severity_of("WARNING: retrying after ERROR in worker"),
            Severity::Error
        );
    }

    #[test]
    fn test_precedence_order() {
        assert_eq!(severity_of("fatal and critical"), Severity::Critical);
        assert_eq!(severity_of("Fatal: error"), Severity::Fatal);
        assert_eq!(severity_of("warn: disk at 91%"), Severity::Warning);
        assert_eq!(severity_of("Warning: deprecated"), Severity::Warning);
    }

    #[test]
    fn test_substring_match() {
        // Substring, not word, matching.
        assert_eq!(severity_of("ErrorBoundary caught it"), Severity::Error);
        assert_eq!(severity_of("forewarned"), Severity::Warning);
    }

    #[test]
    fn test_no_keyword_is_info() {
        assert_eq!(severity_of("GET /health 200 3ms"), Severity::Info);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert!(classify("").is_none());
        assert!(classify("\n").is_none());
        assert!(classify("\r\n").is_none());
        assert!(classify("   \t").is_none());
    }

    #[test]
    fn test_classify_builds_event() {
        let event = classify("2024-01-01 CRITICAL db down\n").unwrap();

        assert_eq!(event.message, "2024-01-01 CRITICAL db down");
        assert_eq!(event.severity, Severity::Critical);
        assert!(Uuid::parse_str(&event.event_id).is_ok());
        assert!(event.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_fresh_id_per_call() {
        let a = classify("ERROR x").unwrap();
        let b = classify("ERROR x").unwrap();
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_long_message_truncated_on_char_boundary() {
        let line = "é".repeat(MAX_MESSAGE_CHARS + 10);
        let event = classify(&line).unwrap();

        assert_eq!(event.message.chars().count(), MAX_MESSAGE_CHARS);
    }
}
