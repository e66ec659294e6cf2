//! Regex pre-filter applied before classification.

use crate::TailerResult;
use regex::{Regex, RegexBuilder};

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "(ERROR|CRITICAL|FATAL|Exception|Traceback)";

/// Decides which lines are worth classifying at all.
///
/// This is separate from severity: a line passing the filter can still
/// classify as `INFO`.
#[derive(Debug, Clone)]
pub struct LineFilter {
    pattern: Option<Regex>,
}

impl LineFilter {
    /// Case-insensitive filter on `pattern`.
    pub fn new(pattern: &str) -> TailerResult<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// A filter that lets every line through.
    pub fn match_all() -> Self {
        Self { pattern: None }
    }

    pub fn matches(&self, line: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(line),
            None => true,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(|r| r.as_str())
    }
}

impl Default for LineFilter {
    fn default() -> Self {
        // DEFAULT_PATTERN is a constant and always compiles.
        Self::new(DEFAULT_PATTERN).unwrap_or_else(|_| Self::match_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern() {
        let filter = LineFilter::default();

        assert_eq!(filter.pattern(), Some(DEFAULT_PATTERN));
        assert!(filter.matches("ERROR: boom"));
        assert!(filter.matches("Traceback (most recent call last):"));
        assert!(filter.matches("java.lang.NullPointerException"));
        assert!(!filter.matches("WARNING: slow query"));
        assert!(!filter.matches("GET /health 200"));
    }

    #[test]
    fn test_case_insensitive() {
        let filter = LineFilter::default();
        assert!(filter.matches("fatal: not a git repository"));
    }

    #[test]
    fn test_match_all() {
        let filter = LineFilter::match_all();
        assert!(filter.pattern().is_none());
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            LineFilter::new("(unclosed"),
            Err(crate::TailerError::Pattern(_))
        ));
    }
}
