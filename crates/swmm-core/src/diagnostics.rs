//! Collected messages from a conversion run.
//!
//! Conversions report progress, recoverable problems and fatal problems
//! through the [`crate::Feedback`] sink. The CLI collects everything it is
//! told into a [`Diagnostics`] so it can print a summary and optionally
//! write the issues to JSON. Every issue may carry:
//!
//! - a severity (Info, Warning, Error)
//! - a category used for grouping (parse, reference, geometry, ...)
//! - an entity reference such as `"Conduit C12"`
//! - a line number for issues raised while decoding `.inp` text
//!
//! # Example
//!
//! ```
//! use swmm_core::diagnostics::{DiagnosticIssue, Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add(
//!     DiagnosticIssue::new(Severity::Warning, "parse", "Expected a number for Elev, found 'abc'")
//!         .with_line(12),
//! );
//! diag.add(
//!     DiagnosticIssue::new(Severity::Error, "topology", "Unknown outlet node").with_entity("C1"),
//! );
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress or informational note
    Info,
    /// Unusual but the conversion continued (e.g. a defaulted value)
    Warning,
    /// An element could not be converted
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "parse", "reference", "geometry")
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Message followed by the entity and line, when present.
    pub fn detail(&self) -> String {
        let mut text = self.message.clone();
        if let Some(entity) = &self.entity {
            text.push_str(&format!(" ({})", entity));
        }
        if let Some(line) = self.line {
            text.push_str(&format!(" at line {}", line));
        }
        text
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.severity, self.category, self.detail())
    }
}

/// Collection of diagnostic issues for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of at least the given severity
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity >= severity)
    }

    /// One-line summary, e.g. `"2 warnings, 1 error"`
    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "no issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in self.at_least(Severity::Warning) {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity, message: &str) -> DiagnosticIssue {
        DiagnosticIssue::new(severity, "parse", message)
    }

    #[test]
    fn test_empty_diagnostics() {
        let diag = Diagnostics::new();
        assert!(diag.is_empty());
        assert_eq!(diag.error_count(), 0);
        assert_eq!(diag.summary(), "no issues");
    }

    #[test]
    fn test_info_not_counted_in_summary() {
        let mut diag = Diagnostics::new();
        diag.add(DiagnosticIssue::new(Severity::Info, "progress", "Reading CONDUITS"));
        diag.add(issue(Severity::Warning, "bad number"));
        assert_eq!(diag.count(Severity::Info), 1);
        assert_eq!(diag.summary(), "1 warning");
        assert_eq!(diag.at_least(Severity::Warning).count(), 1);
    }

    #[test]
    fn test_summary_pluralization() {
        let mut diag = Diagnostics::new();
        diag.add(issue(Severity::Warning, "1"));
        diag.add(issue(Severity::Warning, "2"));
        diag.add(issue(Severity::Error, "3"));
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Warning, "parse", "Expected a number")
            .with_entity("Junction J1")
            .with_line(42);
        assert_eq!(
            issue.to_string(),
            "[warning:parse] Expected a number (Junction J1) at line 42"
        );
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let mut diag = Diagnostics::new();
        diag.add(DiagnosticIssue::new(Severity::Error, "reference", "dangling link"));
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(!json.contains("line"));
    }

    #[test]
    fn test_display_lists_warnings_and_errors() {
        let mut diag = Diagnostics::new();
        diag.add(DiagnosticIssue::new(Severity::Info, "progress", "quiet"));
        diag.add(issue(Severity::Warning, "bad int").with_line(7));
        let text = diag.to_string();
        assert!(text.starts_with("Diagnostics: 1 warning"));
        assert!(text.contains("bad int at line 7"));
        assert!(!text.contains("quiet"));
    }
}
