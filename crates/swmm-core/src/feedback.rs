//! Injected progress and message sink.
//!
//! Every conversion entry point takes a `&mut dyn Feedback`. Nothing in the
//! library builds its own default; callers choose between [`LogFeedback`]
//! (forwards to `tracing`) and [`CapturingFeedback`] (stores issues).

use std::cell::Cell;

use tracing::{error, info, warn};

use crate::diagnostics::{DiagnosticIssue, Diagnostics, Severity};
use crate::error::{SwmmError, SwmmResult};

pub trait Feedback {
    fn push_info(&mut self, msg: &str);

    fn push_warning(&mut self, msg: &str);

    /// Record a non-fatal error message.
    fn push_error(&mut self, msg: &str);

    /// Record an issue that carries a category, line or entity. The default
    /// folds those into the message text.
    fn push_issue(&mut self, issue: DiagnosticIssue) {
        let msg = issue.detail();
        match issue.severity {
            Severity::Info => self.push_info(&msg),
            Severity::Warning => self.push_warning(&msg),
            Severity::Error => self.push_error(&msg),
        }
    }

    /// Record an error. When `fatal` is set the returned `Err` must be
    /// propagated so the pipeline halts.
    fn report_error(&mut self, msg: &str, fatal: bool) -> SwmmResult<()> {
        self.push_error(msg);
        if fatal {
            Err(SwmmError::Fatal(msg.to_string()))
        } else {
            Ok(())
        }
    }

    fn is_canceled(&self) -> bool {
        false
    }

    fn check_canceled(&self) -> SwmmResult<()> {
        if self.is_canceled() {
            Err(SwmmError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Feedback that only logs through `tracing`.
#[derive(Debug, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn push_info(&mut self, msg: &str) {
        info!("{}", msg);
    }

    fn push_warning(&mut self, msg: &str) {
        warn!("{}", msg);
    }

    fn push_error(&mut self, msg: &str) {
        error!("{}", msg);
    }
}

/// Feedback that keeps every message as a [`DiagnosticIssue`].
///
/// Cancellation can be requested with [`CapturingFeedback::cancel_after`],
/// which makes `is_canceled` return true once the given number of checks
/// have passed.
#[derive(Debug, Default)]
pub struct CapturingFeedback {
    pub diagnostics: Diagnostics,
    pub log: bool,
    cancel_after: Option<usize>,
    checks: Cell<usize>,
}

impl CapturingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture and also forward to `tracing`.
    pub fn logging() -> Self {
        Self {
            log: true,
            ..Self::default()
        }
    }

    pub fn cancel_after(mut self, checks: usize) -> Self {
        self.cancel_after = Some(checks);
        self
    }

    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.diagnostics
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| i.message.as_str())
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    /// True when any warning or error contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.diagnostics
            .at_least(Severity::Warning)
            .any(|i| i.message.contains(needle))
    }

    fn push(&mut self, severity: Severity, msg: &str) {
        self.diagnostics
            .add(DiagnosticIssue::new(severity, "conversion", msg));
    }

    /// Issues recorded with the given category.
    pub fn in_category(&self, category: &str) -> Vec<&DiagnosticIssue> {
        self.diagnostics
            .issues
            .iter()
            .filter(|i| i.category == category)
            .collect()
    }
}

impl Feedback for CapturingFeedback {
    fn push_info(&mut self, msg: &str) {
        if self.log {
            info!("{}", msg);
        }
        self.push(Severity::Info, msg);
    }

    fn push_warning(&mut self, msg: &str) {
        if self.log {
            warn!("{}", msg);
        }
        self.push(Severity::Warning, msg);
    }

    fn push_error(&mut self, msg: &str) {
        if self.log {
            error!("{}", msg);
        }
        self.push(Severity::Error, msg);
    }

    fn push_issue(&mut self, issue: DiagnosticIssue) {
        if self.log {
            match issue.severity {
                Severity::Info => info!("{}", issue.detail()),
                Severity::Warning => warn!("{}", issue.detail()),
                Severity::Error => error!("{}", issue.detail()),
            }
        }
        self.diagnostics.add(issue);
    }

    fn is_canceled(&self) -> bool {
        match self.cancel_after {
            Some(limit) => {
                let seen = self.checks.get();
                self.checks.set(seen + 1);
                seen >= limit
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_report_returns_error() {
        let mut fb = CapturingFeedback::new();
        let res = fb.report_error("missing layer", true);
        assert!(matches!(res, Err(SwmmError::Fatal(ref m)) if m == "missing layer"));
        assert_eq!(fb.errors(), vec!["missing layer"]);
    }

    #[test]
    fn non_fatal_report_continues() {
        let mut fb = CapturingFeedback::new();
        assert!(fb.report_error("bad row", false).is_ok());
        assert_eq!(fb.diagnostics.error_count(), 1);
    }

    #[test]
    fn cancel_after_counts_checks() {
        let fb = CapturingFeedback::new().cancel_after(2);
        assert!(fb.check_canceled().is_ok());
        assert!(fb.check_canceled().is_ok());
        assert!(matches!(fb.check_canceled(), Err(SwmmError::Canceled)));
    }

    #[test]
    fn issues_keep_line_and_entity() {
        let mut fb = CapturingFeedback::new();
        fb.push_issue(DiagnosticIssue::new(Severity::Warning, "parse", "bad number").with_line(7));
        fb.push_issue(
            DiagnosticIssue::new(Severity::Error, "topology", "duplicate").with_entity("J1"),
        );
        let parse = fb.in_category("parse");
        assert_eq!(parse.len(), 1);
        assert_eq!(parse[0].line, Some(7));
        assert_eq!(fb.in_category("topology")[0].entity.as_deref(), Some("J1"));
        assert_eq!(fb.diagnostics.summary(), "1 warning, 1 error");
    }

    #[derive(Default)]
    struct Lines(Vec<String>);

    impl Feedback for Lines {
        fn push_info(&mut self, msg: &str) {
            self.0.push(format!("info {}", msg));
        }

        fn push_warning(&mut self, msg: &str) {
            self.0.push(format!("warning {}", msg));
        }

        fn push_error(&mut self, msg: &str) {
            self.0.push(format!("error {}", msg));
        }
    }

    #[test]
    fn default_issue_folds_location_into_text() {
        let mut fb = Lines::default();
        fb.push_issue(
            DiagnosticIssue::new(Severity::Warning, "parse", "bad number")
                .with_entity("J1")
                .with_line(3),
        );
        assert_eq!(fb.0, vec!["warning bad number (J1) at line 3"]);
    }

    #[test]
    fn mentions_ignores_info() {
        let mut fb = CapturingFeedback::new();
        fb.push_info("Reading pumps");
        fb.push_warning("Pump curve not converted");
        assert!(fb.mentions("Pump curve"));
        assert!(!fb.mentions("Reading"));
    }
}
