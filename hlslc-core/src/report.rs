//! Diagnostic reporting.
//!
//! Analysis passes never unwind across statements: they push diagnostics
//! into a [`Reporter`] and continue at the next statement boundary. The
//! collected diagnostics are flushed, grouped by severity, into the
//! caller's [`Log`] sink at the end of a translation.

use std::fmt;
use thiserror::Error;

/// Hard failures that abort a translation immediately (as opposed to
/// diagnostics, which are collected).
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("internal error at {1}: {0}")]
    Internal(String, Span),
}

pub type Result<T> = std::result::Result<T, CompilerError>;

/// Source location: line and column, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Classification of a diagnostic, independent of its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    LexicalError,
    SyntaxError,
    UnresolvedSymbol,
    Redefinition,
    TypeMismatch,
    AmbiguousOverload,
    UnresolvedFunction,
    InvalidIntrinsicArity,
    InvalidSemantic,
    UnsupportedFeature,
    IoError,
    InternalError,
    Note,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportKind::LexicalError => "lexical error",
            ReportKind::SyntaxError => "syntax error",
            ReportKind::UnresolvedSymbol => "unresolved symbol",
            ReportKind::Redefinition => "redefinition",
            ReportKind::TypeMismatch => "type mismatch",
            ReportKind::AmbiguousOverload => "ambiguous overload",
            ReportKind::UnresolvedFunction => "unresolved function",
            ReportKind::InvalidIntrinsicArity => "invalid intrinsic arity",
            ReportKind::InvalidSemantic => "invalid semantic",
            ReportKind::UnsupportedFeature => "unsupported feature",
            ReportKind::IoError => "io error",
            ReportKind::InternalError => "internal error",
            ReportKind::Note => "note",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ReportKind,
    pub message: String,
    pub span: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at {}: {}",
            self.severity, self.kind, self.span, self.message
        )
    }
}

/// Sink that receives the flushed diagnostics of a translation.
pub trait Log {
    fn submit(&mut self, diagnostic: &Diagnostic);
}

/// Log sink that forwards diagnostics to the `log` facade.
#[derive(Debug, Default)]
pub struct StdLog;

impl Log for StdLog {
    fn submit(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{}", diagnostic),
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Error => log::error!("{}", diagnostic),
        }
    }
}

/// Buffered diagnostic collector shared by all passes of one translation.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    warnings_enabled: bool,
}

impl Reporter {
    pub fn new(warnings_enabled: bool) -> Self {
        Reporter {
            diagnostics: Vec::new(),
            warnings_enabled,
        }
    }

    pub fn error(&mut self, kind: ReportKind, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
        });
    }

    /// Warnings are dropped entirely when disabled in the options.
    pub fn warning(&mut self, kind: ReportKind, message: impl Into<String>, span: Span) {
        if self.warnings_enabled {
            self.diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                kind,
                message: message.into(),
                span,
            });
        }
    }

    pub fn info(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Info,
            kind: ReportKind::Note,
            message: message.into(),
            span,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Flush all collected diagnostics into the sink, grouped by severity
    /// (errors first, then warnings, then infos).
    pub fn flush(&mut self, log: &mut dyn Log) {
        for severity in [Severity::Error, Severity::Warning, Severity::Info] {
            for diagnostic in self.diagnostics.iter().filter(|d| d.severity == severity) {
                log.submit(diagnostic);
            }
        }
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collecting(Vec<String>);

    impl Log for Collecting {
        fn submit(&mut self, diagnostic: &Diagnostic) {
            self.0.push(diagnostic.to_string());
        }
    }

    #[test]
    fn test_flush_groups_by_severity() {
        let mut reporter = Reporter::new(true);
        reporter.warning(ReportKind::TypeMismatch, "w1", Span::new(1, 1));
        reporter.error(ReportKind::UnresolvedSymbol, "e1", Span::new(2, 1));
        reporter.info("i1", Span::new(3, 1));
        reporter.error(ReportKind::Redefinition, "e2", Span::new(4, 1));

        let mut sink = Collecting(Vec::new());
        reporter.flush(&mut sink);

        assert_eq!(sink.0.len(), 4);
        assert!(sink.0[0].contains("e1"));
        assert!(sink.0[1].contains("e2"));
        assert!(sink.0[2].contains("w1"));
        assert!(sink.0[3].contains("i1"));
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_warnings_disabled() {
        let mut reporter = Reporter::new(false);
        reporter.warning(ReportKind::TypeMismatch, "dropped", Span::new(1, 1));
        assert!(reporter.diagnostics().is_empty());
    }
}
