//! Diagnostic reporting.

use super::codes::{DiagnosticCode, Severity};
use std::fmt;
use text_size::TextRange;

/// A source location: file plus character range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub file: String,
    pub span: TextRange,
}

impl Region {
    pub fn new(file: impl Into<String>, span: TextRange) -> Region {
        Region { file: file.into(), span }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}",
            self.file,
            u32::from(self.span.start()),
            u32::from(self.span.end())
        )
    }
}

/// A reported problem.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub region: Option<Region>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, region: Option<Region>, message: String) -> Diagnostic {
        Diagnostic { code, severity: code.severity(), message, region }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.region {
            Some(region) => {
                write!(f, "{}: {} {}: {}", region, kind, self.code.as_str(), self.message)
            }
            None => write!(f, "{} {}: {}", kind, self.code.as_str(), self.message),
        }
    }
}

/// Accumulates diagnostics for one compilation. The core never aborts on a
/// rule violation; the driver checks [`DiagnosticCollector::has_errors`]
/// between phases.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticCollector {
    pub fn new() -> DiagnosticCollector {
        DiagnosticCollector::default()
    }

    /// Report a diagnostic with a formatted message.
    pub fn report(&mut self, code: DiagnosticCode, region: Option<Region>, message: String) {
        if code.severity() == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(Diagnostic::new(code, region, message));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when a diagnostic with the given code was reported.
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}
