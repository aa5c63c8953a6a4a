//! Immutable diagnostic values produced by the builder.

use serde::Serialize;

use crate::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Message-only side note attached to a diagnostic, rendered as
/// `= info:` / `= help:` lines below the source excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnnotationKind {
    Info,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticAnnotation {
    pub kind: AnnotationKind,
    pub message: String,
}

/// A highlighted source span belonging to a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticHighlight {
    /// Optional label rendered next to the underline.
    pub message: Option<String>,
    pub location: Location,
    /// Suggested replacement text for the highlighted span.
    pub suggestion: Option<String>,
    /// Collapse the underline to a single character at the span start.
    pub beginning_only: bool,
}

impl DiagnosticHighlight {
    /// The span as rendered, honoring `beginning_only`.
    pub fn display_location(&self) -> Location {
        if self.beginning_only {
            self.location.beginning()
        } else {
            self.location
        }
    }
}

/// One frozen diagnostic: severity, primary message, highlights, annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub message: String,
    pub highlights: Vec<DiagnosticHighlight>,
    pub annotations: Vec<DiagnosticAnnotation>,
}

impl DiagnosticMessage {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_info(&self) -> bool {
        self.severity == Severity::Info
    }
}
