//! Core value types for the SAMT compiler: source files, positions, and the
//! diagnostics subsystem shared by every pipeline stage.
//!
//! Every token, AST node, and semantic entity carries a [`Location`]; every
//! stage writes into a [`DiagnosticContext`] owned by the run-wide
//! [`DiagnosticController`]. Stages report and continue wherever a sensible
//! continuation value exists; only file-local fatal conditions unwind, as a
//! [`DiagnosticError`] returned through `Result`.

pub mod diagnostics;
mod location;
mod source;

pub use diagnostics::{
    AnnotationKind, DiagnosticAnnotation, DiagnosticBuilder, DiagnosticContext,
    DiagnosticController, DiagnosticError, DiagnosticHighlight, DiagnosticMessage,
    DiagnosticsPrinter, Severity,
};
pub use location::{FileOffset, Location};
pub use source::{SourceFile, SourceId};
