//! Diagnostics: accumulate, don't short-circuit.
//!
//! Every stage takes its file's [`DiagnosticContext`] by mutable reference and
//! writes messages directly into it. Messages are kept in insertion order,
//! which matches reporting order, which matches source-scan order; tests
//! assert exact message sequences against it.
//!
//! Recoverable conditions use [`DiagnosticContext::report`] (and the
//! `error`/`warn`/`info` shorthands) and finish with
//! [`DiagnosticBuilder::emit`]. Fatal conditions finish with
//! [`DiagnosticBuilder::fatal`] instead, which records the message and hands
//! back a [`DiagnosticError`] that unwinds only to the per-file orchestration
//! boundary.

mod message;
mod printer;


use std::sync::Arc;

use indexmap::IndexMap;

pub use message::{
    AnnotationKind, DiagnosticAnnotation, DiagnosticHighlight, DiagnosticMessage, Severity,
};
pub use printer::DiagnosticsPrinter;

use crate::{Location, SourceFile, SourceId};

/// Stage-abort signal carrying the already-recorded fatal message.
///
/// Callers stop processing the current file, never the whole run.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DiagnosticError(pub String);

/// Per-run aggregate: one context per distinct source file plus the global
/// (file-independent) messages.
#[derive(Debug, Default)]
pub struct DiagnosticController {
    contexts: IndexMap<String, DiagnosticContext>,
    global_messages: Vec<DiagnosticMessage>,
}

impl DiagnosticController {
    pub fn new() -> Self {
        Self::default()
    }

    /// One context per distinct source file, idempotent by path. The content
    /// of an already-registered path is left untouched.
    pub fn get_or_create_context(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> &mut DiagnosticContext {
        let path = path.into();
        let next_id = SourceId(self.contexts.len() as u32);
        self.contexts
            .entry(path.clone())
            .or_insert_with(|| DiagnosticContext {
                source: Arc::new(SourceFile::new(next_id, path, content)),
                messages: Vec::new(),
            })
    }

    pub fn context(&self, id: SourceId) -> &DiagnosticContext {
        &self.contexts[id.index()]
    }

    pub fn context_mut(&mut self, id: SourceId) -> &mut DiagnosticContext {
        &mut self.contexts[id.index()]
    }

    pub fn contexts(&self) -> impl Iterator<Item = &DiagnosticContext> {
        self.contexts.values()
    }

    pub fn source(&self, id: SourceId) -> Arc<SourceFile> {
        self.contexts[id.index()].source()
    }

    pub fn report_global_error(&mut self, message: impl Into<String>) {
        self.report_global(Severity::Error, message);
    }

    pub fn report_global_warning(&mut self, message: impl Into<String>) {
        self.report_global(Severity::Warning, message);
    }

    pub fn report_global_info(&mut self, message: impl Into<String>) {
        self.report_global(Severity::Info, message);
    }

    fn report_global(&mut self, severity: Severity, message: impl Into<String>) {
        self.global_messages.push(DiagnosticMessage {
            severity,
            message: message.into(),
            highlights: Vec::new(),
            annotations: Vec::new(),
        });
    }

    pub fn global_messages(&self) -> &[DiagnosticMessage] {
        &self.global_messages
    }

    pub fn has_errors(&self) -> bool {
        self.global_messages.iter().any(|m| m.is_error())
            || self.contexts.values().any(|c| c.has_errors())
    }

    pub fn has_warnings(&self) -> bool {
        self.global_messages.iter().any(|m| m.is_warning())
            || self.contexts.values().any(|c| c.has_warnings())
    }

    pub fn has_infos(&self) -> bool {
        self.global_messages.iter().any(|m| m.is_info())
            || self.contexts.values().any(|c| c.has_infos())
    }

    pub fn has_messages(&self) -> bool {
        !self.global_messages.is_empty() || self.contexts.values().any(|c| c.has_messages())
    }

    pub fn error_count(&self) -> usize {
        self.global_messages.iter().filter(|m| m.is_error()).count()
            + self.contexts.values().map(|c| c.error_count()).sum::<usize>()
    }

    pub fn warning_count(&self) -> usize {
        self.global_messages
            .iter()
            .filter(|m| m.is_warning())
            .count()
            + self
                .contexts
                .values()
                .map(|c| c.warning_count())
                .sum::<usize>()
    }
}

/// Message accumulator for one source file.
#[derive(Debug)]
pub struct DiagnosticContext {
    source: Arc<SourceFile>,
    messages: Vec<DiagnosticMessage>,
}

impl DiagnosticContext {
    /// Shared handle to the file; clone it before starting a stage that also
    /// needs the context mutably.
    pub fn source(&self) -> Arc<SourceFile> {
        Arc::clone(&self.source)
    }

    pub fn source_id(&self) -> SourceId {
        self.source.id()
    }

    pub fn path(&self) -> &str {
        self.source.path()
    }

    /// Start a diagnostic. The message is set exactly once, here.
    pub fn report(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
    ) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            sink: &mut self.messages,
            message: DiagnosticMessage {
                severity,
                message: message.into(),
                highlights: Vec::new(),
                annotations: Vec::new(),
            },
        }
    }

    pub fn error(&mut self, message: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Error, message)
    }

    pub fn warn(&mut self, message: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Warning, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Info, message)
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.is_warning())
    }

    pub fn has_infos(&self) -> bool {
        self.messages.iter().any(|m| m.is_info())
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_warning()).count()
    }
}

#[must_use = "diagnostic not recorded, call .emit() or .fatal()"]
pub struct DiagnosticBuilder<'a> {
    sink: &'a mut Vec<DiagnosticMessage>,
    message: DiagnosticMessage,
}

impl DiagnosticBuilder<'_> {
    /// Plain highlight without a label.
    pub fn highlight(mut self, location: Location) -> Self {
        self.message.highlights.push(DiagnosticHighlight {
            message: None,
            location,
            suggestion: None,
            beginning_only: false,
        });
        self
    }

    /// Labeled highlight.
    pub fn highlight_msg(mut self, message: impl Into<String>, location: Location) -> Self {
        self.message.highlights.push(DiagnosticHighlight {
            message: Some(message.into()),
            location,
            suggestion: None,
            beginning_only: false,
        });
        self
    }

    /// Labeled highlight collapsed to a single character at the span start.
    pub fn highlight_beginning(mut self, message: impl Into<String>, location: Location) -> Self {
        self.message.highlights.push(DiagnosticHighlight {
            message: Some(message.into()),
            location,
            suggestion: None,
            beginning_only: true,
        });
        self
    }

    /// Attach a change suggestion to the most recent highlight.
    pub fn suggest(mut self, replacement: impl Into<String>) -> Self {
        let highlight = self
            .message
            .highlights
            .last_mut()
            .expect("suggest() requires a preceding highlight");
        highlight.suggestion = Some(replacement.into());
        self
    }

    pub fn annotate_info(mut self, message: impl Into<String>) -> Self {
        self.message.annotations.push(DiagnosticAnnotation {
            kind: AnnotationKind::Info,
            message: message.into(),
        });
        self
    }

    pub fn annotate_help(mut self, message: impl Into<String>) -> Self {
        self.message.annotations.push(DiagnosticAnnotation {
            kind: AnnotationKind::Help,
            message: message.into(),
        });
        self
    }

    /// Record the diagnostic and continue.
    pub fn emit(self) {
        self.sink.push(self.message);
    }

    /// Record the diagnostic as an error and return the stage-abort signal.
    pub fn fatal(mut self) -> DiagnosticError {
        self.message.severity = Severity::Error;
        let text = self.message.message.clone();
        self.sink.push(self.message);
        DiagnosticError(text)
    }
}
