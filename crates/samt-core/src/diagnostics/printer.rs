//! Renders accumulated diagnostics as annotated source excerpts.
//!
//! Output per message: a horizontal rule, `SEVERITY: message`, a
//! `--> path:row:col` locator with the source excerpt and `^` underlines when
//! highlights exist, suggestion patches, then `= info:` / `= help:` lines for
//! annotations. Nearby highlights are merged into one excerpt by the
//! underlying renderer; distant ones get separate excerpts joined by an
//! ellipsis row.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind as SpanKind, Group, Level, Patch, Renderer, Snippet};

use super::message::{AnnotationKind, DiagnosticMessage, Severity};
use super::DiagnosticController;
use crate::SourceFile;

const RULE_WIDTH: usize = 60;

/// Builder-pattern printer over a whole controller.
pub struct DiagnosticsPrinter<'a> {
    controller: &'a DiagnosticController,
    colored: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(controller: &'a DiagnosticController) -> Self {
        Self {
            controller,
            colored: false,
        }
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    /// Trailing summary line for the whole run.
    pub fn render_summary(&self, elapsed_ms: u128) -> String {
        let errors = self.controller.error_count();
        let warnings = self.controller.warning_count();
        let verdict = if errors > 0 { "FAILED" } else { "SUCCEEDED" };
        format!("BUILD {verdict} in {elapsed_ms}ms ({errors} error(s), {warnings} warning(s))")
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        for message in self.controller.global_messages() {
            writeln!(w, "{}", "-".repeat(RULE_WIDTH))?;
            writeln!(w, "{}: {}", heading(message.severity), message.message)?;
        }

        for context in self.controller.contexts() {
            let source = context.source();
            for message in context.messages() {
                writeln!(w, "{}", "-".repeat(RULE_WIDTH))?;
                self.format_message(w, &source, message)?;
            }
        }

        Ok(())
    }

    fn format_message(
        &self,
        w: &mut impl Write,
        source: &SourceFile,
        message: &DiagnosticMessage,
    ) -> std::fmt::Result {
        if message.highlights.is_empty() {
            writeln!(w, "{}: {}", heading(message.severity), message.message)?;
        } else {
            let renderer = if self.colored {
                Renderer::styled()
            } else {
                Renderer::plain()
            };

            let mut snippet = Snippet::source(source.content())
                .line_start(1)
                .path(source.path());

            for (i, highlight) in message.highlights.iter().enumerate() {
                let kind = if i == 0 {
                    SpanKind::Primary
                } else {
                    SpanKind::Context
                };
                let range = clamp(highlight.display_location().char_range(), source.content());
                let mut annotation = kind.span(range);
                if let Some(label) = &highlight.message {
                    annotation = annotation.label(label);
                }
                snippet = snippet.annotation(annotation);
            }

            let level = severity_to_level(message.severity);
            let mut report: Vec<Group> =
                vec![level.primary_title(&message.message).element(snippet)];

            for highlight in &message.highlights {
                if let Some(replacement) = &highlight.suggestion {
                    let range = clamp(highlight.display_location().char_range(), source.content());
                    report.push(
                        Level::HELP.secondary_title("consider changing this").element(
                            Snippet::source(source.content())
                                .line_start(1)
                                .patch(Patch::new(range, replacement)),
                        ),
                    );
                }
            }

            writeln!(w, "{}", renderer.render(&report))?;
        }

        for annotation in &message.annotations {
            let kind = match annotation.kind {
                AnnotationKind::Info => "info",
                AnnotationKind::Help => "help",
            };
            writeln!(w, " = {}: {}", kind, annotation.message)?;
        }

        Ok(())
    }
}

fn heading(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARNING",
        Severity::Info => "INFO",
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
        Severity::Info => Level::INFO,
    }
}

/// Empty spans render as a caret on the following character; spans are also
/// clamped to the source length so EOF diagnostics stay in bounds.
fn clamp(range: std::ops::Range<usize>, source: &str) -> std::ops::Range<usize> {
    let start = range.start.min(source.len());
    let end = range.end.min(source.len());
    if start == end {
        start..(start + 1).min(source.len())
    } else {
        start..end
    }
}

impl DiagnosticController {
    pub fn printer(&self) -> DiagnosticsPrinter<'_> {
        DiagnosticsPrinter::new(self)
    }
}
