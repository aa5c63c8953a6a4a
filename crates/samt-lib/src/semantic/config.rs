//! Naming-convention lint, driven by an externally parsed configuration.
//!
//! The settings arrive as a plain struct; how they were read (a config file,
//! CLI flags, editor settings) is the host's business. Every check can be
//! turned off or re-levelled without touching the core.

use samt_core::{DiagnosticContext, Severity};
use serde::{Deserialize, Serialize};

use crate::ast::*;

/// Severity a lint reports at, or [`Level::Off`] to disable it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Error,
    Warning,
    Info,
    Off,
}

impl Level {
    fn severity(self) -> Option<Severity> {
        match self {
            Level::Error => Some(Severity::Error),
            Level::Warning => Some(Severity::Warning),
            Level::Info => Some(Severity::Info),
            Level::Off => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingConvention {
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    ScreamingSnakeCase,
}

impl NamingConvention {
    pub fn matches(self, name: &str) -> bool {
        if name.is_empty() {
            // Synthetic identifiers from lexer recovery; already reported.
            return true;
        }
        let no_separators = |name: &str| name.chars().all(|c| c.is_ascii_alphanumeric());
        match self {
            NamingConvention::PascalCase => {
                name.starts_with(|c: char| c.is_ascii_uppercase()) && no_separators(name)
            }
            NamingConvention::CamelCase => {
                name.starts_with(|c: char| c.is_ascii_lowercase()) && no_separators(name)
            }
            NamingConvention::SnakeCase => name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            NamingConvention::KebabCase => name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            NamingConvention::ScreamingSnakeCase => name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            NamingConvention::PascalCase => "PascalCase",
            NamingConvention::CamelCase => "camelCase",
            NamingConvention::SnakeCase => "snake_case",
            NamingConvention::KebabCase => "kebab-case",
            NamingConvention::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
        }
    }
}

/// Naming lint settings, one convention per construct kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinterConfig {
    pub level: Level,
    pub record_names: NamingConvention,
    pub enum_names: NamingConvention,
    pub enum_values: NamingConvention,
    pub service_names: NamingConvention,
    pub provider_names: NamingConvention,
    pub alias_names: NamingConvention,
    pub field_names: NamingConvention,
    pub operation_names: NamingConvention,
    pub parameter_names: NamingConvention,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            level: Level::Warning,
            record_names: NamingConvention::PascalCase,
            enum_names: NamingConvention::PascalCase,
            enum_values: NamingConvention::PascalCase,
            service_names: NamingConvention::PascalCase,
            provider_names: NamingConvention::PascalCase,
            alias_names: NamingConvention::PascalCase,
            field_names: NamingConvention::CamelCase,
            operation_names: NamingConvention::CamelCase,
            parameter_names: NamingConvention::CamelCase,
        }
    }
}

pub(super) fn check_naming(file: &FileNode, config: &LinterConfig, ctx: &mut DiagnosticContext) {
    let Some(severity) = config.level.severity() else {
        return;
    };

    // Packages are always lowercase dotted paths, independent of the
    // configurable conventions.
    for component in &file.package.name.components {
        if !NamingConvention::SnakeCase.matches(&component.name) {
            ctx.report(
                severity,
                format!("package component '{}' should be lowercase", component.name),
            )
            .highlight(component.location)
            .emit();
        }
    }

    for statement in &file.statements {
        match statement {
            StatementNode::Record(record) => {
                report(severity, "record", &record.name, config.record_names, ctx);
                for field in &record.fields {
                    report(severity, "field", &field.name, config.field_names, ctx);
                }
            }
            StatementNode::Enum(node) => {
                report(severity, "enum", &node.name, config.enum_names, ctx);
                for value in &node.values {
                    report(severity, "enum value", value, config.enum_values, ctx);
                }
            }
            StatementNode::TypeAlias(alias) => {
                report(severity, "type alias", &alias.name, config.alias_names, ctx);
            }
            StatementNode::Service(service) => {
                report(severity, "service", &service.name, config.service_names, ctx);
                for operation in &service.operations {
                    report(
                        severity,
                        "operation",
                        operation.name(),
                        config.operation_names,
                        ctx,
                    );
                    for parameter in operation.parameters() {
                        report(
                            severity,
                            "parameter",
                            &parameter.name,
                            config.parameter_names,
                            ctx,
                        );
                    }
                }
            }
            StatementNode::Provider(provider) => {
                report(severity, "provider", &provider.name, config.provider_names, ctx);
            }
            StatementNode::Consumer(_) => {}
        }
    }
}

fn report(
    severity: Severity,
    what: &str,
    name: &IdentifierNode,
    convention: NamingConvention,
    ctx: &mut DiagnosticContext,
) {
    if convention.matches(&name.name) {
        return;
    }
    ctx.report(
        severity,
        format!(
            "{what} name '{}' should be {}",
            name.name,
            convention.describe()
        ),
    )
    .highlight(name.location)
    .emit();
}
