//! Semantic analysis: structural per-file checks followed by cross-file
//! resolution into the [`SemanticModel`].
//!
//! All checks accumulate; nothing here is fatal. The build always returns a
//! usable model, and callers decide what to do with it after consulting
//! `DiagnosticController::has_errors`.

mod checks;
mod config;
mod model;
mod resolver;

#[cfg(test)]
mod tests;

pub use config::{Level, LinterConfig, NamingConvention};
pub use model::{
    AliasType, Annotation, AnnotationValue, Bound, Constraint, ConsumerType, Declaration,
    EnumType, Field, ImplementedService, Operation, OperationKind, Package, Parameter,
    ProviderType, RecordType, SemanticModel, ServiceType, Transport, Type, TypeId,
    TypeReference, UsedService,
};

use samt_core::DiagnosticController;

use crate::ast::FileNode;

/// Builds the resolved model from every parsed file of the run.
pub fn build(
    files: &[FileNode],
    config: &LinterConfig,
    controller: &mut DiagnosticController,
) -> SemanticModel {
    for file in files {
        let ctx = controller.context_mut(file.source());
        checks::check_file(file, ctx);
        config::check_naming(file, config, ctx);
    }
    resolver::Resolver::new(files, controller).resolve()
}
