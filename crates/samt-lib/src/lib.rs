//! Compiler front-end for the SAMT interface-definition language.
//!
//! The pipeline is `lex → parse → build`: each file is lexed and parsed on
//! its own (a fatal error aborts that file only), then the semantic stage
//! resolves all files together into one [`SemanticModel`]. Diagnostics
//! accumulate in the [`DiagnosticController`] across every stage; consult
//! [`DiagnosticController::has_errors`] before trusting the model.
//!
//! ```no_run
//! use samt_core::DiagnosticController;
//! use samt_lib::{compile, LinterConfig};
//!
//! let mut controller = DiagnosticController::new();
//! let sources = vec![(
//!     "/tmp/person.samt".to_owned(),
//!     "package demo\n\nrecord Person { name: String }".to_owned(),
//! )];
//! let model = compile(sources, &LinterConfig::default(), &mut controller);
//! assert!(!controller.has_errors());
//! assert!(model.lookup("demo.Person").is_some());
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use semantic::{Level, LinterConfig, NamingConvention, SemanticModel};

use samt_core::DiagnosticController;

use crate::ast::FileNode;
use crate::lexer::Lexer;

/// Runs the full pipeline over `(path, content)` pairs.
pub fn compile(
    sources: impl IntoIterator<Item = (String, String)>,
    config: &LinterConfig,
    controller: &mut DiagnosticController,
) -> SemanticModel {
    let mut files: Vec<FileNode> = Vec::new();
    for (path, content) in sources {
        let ctx = controller.get_or_create_context(path, content);
        let source = ctx.source();

        let tokens = match Lexer::new(source.clone(), &mut *ctx).collect::<Result<Vec<_>, _>>()
        {
            Ok(tokens) => tokens,
            // The fatal diagnostic is already recorded; skip this file.
            Err(_) => continue,
        };
        match parser::parse(source, tokens, ctx) {
            Ok(file) => files.push(file),
            Err(_) => continue,
        }
    }
    semantic::build(&files, config, controller)
}
