//! Recursive-descent parser for SAMT source files.
//!
//! # Recovery strategy
//!
//! The parser recovers from local mistakes so editors and linters still get a
//! best-effort tree: misplaced imports and statements are reported but kept,
//! a duplicate package declaration is reported and the last one wins, and
//! invalid clauses (wildcard-import aliases, oneway return types, second
//! transports) are reported while parsing continues. Only conditions with no
//! sensible continuation are fatal: a mandatory token that is absent, an
//! unexpected end of file, or a file without any package declaration. A fatal
//! error unwinds as [`DiagnosticError`] and aborts this file only.

mod declarations;
mod expressions;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use samt_core::{DiagnosticContext, DiagnosticError, Location, SourceFile};

use crate::ast::*;
use crate::lexer::{Token, TokenKind};

/// Parses one file's token stream into a [`FileNode`].
pub fn parse(
    source: Arc<SourceFile>,
    tokens: Vec<Token>,
    ctx: &mut DiagnosticContext,
) -> Result<FileNode, DiagnosticError> {
    Parser::new(source, tokens, ctx).parse_file()
}

pub(crate) struct Parser<'a> {
    #[allow(dead_code)] // kept for grammar rules that need raw source access
    source: Arc<SourceFile>,
    ctx: &'a mut DiagnosticContext,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: Arc<SourceFile>, tokens: Vec<Token>, ctx: &'a mut DiagnosticContext) -> Self {
        debug_assert!(
            matches!(
                tokens.last(),
                Some(Token {
                    kind: TokenKind::End,
                    ..
                })
            ),
            "token stream must end with the end-of-file sentinel"
        );
        Self {
            source,
            ctx,
            tokens,
            pos: 0,
        }
    }

    pub(super) fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("token stream is never empty")
        })
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Peek without consuming.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.current().kind.matches(kind)
    }

    /// Consume if present.
    pub(super) fn skip(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume or fail fatally.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<Token, DiagnosticError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(&kind.to_string()))
    }

    pub(super) fn expect_identifier(&mut self) -> Result<IdentifierNode, DiagnosticError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok(IdentifierNode {
                    location: token.location,
                    name,
                })
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    pub(super) fn unexpected(&mut self, what: &str) -> DiagnosticError {
        let current = self.current().clone();
        let message = if current.kind == TokenKind::End {
            format!("expected {what} but reached the end of the file")
        } else {
            format!("expected {what} but found {}", current.kind)
        };
        self.ctx.error(message).highlight(current.location).fatal()
    }

    /// Span from `start` through the most recently consumed token.
    pub(super) fn span_from(&self, start: Location) -> Location {
        start.until(self.previous().location)
    }

    fn parse_file(mut self) -> Result<FileNode, DiagnosticError> {
        let start = self.current().location;
        let mut imports: Vec<ImportNode> = Vec::new();
        let mut package: Option<PackageDeclarationNode> = None;
        let mut statements: Vec<StatementNode> = Vec::new();

        while !self.check(&TokenKind::End) {
            match &self.current().kind {
                TokenKind::Import => {
                    let node = self.parse_import()?;
                    if package.is_some() {
                        self.ctx
                            .error("import statements must be placed before the package declaration")
                            .highlight(node.location())
                            .emit();
                    }
                    imports.push(node);
                }
                TokenKind::Package => {
                    let node = self.parse_package()?;
                    if let Some(previous) = &package {
                        let cited = format!(
                            "the package was previously declared at {}:{}",
                            self.ctx.path(),
                            previous.location.start
                        );
                        self.ctx
                            .error("too many package declarations, only one is allowed per file")
                            .highlight_msg("this declaration overrides the previous one", node.location)
                            .highlight(previous.location)
                            .annotate_info(cited)
                            .emit();
                    }
                    // The last declaration wins.
                    package = Some(node);
                }
                _ => {
                    let node = self.parse_statement()?;
                    if package.is_none() {
                        self.ctx
                            .error("statements must be placed after the package declaration")
                            .highlight(node.location())
                            .emit();
                    }
                    statements.push(node);
                }
            }
        }

        let Some(package) = package else {
            let location = self.current().location;
            return Err(self
                .ctx
                .error("files must declare a package")
                .highlight(location)
                .fatal());
        };

        Ok(FileNode {
            location: self.span_from(start),
            imports,
            package,
            statements,
        })
    }

    fn parse_import(&mut self) -> Result<ImportNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Import)?;

        let mut components = vec![self.expect_identifier()?];
        let mut wildcard = false;
        while self.skip(&TokenKind::Period) {
            if self.skip(&TokenKind::Asterisk) {
                wildcard = true;
                break;
            }
            components.push(self.expect_identifier()?);
        }

        let name = BundleIdentifierNode {
            location: components[0].location.until(self.previous().location),
            components,
        };

        let mut alias = None;
        if self.skip(&TokenKind::As) {
            let alias_name = self.expect_identifier()?;
            if wildcard {
                // The alias is discarded.
                self.ctx
                    .error("wildcard imports cannot declare an alias")
                    .highlight(alias_name.location)
                    .emit();
            } else {
                alias = Some(alias_name);
            }
        }

        let location = self.span_from(start);
        Ok(if wildcard {
            ImportNode::Wildcard(WildcardImportNode { location, name })
        } else {
            ImportNode::Type(TypeImportNode {
                location,
                name,
                alias,
            })
        })
    }

    fn parse_package(&mut self) -> Result<PackageDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Package)?;
        let name = self.parse_bundle_identifier()?;
        Ok(PackageDeclarationNode {
            location: self.span_from(start),
            name,
        })
    }

    pub(super) fn parse_bundle_identifier(
        &mut self,
    ) -> Result<BundleIdentifierNode, DiagnosticError> {
        let mut components = vec![self.expect_identifier()?];
        while self.skip(&TokenKind::Period) {
            components.push(self.expect_identifier()?);
        }
        Ok(BundleIdentifierNode {
            location: components[0].location.until(self.previous().location),
            components,
        })
    }
}
