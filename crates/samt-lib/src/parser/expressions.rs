//! Expression grammar for type references, constraints, and annotation
//! arguments.
//!
//! Precedence, loosest first: the `..` range operator, then the postfix forms
//! (call `(...)`, generic specialization `<...>`, optional `?`), then primary
//! expressions. Postfix forms fold left to right, so `Foo(1)?<Int>` parses as
//! `((Foo(1))?)<Int>`.

use samt_core::DiagnosticError;

use crate::ast::*;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> Result<ExpressionNode, DiagnosticError> {
        let left = self.parse_postfix()?;
        if self.skip(&TokenKind::DoublePeriod) {
            // Right-associative: `1..2..3` parses as `1..(2..3)`. The nested
            // range is nonsense as a bound, which the constraint checks report.
            let right = self.parse_expression()?;
            return Ok(ExpressionNode::Range(RangeExpressionNode {
                location: left.location().until(right.location()),
                left: Box::new(left),
                right: Box::new(right),
            }));
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<ExpressionNode, DiagnosticError> {
        let mut expression = self.parse_primary()?;
        loop {
            expression = match &self.current().kind {
                TokenKind::OpenParen => {
                    self.advance();
                    let mut arguments = Vec::new();
                    while !self.check(&TokenKind::CloseParen) {
                        arguments.push(self.parse_expression()?);
                        if !self.skip(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::CloseParen)?;
                    ExpressionNode::Call(CallExpressionNode {
                        location: expression.location().until(self.previous().location),
                        base: Box::new(expression),
                        arguments,
                    })
                }
                TokenKind::LessThan => {
                    self.advance();
                    let mut arguments = Vec::new();
                    while !self.check(&TokenKind::GreaterThan) {
                        arguments.push(self.parse_expression()?);
                        if !self.skip(&TokenKind::Comma) {
                            break;
                        }
                    }
                    let close = self.expect(&TokenKind::GreaterThan)?;
                    if arguments.is_empty() {
                        self.ctx
                            .error("expected at least one generic argument")
                            .highlight(expression.location().until(close.location))
                            .emit();
                    }
                    ExpressionNode::Generic(GenericSpecializationNode {
                        location: expression.location().until(close.location),
                        base: Box::new(expression),
                        arguments,
                    })
                }
                TokenKind::QuestionMark => {
                    let mark = self.advance();
                    ExpressionNode::Optional(OptionalDeclarationNode {
                        location: expression.location().until(mark.location),
                        base: Box::new(expression),
                    })
                }
                _ => return Ok(expression),
            };
        }
    }

    fn parse_primary(&mut self) -> Result<ExpressionNode, DiagnosticError> {
        match &self.current().kind {
            TokenKind::Integer(value) => {
                let value = *value;
                let token = self.advance();
                Ok(ExpressionNode::Integer(IntegerNode {
                    location: token.location,
                    value,
                }))
            }
            TokenKind::Float(value) => {
                let value = *value;
                let token = self.advance();
                Ok(ExpressionNode::Float(FloatNode {
                    location: token.location,
                    value,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.check(&TokenKind::True);
                let token = self.advance();
                Ok(ExpressionNode::Boolean(BooleanNode {
                    location: token.location,
                    value,
                }))
            }
            TokenKind::String(value) => {
                let value = value.clone();
                let token = self.advance();
                Ok(ExpressionNode::String(StringNode {
                    location: token.location,
                    value,
                }))
            }
            TokenKind::Identifier(_) => {
                let bundle = self.parse_bundle_identifier()?;
                Ok(if bundle.components.len() == 1 {
                    let only = bundle
                        .components
                        .into_iter()
                        .next()
                        .expect("bundle identifier is never empty");
                    ExpressionNode::Identifier(only)
                } else {
                    ExpressionNode::BundleIdentifier(bundle)
                })
            }
            TokenKind::Asterisk => {
                let token = self.advance();
                Ok(ExpressionNode::Wildcard(WildcardNode {
                    location: token.location,
                }))
            }
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::CloseParen)?;
                Ok(inner)
            }
            TokenKind::OpenBracket => self.parse_array(),
            TokenKind::OpenBrace => self.parse_object(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_array(&mut self) -> Result<ExpressionNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::OpenBracket)?;
        let mut values = Vec::new();
        while !self.check(&TokenKind::CloseBracket) {
            values.push(self.parse_expression()?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::CloseBracket)?;
        Ok(ExpressionNode::Array(ArrayNode {
            location: self.span_from(start),
            values,
        }))
    }

    fn parse_object(&mut self) -> Result<ExpressionNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::OpenBrace)?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::CloseBrace) {
            let name = self.expect_identifier()?;
            let field_start = name.location;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push(ObjectFieldNode {
                location: self.span_from(field_start),
                name,
                value,
            });
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::CloseBrace)?;
        Ok(ExpressionNode::Object(ObjectNode {
            location: self.span_from(start),
            fields,
        }))
    }
}
