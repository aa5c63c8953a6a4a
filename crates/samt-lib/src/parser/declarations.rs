//! Top-level statement grammar: records, enums, aliases, services,
//! providers, and consumers.

use samt_core::DiagnosticError;

use crate::ast::*;
use crate::lexer::TokenKind;

use super::Parser;

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> Result<StatementNode, DiagnosticError> {
        let annotations = self.parse_annotations()?;

        match &self.current().kind {
            TokenKind::Record => Ok(StatementNode::Record(self.parse_record(annotations)?)),
            TokenKind::Enum => Ok(StatementNode::Enum(self.parse_enum(annotations)?)),
            TokenKind::Typealias => Ok(StatementNode::TypeAlias(
                self.parse_type_alias(annotations)?,
            )),
            TokenKind::Service => Ok(StatementNode::Service(self.parse_service(annotations)?)),
            TokenKind::Provide => {
                self.reject_annotations(&annotations, "provider");
                Ok(StatementNode::Provider(self.parse_provider()?))
            }
            TokenKind::Consume => {
                self.reject_annotations(&annotations, "consumer");
                Ok(StatementNode::Consumer(self.parse_consumer()?))
            }
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn reject_annotations(&mut self, annotations: &[AnnotationNode], what: &str) {
        if let Some(first) = annotations.first() {
            self.ctx
                .error(format!("{what} declarations cannot have annotations"))
                .highlight(first.location)
                .emit();
        }
    }

    fn parse_annotations(&mut self) -> Result<Vec<AnnotationNode>, DiagnosticError> {
        let mut annotations = Vec::new();
        while self.check(&TokenKind::AtSign) {
            let start = self.current().location;
            self.advance();
            let name = self.expect_identifier()?;

            let mut arguments = Vec::new();
            if self.skip(&TokenKind::OpenParen) {
                while !self.check(&TokenKind::CloseParen) {
                    arguments.push(self.parse_expression()?);
                    if !self.skip(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::CloseParen)?;
            }

            annotations.push(AnnotationNode {
                location: self.span_from(start),
                name,
                arguments,
            });
        }
        Ok(annotations)
    }

    fn parse_record(
        &mut self,
        annotations: Vec<AnnotationNode>,
    ) -> Result<RecordDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Record)?;
        let name = self.expect_identifier()?;

        let mut extends = Vec::new();
        if self.skip(&TokenKind::Extends) {
            loop {
                extends.push(self.parse_bundle_identifier()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }

        // Braces are optional for an empty body: `record Empty` is valid.
        let mut fields = Vec::new();
        if self.skip(&TokenKind::OpenBrace) {
            while !self.check(&TokenKind::CloseBrace) {
                fields.push(self.parse_record_field()?);
            }
            self.expect(&TokenKind::CloseBrace)?;
        }

        Ok(RecordDeclarationNode {
            location: self.span_from(start),
            annotations,
            name,
            extends,
            fields,
        })
    }

    fn parse_record_field(&mut self) -> Result<RecordFieldNode, DiagnosticError> {
        let annotations = self.parse_annotations()?;
        let name = self.expect_identifier()?;
        let start = name.location;
        self.expect(&TokenKind::Colon)?;
        let field_type = self.parse_expression()?;
        Ok(RecordFieldNode {
            location: self.span_from(start),
            annotations,
            name,
            field_type,
        })
    }

    fn parse_enum(
        &mut self,
        annotations: Vec<AnnotationNode>,
    ) -> Result<EnumDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::OpenBrace)?;

        // Commas between values are optional.
        let mut values = Vec::new();
        loop {
            while self.skip(&TokenKind::Comma) {}
            if self.check(&TokenKind::CloseBrace) {
                break;
            }
            values.push(self.expect_identifier()?);
        }
        self.expect(&TokenKind::CloseBrace)?;

        Ok(EnumDeclarationNode {
            location: self.span_from(start),
            annotations,
            name,
            values,
        })
    }

    fn parse_type_alias(
        &mut self,
        annotations: Vec<AnnotationNode>,
    ) -> Result<TypeAliasNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Typealias)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let alias_for = self.parse_expression()?;
        Ok(TypeAliasNode {
            location: self.span_from(start),
            annotations,
            name,
            alias_for,
        })
    }

    fn parse_service(
        &mut self,
        annotations: Vec<AnnotationNode>,
    ) -> Result<ServiceDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Service)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::OpenBrace)?;

        let mut operations = Vec::new();
        while !self.check(&TokenKind::CloseBrace) {
            operations.push(self.parse_operation()?);
        }
        self.expect(&TokenKind::CloseBrace)?;

        Ok(ServiceDeclarationNode {
            location: self.span_from(start),
            annotations,
            name,
            operations,
        })
    }

    fn parse_operation(&mut self) -> Result<OperationNode, DiagnosticError> {
        let annotations = self.parse_annotations()?;
        let start = self.current().location;

        // At most one modifier; `oneway` and `async` are mutually exclusive.
        let mut is_oneway = false;
        let mut is_async = false;
        while self.check(&TokenKind::Oneway) || self.check(&TokenKind::Async) {
            let token = self.advance();
            if is_oneway || is_async {
                self.ctx
                    .error("operations can only have a single modifier")
                    .highlight(token.location)
                    .emit();
                continue;
            }
            match token.kind {
                TokenKind::Oneway => is_oneway = true,
                TokenKind::Async => is_async = true,
                _ => unreachable!(),
            }
        }

        let name = self.expect_identifier()?;
        self.expect(&TokenKind::OpenParen)?;
        let mut parameters = Vec::new();
        while !self.check(&TokenKind::CloseParen) {
            parameters.push(self.parse_operation_parameter()?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::CloseParen)?;

        let mut return_type = None;
        if self.skip(&TokenKind::Colon) {
            return_type = Some(self.parse_expression()?);
        }

        let mut raises = Vec::new();
        if self.skip(&TokenKind::Raises) {
            loop {
                raises.push(self.parse_expression()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let location = self.span_from(start);

        if is_oneway {
            // The offending clauses stay attached so later stages see them.
            if let Some(return_type) = &return_type {
                self.ctx
                    .error("oneway operations cannot have a return type")
                    .highlight(return_type.location())
                    .emit();
            }
            if let Some(first) = raises.first() {
                self.ctx
                    .error("oneway operations cannot raise exceptions")
                    .highlight(first.location())
                    .emit();
            }
            return Ok(OperationNode::Oneway(OnewayOperationNode {
                location,
                annotations,
                name,
                parameters,
                return_type,
                raises,
            }));
        }

        Ok(OperationNode::RequestResponse(RequestResponseOperationNode {
            location,
            annotations,
            name,
            is_async,
            parameters,
            return_type,
            raises,
        }))
    }

    fn parse_operation_parameter(&mut self) -> Result<OperationParameterNode, DiagnosticError> {
        let annotations = self.parse_annotations()?;
        let name = self.expect_identifier()?;
        let start = name.location;
        self.expect(&TokenKind::Colon)?;
        let parameter_type = self.parse_expression()?;
        Ok(OperationParameterNode {
            location: self.span_from(start),
            annotations,
            name,
            parameter_type,
        })
    }

    fn parse_provider(&mut self) -> Result<ProviderDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Provide)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::OpenBrace)?;

        let mut implements = Vec::new();
        let mut transport: Option<ProviderTransportNode> = None;

        loop {
            match &self.current().kind {
                TokenKind::CloseBrace => break,
                TokenKind::Implements => {
                    let node = self.parse_implements()?;
                    implements.push(node);
                }
                TokenKind::Transport => {
                    let node = self.parse_transport()?;
                    if let Some(previous) = &transport {
                        // The first transport wins.
                        self.ctx
                            .error("too many transport declarations, only one is allowed per provider")
                            .highlight_msg("duplicate transport declaration", node.location)
                            .highlight_msg("previously declared here", previous.location)
                            .emit();
                    } else {
                        transport = Some(node);
                    }
                }
                _ => return Err(self.unexpected("'implements', 'transport', or '}'")),
            }
        }
        let close = self.expect(&TokenKind::CloseBrace)?;

        // A dummy transport keeps downstream stages free of null checks.
        let transport = transport.unwrap_or_else(|| {
            self.ctx
                .error("provider is missing a transport declaration")
                .highlight(name.location)
                .annotate_help("add 'transport http' to the provider body")
                .emit();
            ProviderTransportNode {
                location: close.location,
                protocol: IdentifierNode {
                    location: close.location,
                    name: "http".to_owned(),
                },
                configuration: None,
            }
        });

        Ok(ProviderDeclarationNode {
            location: self.span_from(start),
            name,
            implements,
            transport,
        })
    }

    fn parse_implements(&mut self) -> Result<ProviderImplementsNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Implements)?;
        let service_name = self.parse_bundle_identifier()?;
        let operation_names = self.parse_operation_name_list()?;
        Ok(ProviderImplementsNode {
            location: self.span_from(start),
            service_name,
            operation_names,
        })
    }

    fn parse_transport(&mut self) -> Result<ProviderTransportNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Transport)?;
        let protocol = self.expect_identifier()?;
        let mut configuration = None;
        if self.check(&TokenKind::OpenBrace) {
            configuration = Some(self.parse_expression()?);
        }
        Ok(ProviderTransportNode {
            location: self.span_from(start),
            protocol,
            configuration,
        })
    }

    fn parse_consumer(&mut self) -> Result<ConsumerDeclarationNode, DiagnosticError> {
        let start = self.current().location;
        self.expect(&TokenKind::Consume)?;
        let provider = self.parse_bundle_identifier()?;
        self.expect(&TokenKind::OpenBrace)?;

        let mut usages = Vec::new();
        loop {
            match &self.current().kind {
                TokenKind::CloseBrace => break,
                TokenKind::Uses => {
                    let start = self.current().location;
                    self.advance();
                    let service_name = self.parse_bundle_identifier()?;
                    let operation_names = self.parse_operation_name_list()?;
                    usages.push(ConsumerUsesNode {
                        location: self.span_from(start),
                        service_name,
                        operation_names,
                    });
                }
                _ => return Err(self.unexpected("'uses' or '}'")),
            }
        }
        self.expect(&TokenKind::CloseBrace)?;

        Ok(ConsumerDeclarationNode {
            location: self.span_from(start),
            provider,
            usages,
        })
    }

    /// Brace-enclosed operation name list shared by `implements` and `uses`.
    /// Omitting the braces means "all operations"; writing empty braces is a
    /// mistake worth pointing out.
    fn parse_operation_name_list(&mut self) -> Result<Vec<IdentifierNode>, DiagnosticError> {
        let mut names = Vec::new();
        if self.skip(&TokenKind::OpenBrace) {
            if self.check(&TokenKind::CloseBrace) {
                let location = self.current().location;
                self.ctx
                    .error("expected at least one operation name")
                    .highlight(location)
                    .emit();
            }
            while !self.check(&TokenKind::CloseBrace) {
                names.push(self.expect_identifier()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::CloseBrace)?;
        }
        Ok(names)
    }
}
