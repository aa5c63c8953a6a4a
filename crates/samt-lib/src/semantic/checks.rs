//! Structural per-file checks.
//!
//! Each pass is independent, order-insensitive, and needs no cross-file
//! context: it scans one file's tree and reports everything it finds. The
//! duplicate checks highlight the second occurrence as the primary span and
//! the first occurrence plainly, so the reader's eye lands on the line that
//! needs to change.

use samt_core::DiagnosticContext;

use crate::ast::*;

pub(super) fn check_file(file: &FileNode, ctx: &mut DiagnosticContext) {
    for statement in &file.statements {
        match statement {
            StatementNode::Record(record) => check_record(record, ctx),
            StatementNode::Enum(node) => check_enum(node, ctx),
            StatementNode::TypeAlias(alias) => {
                check_annotations(&alias.annotations, ctx);
                check_type_expression(&alias.alias_for, ctx);
            }
            StatementNode::Service(service) => check_service(service, ctx),
            StatementNode::Provider(provider) => check_provider(provider, ctx),
            StatementNode::Consumer(consumer) => check_consumer(consumer, ctx),
        }
    }
}

fn check_record(record: &RecordDeclarationNode, ctx: &mut DiagnosticContext) {
    check_annotations(&record.annotations, ctx);

    if let (Some(first), Some(last)) = (record.extends.first(), record.extends.last()) {
        ctx.error("record inheritance is not yet implemented")
            .highlight(first.location.until(last.location))
            .emit();
    }

    check_unique(
        record.fields.iter().map(|f| &f.name),
        "record field",
        ctx,
    );
    for field in &record.fields {
        check_annotations(&field.annotations, ctx);
        check_type_expression(&field.field_type, ctx);
    }
}

fn check_enum(node: &EnumDeclarationNode, ctx: &mut DiagnosticContext) {
    check_annotations(&node.annotations, ctx);
    check_unique(node.values.iter(), "enum value", ctx);
}

fn check_service(service: &ServiceDeclarationNode, ctx: &mut DiagnosticContext) {
    check_annotations(&service.annotations, ctx);
    check_unique(
        service.operations.iter().map(|op| op.name()),
        "operation",
        ctx,
    );

    for operation in &service.operations {
        let (annotations, parameters, return_type, raises) = match operation {
            OperationNode::RequestResponse(op) => {
                (&op.annotations, &op.parameters, &op.return_type, &op.raises)
            }
            OperationNode::Oneway(op) => {
                (&op.annotations, &op.parameters, &op.return_type, &op.raises)
            }
        };
        check_annotations(annotations, ctx);
        check_unique(parameters.iter().map(|p| &p.name), "parameter", ctx);
        for parameter in parameters {
            check_annotations(&parameter.annotations, ctx);
            check_type_expression(&parameter.parameter_type, ctx);
        }
        if let Some(return_type) = return_type {
            check_type_expression(return_type, ctx);
        }
        for raised in raises {
            check_type_expression(raised, ctx);
        }
    }
}

fn check_provider(provider: &ProviderDeclarationNode, ctx: &mut DiagnosticContext) {
    for implements in &provider.implements {
        check_unique(
            implements.operation_names.iter(),
            "operation",
            ctx,
        );
    }
}

fn check_consumer(consumer: &ConsumerDeclarationNode, ctx: &mut DiagnosticContext) {
    for uses in &consumer.usages {
        check_unique(uses.operation_names.iter(), "operation", ctx);
    }
}

/// Reports every name that occurs more than once, once per extra occurrence.
fn check_unique<'a>(
    names: impl Iterator<Item = &'a IdentifierNode>,
    what: &str,
    ctx: &mut DiagnosticContext,
) {
    let names: Vec<_> = names.collect();
    for (position, name) in names.iter().enumerate() {
        let Some(first) = names[..position].iter().find(|n| n.name == name.name) else {
            continue;
        };
        ctx.error(format!(
            "{what} '{}' is defined more than once",
            name.name
        ))
        .highlight(name.location)
        .highlight(first.location)
        .emit();
    }
}

fn check_annotations(annotations: &[AnnotationNode], ctx: &mut DiagnosticContext) {
    for annotation in annotations {
        for argument in &annotation.arguments {
            match argument {
                ExpressionNode::Integer(_)
                | ExpressionNode::Float(_)
                | ExpressionNode::Boolean(_)
                | ExpressionNode::String(_) => {}
                other => {
                    ctx.error("annotation arguments must be literal values")
                        .highlight(other.location())
                        .emit();
                }
            }
        }
    }
}

/// Validates the shape of an expression used in type position. Name
/// resolution and constraint legality are left to the cross-file phase; this
/// pass only rejects forms that can never denote a type.
fn check_type_expression(expression: &ExpressionNode, ctx: &mut DiagnosticContext) {
    match expression {
        ExpressionNode::Identifier(_) | ExpressionNode::BundleIdentifier(_) => {}
        ExpressionNode::Optional(optional) => {
            if matches!(optional.base.as_ref(), ExpressionNode::Optional(_)) {
                ctx.error("optional types cannot be nested")
                    .highlight(optional.location)
                    .annotate_help("remove the second '?'")
                    .emit();
            }
            check_type_expression(&optional.base, ctx);
        }
        ExpressionNode::Generic(generic) => {
            check_type_expression(&generic.base, ctx);
            for argument in &generic.arguments {
                check_type_expression(argument, ctx);
            }
        }
        ExpressionNode::Call(call) => {
            if matches!(call.base.as_ref(), ExpressionNode::Call(_)) {
                ctx.error("constraints cannot be applied to an already constrained type")
                    .highlight(call.location)
                    .emit();
            }
            check_type_expression(&call.base, ctx);
        }
        other => {
            let what = match other {
                ExpressionNode::Integer(_)
                | ExpressionNode::Float(_)
                | ExpressionNode::Boolean(_)
                | ExpressionNode::String(_) => "a literal",
                ExpressionNode::Object(_) => "an object",
                ExpressionNode::Array(_) => "an array",
                ExpressionNode::Range(_) => "a range",
                ExpressionNode::Wildcard(_) => "a wildcard",
                _ => unreachable!(),
            };
            ctx.error(format!("{what} cannot be used as a type"))
                .highlight(other.location())
                .emit();
        }
    }
}
