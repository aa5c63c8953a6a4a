use samt_core::{DiagnosticController, Severity};

use crate::ast::*;
use crate::lexer::Lexer;

use super::parse;

/// Lexes and parses one file, panicking on a fatal error.
fn parse_file(input: &str) -> (FileNode, DiagnosticController) {
    let mut controller = DiagnosticController::new();
    let ctx = controller.get_or_create_context("test.samt", input);
    let source = ctx.source();
    let tokens = Lexer::new(source.clone(), &mut *ctx)
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected fatal lexer error");
    let file = parse(source, tokens, ctx).expect("unexpected fatal parser error");
    (file, controller)
}

/// Same as [`parse_file`] but expects the parser to abort.
fn parse_fatal(input: &str) -> DiagnosticController {
    let mut controller = DiagnosticController::new();
    let ctx = controller.get_or_create_context("test.samt", input);
    let source = ctx.source();
    let tokens = Lexer::new(source.clone(), &mut *ctx)
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected fatal lexer error");
    parse(source, tokens, ctx).expect_err("expected a fatal parser error");
    controller
}

fn messages(controller: &DiagnosticController) -> Vec<(Severity, String)> {
    controller
        .contexts()
        .flat_map(|c| c.messages())
        .map(|m| (m.severity, m.message.clone()))
        .collect()
}

#[test]
fn minimal_file() {
    let (file, controller) = parse_file("package tools.samples");
    assert_eq!(file.package.name.name(), "tools.samples");
    assert!(file.imports.is_empty());
    assert!(file.statements.is_empty());
    assert!(!controller.has_messages());
}

#[test]
fn missing_package_is_fatal() {
    let controller = parse_fatal("record Foo");
    let found = messages(&controller);
    assert!(found.iter().any(|(severity, message)| {
        *severity == Severity::Error && message == "files must declare a package"
    }));
}

#[test]
fn duplicate_package_reports_and_last_wins() {
    let (file, controller) = parse_file("package a\npackage b");
    assert_eq!(file.package.name.name(), "b");

    let found = messages(&controller);
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0],
        (
            Severity::Error,
            "too many package declarations, only one is allowed per file".to_owned()
        )
    );
    let ctx = controller.contexts().next().unwrap();
    let message = &ctx.messages()[0];
    assert_eq!(message.highlights.len(), 2);
    assert_eq!(message.annotations.len(), 1);
    assert!(message.annotations[0]
        .message
        .starts_with("the package was previously declared at test.samt:1:1"));
}

#[test]
fn import_after_package_is_recoverable() {
    let (file, controller) = parse_file("package a\nimport foo.bar.Baz");
    assert_eq!(file.imports.len(), 1);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "import statements must be placed before the package declaration".to_owned()
        )]
    );
}

#[test]
fn statement_before_package_is_recoverable() {
    let (file, controller) = parse_file("record Foo\npackage a");
    assert_eq!(file.statements.len(), 1);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "statements must be placed after the package declaration".to_owned()
        )]
    );
}

#[test]
fn imports_with_alias_and_wildcard() {
    let (file, controller) = parse_file(indoc::indoc! {"
        import foo.bar.Baz as Qux
        import foo.bar.*
        package a
    "});
    assert!(!controller.has_messages());

    match &file.imports[0] {
        ImportNode::Type(node) => {
            assert_eq!(node.name.name(), "foo.bar.Baz");
            assert_eq!(node.alias.as_ref().unwrap().name, "Qux");
        }
        other => panic!("expected a type import, got {other:?}"),
    }
    match &file.imports[1] {
        ImportNode::Wildcard(node) => assert_eq!(node.name.name(), "foo.bar"),
        other => panic!("expected a wildcard import, got {other:?}"),
    }
}

#[test]
fn wildcard_import_alias_is_rejected_and_discarded() {
    let (file, controller) = parse_file("import foo.* as f\npackage a");
    assert!(matches!(&file.imports[0], ImportNode::Wildcard(_)));
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "wildcard imports cannot declare an alias".to_owned()
        )]
    );
}

#[test]
fn record_with_extends_and_fields() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a

        record Person extends Entity, audit.Tracked {
            name: String (1..50)
            age: Int?
        }
    "});
    assert!(!controller.has_messages());

    let StatementNode::Record(record) = &file.statements[0] else {
        panic!("expected a record");
    };
    assert_eq!(record.name.name, "Person");
    assert_eq!(record.extends.len(), 2);
    assert_eq!(record.extends[1].name(), "audit.Tracked");
    assert_eq!(record.fields.len(), 2);
    assert_eq!(record.fields[0].name.name, "name");
    assert!(matches!(
        record.fields[1].field_type,
        ExpressionNode::Optional(_)
    ));
}

#[test]
fn record_without_braces_is_empty() {
    let (file, controller) = parse_file("package a\nrecord Empty");
    assert!(!controller.has_messages());
    let StatementNode::Record(record) = &file.statements[0] else {
        panic!("expected a record");
    };
    assert!(record.fields.is_empty());
}

#[test]
fn enum_values_with_and_without_commas() {
    let (file, controller) = parse_file("package a\nenum Color { Red, Green\nBlue }");
    assert!(!controller.has_messages());
    let StatementNode::Enum(node) = &file.statements[0] else {
        panic!("expected an enum");
    };
    let values: Vec<_> = node.values.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(values, ["Red", "Green", "Blue"]);
}

#[test]
fn annotations_with_arguments() {
    let (file, controller) = parse_file(indoc::indoc! {r#"
        package a

        @Description("A person")
        @Deprecated
        record Person
    "#});
    assert!(!controller.has_messages());
    let StatementNode::Record(record) = &file.statements[0] else {
        panic!("expected a record");
    };
    assert_eq!(record.annotations.len(), 2);
    assert_eq!(record.annotations[0].name.name, "Description");
    assert_eq!(record.annotations[0].arguments.len(), 1);
    assert!(record.annotations[1].arguments.is_empty());
}

#[test]
fn annotation_on_provider_is_rejected() {
    let (_, controller) = parse_file(indoc::indoc! {"
        package a
        @Internal
        provide Api {
            transport http
        }
    "});
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "provider declarations cannot have annotations".to_owned()
        )]
    );
}

#[test]
fn service_operations() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a

        service PersonService {
            getAll(): List<Person>
            async search(name: String, limit: Int?): List<Person> raises NotFound, Timeout
            oneway ping()
        }
    "});
    assert!(!controller.has_messages());
    let StatementNode::Service(service) = &file.statements[0] else {
        panic!("expected a service");
    };
    assert_eq!(service.operations.len(), 3);

    let OperationNode::RequestResponse(get_all) = &service.operations[0] else {
        panic!("expected request-response");
    };
    assert!(!get_all.is_async);
    assert!(get_all.return_type.is_some());
    assert!(get_all.raises.is_empty());

    let OperationNode::RequestResponse(search) = &service.operations[1] else {
        panic!("expected request-response");
    };
    assert!(search.is_async);
    assert_eq!(search.parameters.len(), 2);
    assert_eq!(search.raises.len(), 2);

    let OperationNode::Oneway(ping) = &service.operations[2] else {
        panic!("expected oneway");
    };
    assert!(ping.return_type.is_none());
    assert!(ping.parameters.is_empty());
}

#[test]
fn oneway_with_return_type_reports_but_keeps_the_clause() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a
        service S {
            oneway ping(): Int raises Timeout
        }
    "});
    assert_eq!(
        messages(&controller),
        [
            (
                Severity::Error,
                "oneway operations cannot have a return type".to_owned()
            ),
            (
                Severity::Error,
                "oneway operations cannot raise exceptions".to_owned()
            ),
        ]
    );

    let StatementNode::Service(service) = &file.statements[0] else {
        panic!("expected a service");
    };
    let OperationNode::Oneway(ping) = &service.operations[0] else {
        panic!("expected oneway");
    };
    assert!(ping.return_type.is_some());
    assert_eq!(ping.raises.len(), 1);
}

#[test]
fn conflicting_operation_modifiers() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a
        service S {
            oneway async ping()
        }
    "});
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "operations can only have a single modifier".to_owned()
        )]
    );
    let StatementNode::Service(service) = &file.statements[0] else {
        panic!("expected a service");
    };
    // The first modifier wins.
    assert!(matches!(&service.operations[0], OperationNode::Oneway(_)));
}

#[test]
fn provider_with_implements_and_transport() {
    let (file, controller) = parse_file(indoc::indoc! {r#"
        package a

        provide PersonApi {
            implements PersonService { getAll, search }
            implements AdminService
            transport http {
                serialization: "json"
            }
        }
    "#});
    assert!(!controller.has_messages());
    let StatementNode::Provider(provider) = &file.statements[0] else {
        panic!("expected a provider");
    };
    assert_eq!(provider.implements.len(), 2);
    assert_eq!(provider.implements[0].operation_names.len(), 2);
    assert!(provider.implements[1].operation_names.is_empty());
    assert_eq!(provider.transport.protocol.name, "http");
    assert!(provider.transport.configuration.is_some());
}

#[test]
fn second_transport_is_rejected_and_first_kept() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a
        provide Api {
            transport http
            transport grpc
        }
    "});
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "too many transport declarations, only one is allowed per provider".to_owned()
        )]
    );
    let StatementNode::Provider(provider) = &file.statements[0] else {
        panic!("expected a provider");
    };
    assert_eq!(provider.transport.protocol.name, "http");
}

#[test]
fn missing_transport_fabricates_a_default() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a
        provide Api {
            implements PersonService
        }
    "});
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "provider is missing a transport declaration".to_owned()
        )]
    );
    let StatementNode::Provider(provider) = &file.statements[0] else {
        panic!("expected a provider");
    };
    assert_eq!(provider.transport.protocol.name, "http");
    assert!(provider.transport.configuration.is_none());
}

#[test]
fn empty_operation_list_is_rejected() {
    let (_, controller) = parse_file(indoc::indoc! {"
        package a
        provide Api {
            implements PersonService { }
            transport http
        }
    "});
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "expected at least one operation name".to_owned()
        )]
    );
}

#[test]
fn consumer_with_usages() {
    let (file, controller) = parse_file(indoc::indoc! {"
        package a

        consume infra.PersonApi {
            uses PersonService { getAll }
            uses AdminService
        }
    "});
    assert!(!controller.has_messages());
    let StatementNode::Consumer(consumer) = &file.statements[0] else {
        panic!("expected a consumer");
    };
    assert_eq!(consumer.provider.name(), "infra.PersonApi");
    assert_eq!(consumer.usages.len(), 2);
    assert_eq!(consumer.usages[0].operation_names[0].name, "getAll");
    assert!(consumer.usages[1].operation_names.is_empty());
}

#[test]
fn postfix_folds_left_to_right() {
    let (file, _) = parse_file("package a\ntypealias T: Foo(1)?<Int>");
    let StatementNode::TypeAlias(alias) = &file.statements[0] else {
        panic!("expected a type alias");
    };

    let ExpressionNode::Generic(generic) = &alias.alias_for else {
        panic!("outermost should be the generic specialization");
    };
    let ExpressionNode::Optional(optional) = generic.base.as_ref() else {
        panic!("next should be the optional marker");
    };
    let ExpressionNode::Call(call) = optional.base.as_ref() else {
        panic!("innermost should be the call");
    };
    assert!(matches!(call.base.as_ref(), ExpressionNode::Identifier(_)));
    assert_eq!(call.arguments.len(), 1);
    assert_eq!(generic.arguments.len(), 1);
}

#[test]
fn range_binds_loosest() {
    let (file, controller) = parse_file("package a\ntypealias T: Int (1.5..2.5, *..100)");
    assert!(!controller.has_messages());
    let StatementNode::TypeAlias(alias) = &file.statements[0] else {
        panic!("expected a type alias");
    };
    let ExpressionNode::Call(call) = &alias.alias_for else {
        panic!("expected a call");
    };
    assert_eq!(call.arguments.len(), 2);
    let ExpressionNode::Range(first) = &call.arguments[0] else {
        panic!("expected a range");
    };
    assert!(matches!(first.left.as_ref(), ExpressionNode::Float(_)));
    let ExpressionNode::Range(second) = &call.arguments[1] else {
        panic!("expected a range");
    };
    assert!(matches!(second.left.as_ref(), ExpressionNode::Wildcard(_)));
    assert!(matches!(second.right.as_ref(), ExpressionNode::Integer(_)));
}

#[test]
fn chained_range_nests_to_the_right() {
    let (file, controller) = parse_file("package a\ntypealias T: Int (1..2..3)");
    assert!(!controller.has_messages());
    let StatementNode::TypeAlias(alias) = &file.statements[0] else {
        panic!("expected a type alias");
    };
    let ExpressionNode::Call(call) = &alias.alias_for else {
        panic!("expected a call");
    };
    let ExpressionNode::Range(outer) = &call.arguments[0] else {
        panic!("expected a range");
    };
    assert!(matches!(
        outer.left.as_ref(),
        ExpressionNode::Integer(IntegerNode { value: 1, .. })
    ));
    let ExpressionNode::Range(inner) = outer.right.as_ref() else {
        panic!("expected a nested range");
    };
    assert!(matches!(
        inner.left.as_ref(),
        ExpressionNode::Integer(IntegerNode { value: 2, .. })
    ));
    assert!(matches!(
        inner.right.as_ref(),
        ExpressionNode::Integer(IntegerNode { value: 3, .. })
    ));
}

#[test]
fn empty_generic_argument_list_is_rejected() {
    let (file, controller) = parse_file("package a\ntypealias T: List<>");
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "expected at least one generic argument".to_owned()
        )]
    );
    let StatementNode::TypeAlias(alias) = &file.statements[0] else {
        panic!("expected a type alias");
    };
    let ExpressionNode::Generic(generic) = &alias.alias_for else {
        panic!("expected a generic specialization");
    };
    assert!(generic.arguments.is_empty());
}

#[test]
fn object_and_array_literals() {
    let (file, controller) = parse_file(indoc::indoc! {r#"
        package a
        provide Api {
            transport http {
                operations: {
                    getAll: { method: "GET", path: "/persons" }
                },
                codes: [200, 404]
            }
        }
    "#});
    assert!(!controller.has_messages());
    let StatementNode::Provider(provider) = &file.statements[0] else {
        panic!("expected a provider");
    };
    let Some(ExpressionNode::Object(config)) = &provider.transport.configuration else {
        panic!("expected an object configuration");
    };
    assert_eq!(config.fields.len(), 2);
    assert!(matches!(config.fields[1].value, ExpressionNode::Array(_)));
}
