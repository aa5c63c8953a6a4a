use samt_core::{DiagnosticController, Severity};

use crate::{compile, LinterConfig};

use super::{
    Bound, Constraint, Declaration, Level, OperationKind, SemanticModel, Type,
};

fn build(sources: &[(&str, &str)]) -> (SemanticModel, DiagnosticController) {
    build_with(sources, &LinterConfig::default())
}

fn build_with(
    sources: &[(&str, &str)],
    config: &LinterConfig,
) -> (SemanticModel, DiagnosticController) {
    let mut controller = DiagnosticController::new();
    let sources: Vec<(String, String)> = sources
        .iter()
        .map(|(path, content)| ((*path).to_owned(), (*content).to_owned()))
        .collect();
    let model = compile(sources, config, &mut controller);
    (model, controller)
}

fn messages(controller: &DiagnosticController) -> Vec<(Severity, String)> {
    controller
        .contexts()
        .flat_map(|c| c.messages())
        .map(|m| (m.severity, m.message.clone()))
        .collect()
}

fn record<'a>(model: &'a SemanticModel, qualified: &str) -> &'a super::RecordType {
    let id = model.lookup(qualified).expect("type not found");
    match model.declaration(id) {
        Declaration::Record(decl) => decl,
        other => panic!("expected a record, got {}", other.kind_name()),
    }
}

#[test]
fn builtin_types_and_containers() {
    let (model, controller) = build(&[(
        "person.samt",
        indoc::indoc! {"
            package demo

            record Person {
                name: String
                nickname: String?
                scores: List<Int (1..100)>
                attributes: Map<String, String>
            }
        "},
    )]);
    assert!(!controller.has_messages(), "{:?}", messages(&controller));

    let person = record(&model, "demo.Person");
    assert_eq!(person.fields.len(), 4);
    assert!(matches!(person.fields[0].ty.ty, Type::String));
    assert!(!person.fields[0].ty.is_optional);
    assert!(person.fields[1].ty.is_optional);

    let Type::List(element) = &person.fields[2].ty.ty else {
        panic!("expected a list");
    };
    assert!(matches!(element.ty, Type::Int));
    assert_eq!(
        element.constraints,
        [Constraint::Range {
            lower: Some(Bound::Integer(1)),
            upper: Some(Bound::Integer(100)),
        }]
    );
    assert!(matches!(person.fields[3].ty.ty, Type::Map(_, _)));
}

#[test]
fn duplicate_record_field_highlights_second_occurrence_first() {
    let (_, controller) = build(&[(
        "color.samt",
        indoc::indoc! {"
            package demo

            record Color {
                red: Int
                red: Int
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "record field 'red' is defined more than once".to_owned()
        )]
    );

    let ctx = controller.contexts().next().unwrap();
    let message = &ctx.messages()[0];
    assert_eq!(message.highlights.len(), 2);
    assert!(message.highlights.iter().all(|h| h.message.is_none()));
    // Primary highlight points at the second occurrence.
    assert!(
        message.highlights[0].location.start.char_index
            > message.highlights[1].location.start.char_index
    );
}

#[test]
fn pattern_constraint_is_illegal_on_int() {
    let (_, controller) = build(&[(
        "pattern.samt",
        "package demo\nrecord R { f: Int (pattern(\"a-z\")) }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "constraint 'pattern' cannot be applied to type 'Int'".to_owned()
        )]
    );
}

#[test]
fn multi_argument_pattern_is_rejected() {
    let (_, controller) = build(&[(
        "pattern.samt",
        "package demo\nrecord R { f: String (pattern(\"a\", \"-\", \"z\")) }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "pattern expects a single string argument".to_owned()
        )]
    );
}

#[test]
fn invalid_regex_pattern_is_reported() {
    let (_, controller) = build(&[(
        "pattern.samt",
        "package demo\nrecord R { f: String (pattern(\"[a-\")) }",
    )]);
    assert_eq!(controller.error_count(), 1);
    let found = messages(&controller);
    assert!(found[0].1.starts_with("invalid pattern:"));
}

#[test]
fn size_constraint_on_string_and_its_illegal_twin_on_int() {
    let (model, controller) = build(&[(
        "size.samt",
        indoc::indoc! {"
            package demo

            record R {
                name: String (size(1..50))
                count: Int (size(1..50))
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "constraint 'size' cannot be applied to type 'Int'".to_owned()
        )]
    );

    let decl = record(&model, "demo.R");
    assert_eq!(
        decl.fields[0].ty.constraints,
        [Constraint::Size {
            lower: Some(1),
            upper: Some(50),
        }]
    );
    assert!(decl.fields[1].ty.constraints.is_empty());
}

#[test]
fn fully_unbounded_range_is_rejected() {
    let (_, controller) = build(&[(
        "range.samt",
        "package demo\nrecord R { f: Int (*..*) }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "a range constraint must have at least one bound".to_owned()
        )]
    );
}

#[test]
fn chained_range_is_rejected_as_a_bound() {
    let (_, controller) = build(&[(
        "range.samt",
        "package demo\nrecord R { f: Int (1..2..3) }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "range bounds must be numbers or '*'".to_owned()
        )]
    );
}

#[test]
fn misordered_range_bounds_are_rejected() {
    let (_, controller) = build(&[(
        "range.samt",
        "package demo\nrecord R { f: Int (100..1) }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "the lower bound of a range must not exceed the upper bound".to_owned()
        )]
    );
}

#[test]
fn duplicate_import_is_reported_once_in_the_importing_file() {
    let (_, controller) = build(&[
        ("foo.samt", "package foo\nrecord A"),
        (
            "bar.samt",
            "import foo.A\nimport foo.A\npackage bar\nrecord B",
        ),
    ]);

    let mut contexts = controller.contexts();
    let foo = contexts.next().unwrap();
    let bar = contexts.next().unwrap();
    assert!(!foo.has_messages());
    assert_eq!(bar.error_count(), 1);
    assert_eq!(
        bar.messages()[0].message,
        "import 'A' is already imported"
    );
}

#[test]
fn import_alias_and_wildcard_resolution() {
    let (model, controller) = build(&[
        ("foo.samt", "package foo\nrecord A\nrecord B"),
        (
            "bar.samt",
            indoc::indoc! {"
                import foo.A as Renamed
                import foo.*
                package bar

                record Holder {
                    one: Renamed
                    two: B
                }
            "},
        ),
    ]);
    assert!(!controller.has_messages(), "{:?}", messages(&controller));

    let holder = record(&model, "bar.Holder");
    let a = model.lookup("foo.A").unwrap();
    let b = model.lookup("foo.B").unwrap();
    assert!(matches!(holder.fields[0].ty.ty, Type::User(id) if id == a));
    assert!(matches!(holder.fields[1].ty.ty, Type::User(id) if id == b));
}

#[test]
fn alias_chains_collapse_to_runtime_views() {
    let (model, controller) = build(&[(
        "alias.samt",
        indoc::indoc! {"
            package demo

            typealias Name: String?
            typealias Label: Name

            record Person {
                label: Label
            }
        "},
    )]);
    assert!(!controller.has_messages(), "{:?}", messages(&controller));

    let person = record(&model, "demo.Person");
    let label = &person.fields[0].ty;
    assert!(matches!(label.ty, Type::User(_)));
    assert!(!label.is_optional);
    // The runtime view sees through both aliases.
    assert!(matches!(label.runtime_ty, Type::String));
    assert!(label.runtime_optional);
}

#[test]
fn redundant_optionality_through_an_alias_warns() {
    let (_, controller) = build(&[(
        "alias.samt",
        indoc::indoc! {"
            package demo
            typealias Name: String?
            record Person { name: Name? }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Warning,
            "optionality is redundant, 'Name' is already optional".to_owned()
        )]
    );
}

#[test]
fn nested_optional_is_rejected() {
    let (_, controller) = build(&[(
        "optional.samt",
        "package demo\nrecord R { f: Int?? }",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "optional types cannot be nested".to_owned()
        )]
    );
}

#[test]
fn alias_cycle_reports_every_participant() {
    let (model, controller) = build(&[(
        "cycle.samt",
        indoc::indoc! {"
            package demo
            typealias A: B
            typealias B: A
        "},
    )]);
    let found = messages(&controller);
    assert_eq!(
        found,
        [
            (
                Severity::Error,
                "type alias 'A' is part of a reference cycle".to_owned()
            ),
            (
                Severity::Error,
                "type alias 'B' is part of a reference cycle".to_owned()
            ),
        ]
    );

    let a = model.lookup("demo.A").unwrap();
    let Declaration::Alias(alias) = model.declaration(a) else {
        panic!("expected an alias");
    };
    assert!(matches!(alias.aliased.runtime_ty, Type::Unknown));
}

#[test]
fn unsupported_generic_types() {
    let (_, controller) = build(&[(
        "generic.samt",
        indoc::indoc! {"
            package demo
            record R {
                a: Set<Int>
                b: List<Int, Int>
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [
            (
                Severity::Error,
                "unsupported generic type 'Set'".to_owned()
            ),
            (
                Severity::Error,
                "unsupported generic type 'List'".to_owned()
            ),
        ]
    );
}

#[test]
fn record_inheritance_is_gated() {
    let (_, controller) = build(&[(
        "extends.samt",
        "package demo\nrecord Person extends Entity",
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "record inheritance is not yet implemented".to_owned()
        )]
    );
}

#[test]
fn service_cannot_be_used_as_a_type() {
    let (_, controller) = build(&[(
        "service.samt",
        indoc::indoc! {"
            package demo
            service Greeter { greet(name: String): String }
            record R { g: Greeter }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "service 'Greeter' cannot be used as a type".to_owned()
        )]
    );
}

#[test]
fn shadowing_a_builtin_type_warns() {
    let (_, controller) = build(&[("shadow.samt", "package demo\nrecord String")]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Warning,
            "type 'String' shadows a built-in type".to_owned()
        )]
    );
}

#[test]
fn duplicate_declaration_across_files_cites_the_other_file() {
    let (_, controller) = build(&[
        ("one.samt", "package demo\nrecord Person"),
        ("two.samt", "package demo\nrecord Person"),
    ]);

    let mut contexts = controller.contexts();
    let one = contexts.next().unwrap();
    let two = contexts.next().unwrap();
    assert!(!one.has_messages());
    assert_eq!(two.error_count(), 1);
    let message = &two.messages()[0];
    assert_eq!(message.message, "type 'Person' is already declared");
    assert!(message.annotations[0]
        .message
        .starts_with("previously declared at one.samt:"));
}

#[test]
fn provider_and_consumer_cross_links() {
    let (model, controller) = build(&[(
        "api.samt",
        indoc::indoc! {"
            package demo

            record Person { name: String }

            service PersonService {
                getAll(): List<Person>
                async search(name: String): List<Person>
                oneway ping()
            }

            provide PersonApi {
                implements PersonService { getAll, search }
                transport http
            }

            consume PersonApi {
                uses PersonService { getAll }
            }
        "},
    )]);
    assert!(!controller.has_messages(), "{:?}", messages(&controller));

    let service_id = model.lookup("demo.PersonService").unwrap();
    let Declaration::Service(service) = model.declaration(service_id) else {
        panic!("expected a service");
    };
    assert_eq!(service.operations.len(), 3);
    assert_eq!(
        service.operations[1].kind,
        OperationKind::Asynchronous
    );
    assert_eq!(service.operations[2].kind, OperationKind::Oneway);

    let provider_id = model.lookup("demo.PersonApi").unwrap();
    let Declaration::Provider(provider) = model.declaration(provider_id) else {
        panic!("expected a provider");
    };
    assert_eq!(provider.transport.protocol, "http");
    assert_eq!(provider.implements[0].operations, ["getAll", "search"]);

    let package = model.package("demo").unwrap();
    assert_eq!(package.consumers.len(), 1);
    let Declaration::Consumer(consumer) = model.declaration(package.consumers[0]) else {
        panic!("expected a consumer");
    };
    assert_eq!(consumer.provider, Some(provider_id));
    assert_eq!(consumer.uses[0].operations, ["getAll"]);
}

#[test]
fn implements_all_expands_to_every_operation() {
    let (model, controller) = build(&[(
        "api.samt",
        indoc::indoc! {"
            package demo
            service S { a() b() }
            provide Api {
                implements S
                transport http
            }
            consume Api { uses S }
        "},
    )]);
    assert!(!controller.has_errors(), "{:?}", messages(&controller));

    let provider_id = model.lookup("demo.Api").unwrap();
    let Declaration::Provider(provider) = model.declaration(provider_id) else {
        panic!("expected a provider");
    };
    assert_eq!(provider.implements[0].operations, ["a", "b"]);

    let package = model.package("demo").unwrap();
    let Declaration::Consumer(consumer) = model.declaration(package.consumers[0]) else {
        panic!("expected a consumer");
    };
    assert_eq!(consumer.uses[0].operations, ["a", "b"]);
}

#[test]
fn consumer_cannot_use_unimplemented_operations() {
    let (_, controller) = build(&[(
        "api.samt",
        indoc::indoc! {"
            package demo
            service S { a() b() }
            provide Api {
                implements S { a }
                transport http
            }
            consume Api {
                uses S { a, b, c }
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [
            (
                Severity::Error,
                "operation 'b' is not implemented by provider 'Api'".to_owned()
            ),
            (
                Severity::Error,
                "operation 'c' not found in service 'S'".to_owned()
            ),
        ]
    );
}

#[test]
fn consumer_cannot_use_unimplemented_services() {
    let (_, controller) = build(&[(
        "api.samt",
        indoc::indoc! {"
            package demo
            service S { a() }
            service T { b() }
            provide Api {
                implements S
                transport http
            }
            consume Api {
                uses T
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "service 'T' is not implemented by provider 'Api'".to_owned()
        )]
    );
}

#[test]
fn implementing_an_unknown_operation_is_reported() {
    let (_, controller) = build(&[(
        "api.samt",
        indoc::indoc! {"
            package demo
            service S { a() }
            provide Api {
                implements S { a, missing }
                transport http
            }
        "},
    )]);
    assert_eq!(
        messages(&controller),
        [(
            Severity::Error,
            "operation 'missing' not found in service 'S'".to_owned()
        )]
    );
}

#[test]
fn naming_lint_reports_at_the_configured_level() {
    let sources = [(
        "naming.samt",
        "package demo\nrecord person { FirstName: String }",
    )];

    let (_, controller) = build(&sources);
    assert_eq!(
        messages(&controller),
        [
            (
                Severity::Warning,
                "record name 'person' should be PascalCase".to_owned()
            ),
            (
                Severity::Warning,
                "field name 'FirstName' should be camelCase".to_owned()
            ),
        ]
    );

    let mut config = LinterConfig::default();
    config.level = Level::Off;
    let (_, controller) = build_with(&sources, &config);
    assert!(!controller.has_messages());
}

#[test]
fn message_sequence_is_stable() {
    let (_, controller) = build(&[(
        "sample.samt",
        indoc::indoc! {r#"
            package demo

            record person {
                name: String
                name: String
                age: Int (pattern("x"))
            }
        "#},
    )]);
    let rendered: String = controller
        .contexts()
        .flat_map(|c| c.messages())
        .map(|m| format!("{}: {}\n", m.severity, m.message))
        .collect();
    insta::assert_snapshot!(rendered, @r"
    error: record field 'name' is defined more than once
    warning: record name 'person' should be PascalCase
    error: constraint 'pattern' cannot be applied to type 'Int'
    ");
}

#[test]
fn building_twice_is_deterministic() {
    let sources = [(
        "api.samt",
        indoc::indoc! {"
            package demo
            typealias Name: String?
            record Person {
                name: Name
                name: Name
            }
            service S { a(p: Missing) }
        "},
    )];
    let (_, controller_a) = build(&sources);
    let (_, controller_b) = build(&sources);
    assert_eq!(messages(&controller_a), messages(&controller_b));
    assert!(controller_a.has_errors());
}
