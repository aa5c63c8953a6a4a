//! The owned abstract syntax tree produced by the parser.
//!
//! Children are exclusively owned by their parents; there are no
//! back-pointers. Every node carries the [`Location`] of the source window it
//! was parsed from. Built once per file, immutable afterwards.

use samt_core::{Location, SourceId};

/// Root node for one parsed source file.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub location: Location,
    pub imports: Vec<ImportNode>,
    /// When multiple package declarations occur (a recoverable error), the
    /// last one wins.
    pub package: PackageDeclarationNode,
    pub statements: Vec<StatementNode>,
}

impl FileNode {
    pub fn source(&self) -> SourceId {
        self.location.source
    }
}

#[derive(Debug, Clone)]
pub enum ImportNode {
    Type(TypeImportNode),
    Wildcard(WildcardImportNode),
}

impl ImportNode {
    pub fn location(&self) -> Location {
        match self {
            ImportNode::Type(node) => node.location,
            ImportNode::Wildcard(node) => node.location,
        }
    }

    pub fn name(&self) -> &BundleIdentifierNode {
        match self {
            ImportNode::Type(node) => &node.name,
            ImportNode::Wildcard(node) => &node.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeImportNode {
    pub location: Location,
    pub name: BundleIdentifierNode,
    pub alias: Option<IdentifierNode>,
}

#[derive(Debug, Clone)]
pub struct WildcardImportNode {
    pub location: Location,
    pub name: BundleIdentifierNode,
}

#[derive(Debug, Clone)]
pub struct PackageDeclarationNode {
    pub location: Location,
    pub name: BundleIdentifierNode,
}

#[derive(Debug, Clone)]
pub enum StatementNode {
    Record(RecordDeclarationNode),
    Enum(EnumDeclarationNode),
    TypeAlias(TypeAliasNode),
    Service(ServiceDeclarationNode),
    Provider(ProviderDeclarationNode),
    Consumer(ConsumerDeclarationNode),
}

impl StatementNode {
    pub fn location(&self) -> Location {
        match self {
            StatementNode::Record(node) => node.location,
            StatementNode::Enum(node) => node.location,
            StatementNode::TypeAlias(node) => node.location,
            StatementNode::Service(node) => node.location,
            StatementNode::Provider(node) => node.location,
            StatementNode::Consumer(node) => node.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordDeclarationNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub extends: Vec<BundleIdentifierNode>,
    pub fields: Vec<RecordFieldNode>,
}

#[derive(Debug, Clone)]
pub struct RecordFieldNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub field_type: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct EnumDeclarationNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub values: Vec<IdentifierNode>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub alias_for: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct ServiceDeclarationNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub operations: Vec<OperationNode>,
}

#[derive(Debug, Clone)]
pub enum OperationNode {
    RequestResponse(RequestResponseOperationNode),
    Oneway(OnewayOperationNode),
}

impl OperationNode {
    pub fn location(&self) -> Location {
        match self {
            OperationNode::RequestResponse(node) => node.location,
            OperationNode::Oneway(node) => node.location,
        }
    }

    pub fn name(&self) -> &IdentifierNode {
        match self {
            OperationNode::RequestResponse(node) => &node.name,
            OperationNode::Oneway(node) => &node.name,
        }
    }

    pub fn parameters(&self) -> &[OperationParameterNode] {
        match self {
            OperationNode::RequestResponse(node) => &node.parameters,
            OperationNode::Oneway(node) => &node.parameters,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestResponseOperationNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub is_async: bool,
    pub parameters: Vec<OperationParameterNode>,
    pub return_type: Option<ExpressionNode>,
    pub raises: Vec<ExpressionNode>,
}

/// Fire-and-forget operation. The parser rejects return types and raises
/// clauses on oneway operations but still attaches them so later stages can
/// see what was written.
#[derive(Debug, Clone)]
pub struct OnewayOperationNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub parameters: Vec<OperationParameterNode>,
    pub return_type: Option<ExpressionNode>,
    pub raises: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct OperationParameterNode {
    pub location: Location,
    pub annotations: Vec<AnnotationNode>,
    pub name: IdentifierNode,
    pub parameter_type: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct ProviderDeclarationNode {
    pub location: Location,
    pub name: IdentifierNode,
    pub implements: Vec<ProviderImplementsNode>,
    pub transport: ProviderTransportNode,
}

/// An empty operation list means "implements every operation".
#[derive(Debug, Clone)]
pub struct ProviderImplementsNode {
    pub location: Location,
    pub service_name: BundleIdentifierNode,
    pub operation_names: Vec<IdentifierNode>,
}

#[derive(Debug, Clone)]
pub struct ProviderTransportNode {
    pub location: Location,
    pub protocol: IdentifierNode,
    pub configuration: Option<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct ConsumerDeclarationNode {
    pub location: Location,
    pub provider: BundleIdentifierNode,
    pub usages: Vec<ConsumerUsesNode>,
}

/// An empty operation list means "uses every implemented operation".
#[derive(Debug, Clone)]
pub struct ConsumerUsesNode {
    pub location: Location,
    pub service_name: BundleIdentifierNode,
    pub operation_names: Vec<IdentifierNode>,
}

#[derive(Debug, Clone)]
pub struct AnnotationNode {
    pub location: Location,
    pub name: IdentifierNode,
    pub arguments: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Call(CallExpressionNode),
    Generic(GenericSpecializationNode),
    Optional(OptionalDeclarationNode),
    Range(RangeExpressionNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Wildcard(WildcardNode),
    Identifier(IdentifierNode),
    BundleIdentifier(BundleIdentifierNode),
    Integer(IntegerNode),
    Float(FloatNode),
    Boolean(BooleanNode),
    String(StringNode),
}

impl ExpressionNode {
    pub fn location(&self) -> Location {
        match self {
            ExpressionNode::Call(node) => node.location,
            ExpressionNode::Generic(node) => node.location,
            ExpressionNode::Optional(node) => node.location,
            ExpressionNode::Range(node) => node.location,
            ExpressionNode::Object(node) => node.location,
            ExpressionNode::Array(node) => node.location,
            ExpressionNode::Wildcard(node) => node.location,
            ExpressionNode::Identifier(node) => node.location,
            ExpressionNode::BundleIdentifier(node) => node.location,
            ExpressionNode::Integer(node) => node.location,
            ExpressionNode::Float(node) => node.location,
            ExpressionNode::Boolean(node) => node.location,
            ExpressionNode::String(node) => node.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallExpressionNode {
    pub location: Location,
    pub base: Box<ExpressionNode>,
    pub arguments: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct GenericSpecializationNode {
    pub location: Location,
    pub base: Box<ExpressionNode>,
    pub arguments: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct OptionalDeclarationNode {
    pub location: Location,
    pub base: Box<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct RangeExpressionNode {
    pub location: Location,
    pub left: Box<ExpressionNode>,
    pub right: Box<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub location: Location,
    pub fields: Vec<ObjectFieldNode>,
}

#[derive(Debug, Clone)]
pub struct ObjectFieldNode {
    pub location: Location,
    pub name: IdentifierNode,
    pub value: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub location: Location,
    pub values: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct WildcardNode {
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct IdentifierNode {
    pub location: Location,
    pub name: String,
}

/// A dotted name path such as `foo.bar.Baz`.
#[derive(Debug, Clone)]
pub struct BundleIdentifierNode {
    pub location: Location,
    pub components: Vec<IdentifierNode>,
}

impl BundleIdentifierNode {
    /// The dotted textual form.
    pub fn name(&self) -> String {
        self.components
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn last(&self) -> &IdentifierNode {
        self.components.last().expect("bundle identifier is never empty")
    }
}

#[derive(Debug, Clone)]
pub struct IntegerNode {
    pub location: Location,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct FloatNode {
    pub location: Location,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct BooleanNode {
    pub location: Location,
    pub value: bool,
}

#[derive(Debug, Clone)]
pub struct StringNode {
    pub location: Location,
    pub value: String,
}
