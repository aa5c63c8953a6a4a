//! The resolved, cross-file-aware package and type graph.
//!
//! Declarations live in one flat arena addressed by [`TypeId`]; the package
//! tree and the qualified-name index only hold handles into it. Built once
//! per run, immutable afterwards; generators read it through the accessors
//! and must gate on `DiagnosticController::has_errors` before trusting it.

use indexmap::IndexMap;

use samt_core::Location;

use crate::ast::ExpressionNode;

/// Stable handle to one entry in the declaration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct SemanticModel {
    pub(crate) packages: IndexMap<String, Package>,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) index: IndexMap<String, TypeId>,
}

impl SemanticModel {
    pub fn declaration(&self, id: TypeId) -> &Declaration {
        &self.declarations[id.index()]
    }

    /// Looks a declaration up by its fully qualified dotted name.
    pub fn lookup(&self, qualified_name: &str) -> Option<TypeId> {
        self.index.get(qualified_name).copied()
    }

    pub fn package(&self, qualified_name: &str) -> Option<&Package> {
        self.packages.get(qualified_name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Human-readable name of a type, used in diagnostics and by generators.
    pub fn display_name(&self, ty: &Type) -> String {
        display_name(&self.declarations, ty)
    }
}

/// [`SemanticModel::display_name`], usable while the arena is still being
/// built.
pub(crate) fn display_name(declarations: &[Declaration], ty: &Type) -> String {
    match ty {
        Type::Int => "Int".to_owned(),
        Type::Long => "Long".to_owned(),
        Type::Float => "Float".to_owned(),
        Type::Double => "Double".to_owned(),
        Type::Decimal => "Decimal".to_owned(),
        Type::Boolean => "Boolean".to_owned(),
        Type::String => "String".to_owned(),
        Type::Bytes => "Bytes".to_owned(),
        Type::Date => "Date".to_owned(),
        Type::DateTime => "DateTime".to_owned(),
        Type::Duration => "Duration".to_owned(),
        Type::List(element) => format!("List<{}>", display_name(declarations, &element.ty)),
        Type::Map(key, value) => format!(
            "Map<{}, {}>",
            display_name(declarations, &key.ty),
            display_name(declarations, &value.ty)
        ),
        Type::User(id) => declarations[id.index()].name().to_owned(),
        Type::Unknown => "<unknown>".to_owned(),
    }
}

/// One node of the package tree. Parents are created implicitly for every
/// prefix of a declared dotted package name.
#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub qualified_name: String,
    /// Qualified names of direct child packages.
    pub children: Vec<String>,
    /// Named declarations, keyed by simple name.
    pub types: IndexMap<String, TypeId>,
    /// Consumers are anonymous and therefore not part of `types`.
    pub consumers: Vec<TypeId>,
}

impl Package {
    pub(crate) fn new(name: String, qualified_name: String) -> Self {
        Self {
            name,
            qualified_name,
            children: Vec::new(),
            types: IndexMap::new(),
            consumers: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum Declaration {
    Record(RecordType),
    Enum(EnumType),
    Service(ServiceType),
    Alias(AliasType),
    Provider(ProviderType),
    Consumer(ConsumerType),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Record(decl) => &decl.name,
            Declaration::Enum(decl) => &decl.name,
            Declaration::Service(decl) => &decl.name,
            Declaration::Alias(decl) => &decl.name,
            Declaration::Provider(decl) => &decl.name,
            Declaration::Consumer(_) => "<consumer>",
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Declaration::Record(decl) => decl.location,
            Declaration::Enum(decl) => decl.location,
            Declaration::Service(decl) => decl.location,
            Declaration::Alias(decl) => decl.location,
            Declaration::Provider(decl) => decl.location,
            Declaration::Consumer(decl) => decl.location,
        }
    }

    /// What to call this declaration kind in a message.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Declaration::Record(_) => "record",
            Declaration::Enum(_) => "enum",
            Declaration::Service(_) => "service",
            Declaration::Alias(_) => "type alias",
            Declaration::Provider(_) => "provider",
            Declaration::Consumer(_) => "consumer",
        }
    }
}

#[derive(Debug)]
pub struct RecordType {
    pub name: String,
    pub qualified_name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<Field>,
}

#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub ty: TypeReference,
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub qualified_name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub struct ServiceType {
    pub name: String,
    pub qualified_name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub operations: Vec<Operation>,
}

impl ServiceType {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

#[derive(Debug)]
pub struct Operation {
    pub name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub kind: OperationKind,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeReference>,
    pub raises: Vec<TypeReference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Ordinary blocking request/response.
    Synchronous,
    /// Request/response whose result arrives asynchronously.
    Asynchronous,
    /// Fire-and-forget; never has a return type or raises clause.
    Oneway,
}

#[derive(Debug)]
pub struct Parameter {
    pub name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    pub ty: TypeReference,
}

#[derive(Debug)]
pub struct AliasType {
    pub name: String,
    pub qualified_name: String,
    pub location: Location,
    pub annotations: Vec<Annotation>,
    /// The aliased reference; its runtime fields hold the fully collapsed
    /// view once alias resolution has run.
    pub aliased: TypeReference,
}

#[derive(Debug)]
pub struct ProviderType {
    pub name: String,
    pub qualified_name: String,
    pub location: Location,
    pub implements: Vec<ImplementedService>,
    pub transport: Transport,
}

impl ProviderType {
    pub fn implemented(&self, service: TypeId) -> Option<&ImplementedService> {
        self.implements.iter().find(|i| i.service == service)
    }
}

/// One `implements` clause, with the operation list already expanded: an
/// omitted list means every operation of the service.
#[derive(Debug)]
pub struct ImplementedService {
    pub location: Location,
    pub service: TypeId,
    pub operations: Vec<String>,
}

#[derive(Debug)]
pub struct Transport {
    pub location: Location,
    pub protocol: String,
    /// Raw configuration body; transport-specific generators parse it and
    /// report their own diagnostics.
    pub configuration: Option<ExpressionNode>,
}

#[derive(Debug)]
pub struct ConsumerType {
    pub location: Location,
    /// Unresolvable provider references are reported and left empty.
    pub provider: Option<TypeId>,
    pub uses: Vec<UsedService>,
}

/// One `uses` clause, operation list expanded the same way as
/// [`ImplementedService`]: an omitted list means every operation the
/// provider implements.
#[derive(Debug)]
pub struct UsedService {
    pub location: Location,
    pub service: TypeId,
    pub operations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub location: Location,
    pub name: String,
    pub arguments: Vec<AnnotationValue>,
}

/// Annotation arguments are restricted to scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    String,
    Bytes,
    Date,
    DateTime,
    Duration,
    List(Box<TypeReference>),
    Map(Box<TypeReference>, Box<TypeReference>),
    User(TypeId),
    /// Placeholder after a reported resolution failure.
    Unknown,
}

impl Type {
    /// The fixed built-in type for a simple name, if any.
    pub fn builtin(name: &str) -> Option<Type> {
        Some(match name {
            "Int" => Type::Int,
            "Long" => Type::Long,
            "Float" => Type::Float,
            "Double" => Type::Double,
            "Decimal" => Type::Decimal,
            "Boolean" => Type::Boolean,
            "String" => Type::String,
            "Bytes" => Type::Bytes,
            "Date" => Type::Date,
            "DateTime" => Type::DateTime,
            "Duration" => Type::Duration,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Long | Type::Float | Type::Double | Type::Decimal
        )
    }

    /// Types whose values have a length the size constraint can bound.
    pub fn is_sized(&self) -> bool {
        matches!(
            self,
            Type::String | Type::Bytes | Type::List(_) | Type::Map(_, _)
        )
    }
}

/// A use of a type: the resolved type itself, optionality, constraints, and
/// the runtime view with alias chains collapsed. For a reference that does
/// not go through an alias the two views are identical.
#[derive(Debug, Clone)]
pub struct TypeReference {
    pub location: Location,
    pub ty: Type,
    pub is_optional: bool,
    pub constraints: Vec<Constraint>,
    pub runtime_ty: Type,
    pub runtime_optional: bool,
    pub runtime_constraints: Vec<Constraint>,
}

impl TypeReference {
    /// A reference where the surface and runtime views coincide.
    pub(crate) fn direct(
        location: Location,
        ty: Type,
        is_optional: bool,
        constraints: Vec<Constraint>,
    ) -> Self {
        Self {
            location,
            runtime_ty: ty.clone(),
            runtime_optional: is_optional,
            runtime_constraints: constraints.clone(),
            ty,
            is_optional,
            constraints,
        }
    }

    pub(crate) fn unknown(location: Location) -> Self {
        Self::direct(location, Type::Unknown, false, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Bounds on a numeric value; at least one side is present.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    /// Bounds on the length of a string, bytes, list, or map.
    Size {
        lower: Option<i64>,
        upper: Option<i64>,
    },
    /// Regular expression a string value must match.
    Pattern(String),
    /// Exact literal a value must equal.
    Value(AnnotationValue),
}

impl Constraint {
    /// What to call this constraint in a message.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::Range { .. } => "range",
            Constraint::Size { .. } => "size",
            Constraint::Pattern(_) => "pattern",
            Constraint::Value(_) => "value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Integer(i64),
    Float(f64),
}

impl Bound {
    pub fn as_f64(self) -> f64 {
        match self {
            Bound::Integer(value) => value as f64,
            Bound::Float(value) => value,
        }
    }
}
