//! Cross-file resolution.
//!
//! Works in ordered passes over the full set of parsed files:
//!
//! 1. register every named declaration in the package tree and the global
//!    qualified-name index
//! 2. build a per-file scope from the file's package plus its imports
//! 3. resolve type alias targets (surface view only)
//! 4. collapse alias chains into runtime views, with a cycle guard
//! 5. resolve record, enum, and service bodies
//! 6. resolve providers against their services
//! 7. resolve consumers against their providers
//!
//! Passes never mutate the AST; they build the arena and index and resolve
//! references against them. Every violation is reported and resolution keeps
//! going, so one run surfaces as many problems as possible.

use indexmap::IndexMap;

use samt_core::{DiagnosticController, Location};

use crate::ast::*;

use super::model::{
    display_name, AliasType, Annotation, AnnotationValue, Bound, Constraint, ConsumerType,
    Declaration, EnumType, Field, ImplementedService, Operation, OperationKind, Package,
    Parameter, ProviderType, RecordType, SemanticModel, ServiceType, Transport, Type, TypeId,
    TypeReference, UsedService,
};

/// Names visible to one file: its package's members plus its imports.
type Scope = IndexMap<String, TypeId>;

#[derive(Clone, Copy, PartialEq)]
enum AliasState {
    Unresolved,
    Resolving,
    Resolved,
}

pub(super) struct Resolver<'a> {
    controller: &'a mut DiagnosticController,
    files: &'a [FileNode],
    declarations: Vec<Declaration>,
    index: IndexMap<String, TypeId>,
    packages: IndexMap<String, Package>,
    /// Per-file scope, parallel to `files`.
    scopes: Vec<Scope>,
    /// Per-file package qualified name, parallel to `files`.
    file_packages: Vec<String>,
    /// Arena handle per statement, parallel to `files`' statement lists.
    /// `None` marks a duplicate declaration that was reported and skipped.
    ids: Vec<Vec<Option<TypeId>>>,
}

impl<'a> Resolver<'a> {
    pub(super) fn new(files: &'a [FileNode], controller: &'a mut DiagnosticController) -> Self {
        Self {
            controller,
            files,
            declarations: Vec::new(),
            index: IndexMap::new(),
            packages: IndexMap::new(),
            scopes: Vec::new(),
            file_packages: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub(super) fn resolve(mut self) -> SemanticModel {
        let files = self.files;
        for (file_index, file) in files.iter().enumerate() {
            self.register_file(file_index, file);
        }
        for (file_index, file) in files.iter().enumerate() {
            let scope = self.build_scope(file_index, file);
            self.scopes.push(scope);
        }
        for (file_index, file) in files.iter().enumerate() {
            self.resolve_aliases(file_index, file);
        }
        self.collapse_aliases();
        for (file_index, file) in files.iter().enumerate() {
            self.resolve_types(file_index, file);
        }
        for (file_index, file) in files.iter().enumerate() {
            self.resolve_providers(file_index, file);
        }
        for (file_index, file) in files.iter().enumerate() {
            self.resolve_consumers(file_index, file);
        }

        SemanticModel {
            packages: self.packages,
            declarations: self.declarations,
            index: self.index,
        }
    }

    fn error(&mut self, location: Location, message: impl Into<String>) {
        self.controller
            .context_mut(location.source)
            .error(message)
            .highlight(location)
            .emit();
    }

    fn warn(&mut self, location: Location, message: impl Into<String>) {
        self.controller
            .context_mut(location.source)
            .warn(message)
            .highlight(location)
            .emit();
    }

    // Pass 1: registration.

    fn register_file(&mut self, file_index: usize, file: &FileNode) {
        debug_assert_eq!(file_index, self.file_packages.len());
        let package_name = file.package.name.name();
        self.ensure_package(&package_name);
        self.file_packages.push(package_name.clone());

        let mut ids = Vec::with_capacity(file.statements.len());
        for statement in &file.statements {
            if let StatementNode::Consumer(consumer) = statement {
                let id = self.push_declaration(Declaration::Consumer(ConsumerType {
                    location: consumer.location,
                    provider: None,
                    uses: Vec::new(),
                }));
                if let Some(package) = self.packages.get_mut(&package_name) {
                    package.consumers.push(id);
                }
                ids.push(Some(id));
                continue;
            }

            let name = match statement {
                StatementNode::Record(node) => &node.name,
                StatementNode::Enum(node) => &node.name,
                StatementNode::TypeAlias(node) => &node.name,
                StatementNode::Service(node) => &node.name,
                StatementNode::Provider(node) => &node.name,
                StatementNode::Consumer(_) => unreachable!(),
            };
            let qualified = format!("{package_name}.{}", name.name);

            if let Some(&existing) = self.index.get(&qualified) {
                self.report_duplicate_declaration(name, existing);
                ids.push(None);
                continue;
            }
            if Type::builtin(&name.name).is_some() {
                self.warn(
                    name.location,
                    format!("type '{}' shadows a built-in type", name.name),
                );
            }

            let shell = shell_declaration(statement, name, &qualified);
            let id = self.push_declaration(shell);
            self.index.insert(qualified, id);
            if let Some(package) = self.packages.get_mut(&package_name) {
                package.types.insert(name.name.clone(), id);
            }
            ids.push(Some(id));
        }
        self.ids.push(ids);
    }

    fn push_declaration(&mut self, declaration: Declaration) -> TypeId {
        let id = TypeId(self.declarations.len() as u32);
        self.declarations.push(declaration);
        id
    }

    /// Creates the package and every missing ancestor, wiring child links.
    fn ensure_package(&mut self, qualified: &str) {
        let mut prefix = String::new();
        let mut parent: Option<String> = None;
        for component in qualified.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(component);
            if !self.packages.contains_key(&prefix) {
                self.packages.insert(
                    prefix.clone(),
                    Package::new(component.to_owned(), prefix.clone()),
                );
                if let Some(parent_name) = &parent {
                    if let Some(parent_package) = self.packages.get_mut(parent_name) {
                        parent_package.children.push(prefix.clone());
                    }
                }
            }
            parent = Some(prefix.clone());
        }
    }

    fn report_duplicate_declaration(&mut self, name: &IdentifierNode, existing: TypeId) {
        let previous = self.declarations[existing.index()].location();
        let message = format!("type '{}' is already declared", name.name);
        if previous.source == name.location.source {
            self.controller
                .context_mut(name.location.source)
                .error(message)
                .highlight(name.location)
                .highlight(previous)
                .emit();
        } else {
            let cited = format!(
                "previously declared at {}:{}",
                self.controller.context(previous.source).path(),
                previous.start
            );
            self.controller
                .context_mut(name.location.source)
                .error(message)
                .highlight(name.location)
                .annotate_info(cited)
                .emit();
        }
    }

    // Pass 2: scopes and imports.

    fn build_scope(&mut self, file_index: usize, file: &FileNode) -> Scope {
        let mut scope: Scope = IndexMap::new();
        if let Some(package) = self.packages.get(&self.file_packages[file_index]) {
            for (name, &id) in &package.types {
                scope.insert(name.clone(), id);
            }
        }

        let mut imported: IndexMap<String, Location> = IndexMap::new();
        for import in &file.imports {
            match import {
                ImportNode::Type(node) => {
                    let qualified = node.name.name();
                    let Some(&target) = self.index.get(&qualified) else {
                        self.error(
                            node.name.location,
                            format!("could not resolve import '{qualified}'"),
                        );
                        continue;
                    };
                    let local_name = node
                        .alias
                        .as_ref()
                        .unwrap_or_else(|| node.name.last())
                        .name
                        .clone();
                    if let Some(&previous) = imported.get(&local_name) {
                        self.controller
                            .context_mut(node.location.source)
                            .error(format!("import '{local_name}' is already imported"))
                            .highlight(node.location)
                            .highlight(previous)
                            .emit();
                        continue;
                    }
                    if scope.contains_key(&local_name) {
                        self.error(
                            node.location,
                            format!(
                                "import '{local_name}' conflicts with locally declared type '{local_name}'"
                            ),
                        );
                        continue;
                    }
                    imported.insert(local_name.clone(), node.location);
                    scope.insert(local_name, target);
                }
                ImportNode::Wildcard(node) => {
                    let package_name = node.name.name();
                    let Some(package) = self.packages.get(&package_name) else {
                        self.error(
                            node.location,
                            format!("could not resolve import '{package_name}.*'"),
                        );
                        continue;
                    };
                    // Local declarations and explicit imports win silently.
                    let members: Vec<(String, TypeId)> = package
                        .types
                        .iter()
                        .map(|(name, &id)| (name.clone(), id))
                        .collect();
                    for (name, id) in members {
                        scope.entry(name).or_insert(id);
                    }
                }
            }
        }
        scope
    }

    // Passes 3 and 4: aliases.

    fn resolve_aliases(&mut self, file_index: usize, file: &FileNode) {
        for (statement_index, statement) in file.statements.iter().enumerate() {
            let StatementNode::TypeAlias(node) = statement else {
                continue;
            };
            let Some(id) = self.ids[file_index][statement_index] else {
                continue;
            };
            let aliased = self.resolve_type_reference(&node.alias_for, file_index, false);
            self.declarations[id.index()] = Declaration::Alias(AliasType {
                name: node.name.name.clone(),
                qualified_name: format!(
                    "{}.{}",
                    self.file_packages[file_index], node.name.name
                ),
                location: node.location,
                annotations: convert_annotations(&node.annotations),
                aliased,
            });
        }
    }

    fn collapse_aliases(&mut self) {
        let alias_ids: Vec<TypeId> = self
            .declarations
            .iter()
            .enumerate()
            .filter(|(_, decl)| matches!(decl, Declaration::Alias(_)))
            .map(|(index, _)| TypeId(index as u32))
            .collect();

        let mut states = vec![AliasState::Unresolved; self.declarations.len()];
        let mut path = Vec::new();
        for id in alias_ids {
            self.collapse_alias(id, &mut states, &mut path);
        }
    }

    fn collapse_alias(
        &mut self,
        id: TypeId,
        states: &mut [AliasState],
        path: &mut Vec<TypeId>,
    ) {
        match states[id.index()] {
            AliasState::Resolved => return,
            AliasState::Resolving => {
                // Every alias on the cycle gets its own report and resolves
                // to Unknown.
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                for participant in path[start..].to_vec() {
                    let (name, location) = {
                        let Declaration::Alias(alias) =
                            &self.declarations[participant.index()]
                        else {
                            continue;
                        };
                        (alias.name.clone(), alias.location)
                    };
                    self.error(
                        location,
                        format!("type alias '{name}' is part of a reference cycle"),
                    );
                    if let Declaration::Alias(alias) =
                        &mut self.declarations[participant.index()]
                    {
                        alias.aliased.runtime_ty = Type::Unknown;
                    }
                    states[participant.index()] = AliasState::Resolved;
                }
                return;
            }
            AliasState::Unresolved => {}
        }

        states[id.index()] = AliasState::Resolving;
        path.push(id);

        let target = {
            let Declaration::Alias(alias) = &self.declarations[id.index()] else {
                path.pop();
                return;
            };
            match &alias.aliased.ty {
                Type::User(target)
                    if matches!(
                        self.declarations[target.index()],
                        Declaration::Alias(_)
                    ) =>
                {
                    Some(*target)
                }
                _ => None,
            }
        };

        if let Some(target) = target {
            self.collapse_alias(target, states, path);
            // The recursion may have resolved this alias as a cycle member.
            if states[id.index()] == AliasState::Resolved {
                path.pop();
                return;
            }

            let inner = {
                let Declaration::Alias(alias) = &self.declarations[target.index()] else {
                    unreachable!("target was checked to be an alias");
                };
                (
                    alias.aliased.runtime_ty.clone(),
                    alias.aliased.runtime_optional,
                    alias.aliased.runtime_constraints.clone(),
                    alias.name.clone(),
                )
            };
            let (surface_optional, location) = {
                let Declaration::Alias(alias) = &self.declarations[id.index()] else {
                    unreachable!("id is an alias");
                };
                (alias.aliased.is_optional, alias.aliased.location)
            };
            if surface_optional && inner.1 {
                self.warn(
                    location,
                    format!("optionality is redundant, '{}' is already optional", inner.3),
                );
            }
            if let Declaration::Alias(alias) = &mut self.declarations[id.index()] {
                let mut runtime_constraints = inner.2;
                runtime_constraints.extend(alias.aliased.constraints.iter().cloned());
                alias.aliased.runtime_ty = inner.0;
                alias.aliased.runtime_optional = surface_optional || inner.1;
                alias.aliased.runtime_constraints = runtime_constraints;
            }
        }
        // Non-alias targets already carry the correct runtime view from
        // surface resolution.

        states[id.index()] = AliasState::Resolved;
        path.pop();
    }

    // Pass 5: records, enums, services.

    fn resolve_types(&mut self, file_index: usize, file: &FileNode) {
        for (statement_index, statement) in file.statements.iter().enumerate() {
            let Some(id) = self.ids[file_index][statement_index] else {
                continue;
            };
            let package_name = self.file_packages[file_index].clone();
            match statement {
                StatementNode::Record(node) => {
                    let fields = node
                        .fields
                        .iter()
                        .map(|field| Field {
                            name: field.name.name.clone(),
                            location: field.location,
                            annotations: convert_annotations(&field.annotations),
                            ty: self.resolve_type_reference(&field.field_type, file_index, true),
                        })
                        .collect();
                    self.declarations[id.index()] = Declaration::Record(RecordType {
                        name: node.name.name.clone(),
                        qualified_name: format!("{package_name}.{}", node.name.name),
                        location: node.location,
                        annotations: convert_annotations(&node.annotations),
                        fields,
                    });
                }
                StatementNode::Enum(node) => {
                    self.declarations[id.index()] = Declaration::Enum(EnumType {
                        name: node.name.name.clone(),
                        qualified_name: format!("{package_name}.{}", node.name.name),
                        location: node.location,
                        annotations: convert_annotations(&node.annotations),
                        values: node.values.iter().map(|v| v.name.clone()).collect(),
                    });
                }
                StatementNode::Service(node) => {
                    let operations = node
                        .operations
                        .iter()
                        .map(|operation| self.resolve_operation(operation, file_index))
                        .collect();
                    self.declarations[id.index()] = Declaration::Service(ServiceType {
                        name: node.name.name.clone(),
                        qualified_name: format!("{package_name}.{}", node.name.name),
                        location: node.location,
                        annotations: convert_annotations(&node.annotations),
                        operations,
                    });
                }
                _ => {}
            }
        }
    }

    fn resolve_operation(&mut self, operation: &OperationNode, file_index: usize) -> Operation {
        match operation {
            OperationNode::RequestResponse(node) => Operation {
                name: node.name.name.clone(),
                location: node.location,
                annotations: convert_annotations(&node.annotations),
                kind: if node.is_async {
                    OperationKind::Asynchronous
                } else {
                    OperationKind::Synchronous
                },
                parameters: self.resolve_parameters(&node.parameters, file_index),
                return_type: node
                    .return_type
                    .as_ref()
                    .map(|ty| self.resolve_type_reference(ty, file_index, true)),
                raises: node
                    .raises
                    .iter()
                    .map(|ty| self.resolve_type_reference(ty, file_index, true))
                    .collect(),
            },
            // Return and raises clauses on oneway operations were already
            // rejected by the parser; they are not carried into the model.
            OperationNode::Oneway(node) => Operation {
                name: node.name.name.clone(),
                location: node.location,
                annotations: convert_annotations(&node.annotations),
                kind: OperationKind::Oneway,
                parameters: self.resolve_parameters(&node.parameters, file_index),
                return_type: None,
                raises: Vec::new(),
            },
        }
    }

    fn resolve_parameters(
        &mut self,
        parameters: &[OperationParameterNode],
        file_index: usize,
    ) -> Vec<Parameter> {
        parameters
            .iter()
            .map(|parameter| Parameter {
                name: parameter.name.name.clone(),
                location: parameter.location,
                annotations: convert_annotations(&parameter.annotations),
                ty: self.resolve_type_reference(&parameter.parameter_type, file_index, true),
            })
            .collect()
    }

    // Pass 6: providers.

    fn resolve_providers(&mut self, file_index: usize, file: &FileNode) {
        for (statement_index, statement) in file.statements.iter().enumerate() {
            let StatementNode::Provider(node) = statement else {
                continue;
            };
            let Some(id) = self.ids[file_index][statement_index] else {
                continue;
            };

            let mut implements: Vec<ImplementedService> = Vec::new();
            for clause in &node.implements {
                let Some(service_id) =
                    self.lookup_declaration(&clause.service_name, file_index)
                else {
                    continue;
                };
                let service_operations = match &self.declarations[service_id.index()] {
                    Declaration::Service(service) => service
                        .operations
                        .iter()
                        .map(|op| op.name.clone())
                        .collect::<Vec<_>>(),
                    other => {
                        let message = format!(
                            "{} '{}' is not a service",
                            other.kind_name(),
                            clause.service_name.name()
                        );
                        self.error(clause.service_name.location, message);
                        continue;
                    }
                };
                if let Some(previous) = implements.iter().find(|i| i.service == service_id) {
                    let previous_location = previous.location;
                    self.controller
                        .context_mut(clause.location.source)
                        .error(format!(
                            "service '{}' is implemented more than once",
                            clause.service_name.name()
                        ))
                        .highlight(clause.location)
                        .highlight(previous_location)
                        .emit();
                    continue;
                }

                let operations = self.checked_operation_list(
                    &clause.operation_names,
                    &service_operations,
                    &clause.service_name.name(),
                );
                implements.push(ImplementedService {
                    location: clause.location,
                    service: service_id,
                    operations,
                });
            }

            if let Declaration::Provider(provider) = &mut self.declarations[id.index()] {
                provider.implements = implements;
                provider.transport = Transport {
                    location: node.transport.location,
                    protocol: node.transport.protocol.name.clone(),
                    configuration: node.transport.configuration.clone(),
                };
            }
        }
    }

    /// Checks an explicit operation-name list against a service's operations
    /// and returns the effective list; an empty explicit list means all.
    fn checked_operation_list(
        &mut self,
        listed: &[IdentifierNode],
        available: &[String],
        service_name: &str,
    ) -> Vec<String> {
        if listed.is_empty() {
            return available.to_vec();
        }
        let mut operations = Vec::with_capacity(listed.len());
        for name in listed {
            if available.contains(&name.name) {
                operations.push(name.name.clone());
            } else {
                self.error(
                    name.location,
                    format!(
                        "operation '{}' not found in service '{service_name}'",
                        name.name
                    ),
                );
            }
        }
        operations
    }

    // Pass 7: consumers.

    fn resolve_consumers(&mut self, file_index: usize, file: &FileNode) {
        for (statement_index, statement) in file.statements.iter().enumerate() {
            let StatementNode::Consumer(node) = statement else {
                continue;
            };
            let Some(id) = self.ids[file_index][statement_index] else {
                continue;
            };

            let Some(provider_id) = self.lookup_declaration(&node.provider, file_index) else {
                continue;
            };
            let (provider_name, implemented) = match &self.declarations[provider_id.index()] {
                Declaration::Provider(provider) => (
                    provider.name.clone(),
                    provider
                        .implements
                        .iter()
                        .map(|i| (i.service, i.operations.clone()))
                        .collect::<Vec<_>>(),
                ),
                other => {
                    let message = format!(
                        "{} '{}' is not a provider",
                        other.kind_name(),
                        node.provider.name()
                    );
                    self.error(node.provider.location, message);
                    continue;
                }
            };

            let mut uses: Vec<UsedService> = Vec::new();
            for clause in &node.usages {
                let Some(service_id) =
                    self.lookup_declaration(&clause.service_name, file_index)
                else {
                    continue;
                };
                let service_operations = match &self.declarations[service_id.index()] {
                    Declaration::Service(service) => service
                        .operations
                        .iter()
                        .map(|op| op.name.clone())
                        .collect::<Vec<_>>(),
                    other => {
                        let message = format!(
                            "{} '{}' is not a service",
                            other.kind_name(),
                            clause.service_name.name()
                        );
                        self.error(clause.service_name.location, message);
                        continue;
                    }
                };
                if let Some(previous) = uses.iter().find(|u| u.service == service_id) {
                    let previous_location = previous.location;
                    self.controller
                        .context_mut(clause.location.source)
                        .error(format!(
                            "service '{}' is used more than once",
                            clause.service_name.name()
                        ))
                        .highlight(clause.location)
                        .highlight(previous_location)
                        .emit();
                    continue;
                }

                let Some((_, implemented_operations)) =
                    implemented.iter().find(|(s, _)| *s == service_id)
                else {
                    let message = format!(
                        "service '{}' is not implemented by provider '{provider_name}'",
                        clause.service_name.name()
                    );
                    self.error(clause.service_name.location, message);
                    continue;
                };

                let operations = if clause.operation_names.is_empty() {
                    implemented_operations.clone()
                } else {
                    let mut operations = Vec::with_capacity(clause.operation_names.len());
                    for name in &clause.operation_names {
                        if !service_operations.contains(&name.name) {
                            let message = format!(
                                "operation '{}' not found in service '{}'",
                                name.name,
                                clause.service_name.name()
                            );
                            self.error(name.location, message);
                        } else if !implemented_operations.contains(&name.name) {
                            let message = format!(
                                "operation '{}' is not implemented by provider '{provider_name}'",
                                name.name
                            );
                            self.error(name.location, message);
                        } else {
                            operations.push(name.name.clone());
                        }
                    }
                    operations
                };
                uses.push(UsedService {
                    location: clause.location,
                    service: service_id,
                    operations,
                });
            }

            if let Declaration::Consumer(consumer) = &mut self.declarations[id.index()] {
                consumer.provider = Some(provider_id);
                consumer.uses = uses;
            }
        }
    }

    // Reference resolution.

    /// Resolves a name to a declaration handle: simple names go through the
    /// file's scope, dotted names through the global index.
    fn lookup_declaration(
        &mut self,
        name: &BundleIdentifierNode,
        file_index: usize,
    ) -> Option<TypeId> {
        let resolved = if name.components.len() == 1 {
            self.scopes[file_index].get(&name.components[0].name).copied()
        } else {
            self.index.get(&name.name()).copied()
        };
        if resolved.is_none() {
            self.error(
                name.location,
                format!("could not resolve '{}'", name.name()),
            );
        }
        resolved
    }

    /// Resolves a type expression into a [`TypeReference`]. With `collapse`
    /// set, references through aliases get their runtime view filled from the
    /// already-collapsed alias; alias surface resolution itself runs without
    /// it. Shape violations were reported by the structural checks and
    /// resolve silently to Unknown here.
    fn resolve_type_reference(
        &mut self,
        expression: &ExpressionNode,
        file_index: usize,
        collapse: bool,
    ) -> TypeReference {
        match expression {
            ExpressionNode::Identifier(name) => {
                if let Some(target) = self.scopes[file_index].get(&name.name).copied() {
                    self.user_reference(target, name.location, &name.name, collapse)
                } else if let Some(builtin) = Type::builtin(&name.name) {
                    TypeReference::direct(name.location, builtin, false, Vec::new())
                } else {
                    self.error(
                        name.location,
                        format!("could not resolve type '{}'", name.name),
                    );
                    TypeReference::unknown(name.location)
                }
            }
            ExpressionNode::BundleIdentifier(name) => {
                if let Some(target) = self.index.get(&name.name()).copied() {
                    self.user_reference(target, name.location, &name.name(), collapse)
                } else {
                    self.error(
                        name.location,
                        format!("could not resolve type '{}'", name.name()),
                    );
                    TypeReference::unknown(name.location)
                }
            }
            ExpressionNode::Optional(node) => {
                let mut inner = self.resolve_type_reference(&node.base, file_index, collapse);
                if inner.runtime_optional && !inner.is_optional {
                    let name = display_name(&self.declarations, &inner.ty);
                    self.warn(
                        node.location,
                        format!("optionality is redundant, '{name}' is already optional"),
                    );
                }
                inner.is_optional = true;
                inner.runtime_optional = true;
                inner.location = node.location;
                inner
            }
            ExpressionNode::Generic(node) => self.resolve_generic(node, file_index, collapse),
            ExpressionNode::Call(node) => {
                let mut inner = self.resolve_type_reference(&node.base, file_index, collapse);
                let base_ty = inner.runtime_ty.clone();
                let base_name = display_name(&self.declarations, &base_ty);
                for argument in &node.arguments {
                    if let Some(constraint) =
                        self.resolve_constraint(argument, &base_ty, &base_name)
                    {
                        inner.constraints.push(constraint.clone());
                        inner.runtime_constraints.push(constraint);
                    }
                }
                inner.location = node.location;
                inner
            }
            other => TypeReference::unknown(other.location()),
        }
    }

    fn user_reference(
        &mut self,
        target: TypeId,
        location: Location,
        name: &str,
        collapse: bool,
    ) -> TypeReference {
        match &self.declarations[target.index()] {
            Declaration::Record(_) | Declaration::Enum(_) => {
                TypeReference::direct(location, Type::User(target), false, Vec::new())
            }
            Declaration::Alias(alias) => {
                if collapse {
                    TypeReference {
                        location,
                        ty: Type::User(target),
                        is_optional: false,
                        constraints: Vec::new(),
                        runtime_ty: alias.aliased.runtime_ty.clone(),
                        runtime_optional: alias.aliased.runtime_optional,
                        runtime_constraints: alias.aliased.runtime_constraints.clone(),
                    }
                } else {
                    TypeReference::direct(location, Type::User(target), false, Vec::new())
                }
            }
            other => {
                let message =
                    format!("{} '{name}' cannot be used as a type", other.kind_name());
                self.error(location, message);
                TypeReference::unknown(location)
            }
        }
    }

    fn resolve_generic(
        &mut self,
        node: &GenericSpecializationNode,
        file_index: usize,
        collapse: bool,
    ) -> TypeReference {
        // An empty argument list was already reported by the parser.
        if node.arguments.is_empty() {
            return TypeReference::unknown(node.location);
        }
        let base_name = match node.base.as_ref() {
            ExpressionNode::Identifier(name) => name.name.clone(),
            ExpressionNode::BundleIdentifier(name) => name.name(),
            _ => {
                self.error(node.location, "unsupported generic type");
                return TypeReference::unknown(node.location);
            }
        };

        let ty = match (base_name.as_str(), node.arguments.len()) {
            ("List", 1) => {
                let element =
                    self.resolve_type_reference(&node.arguments[0], file_index, collapse);
                Type::List(Box::new(element))
            }
            ("Map", 2) => {
                let key = self.resolve_type_reference(&node.arguments[0], file_index, collapse);
                let value =
                    self.resolve_type_reference(&node.arguments[1], file_index, collapse);
                Type::Map(Box::new(key), Box::new(value))
            }
            _ => {
                self.error(
                    node.location,
                    format!("unsupported generic type '{base_name}'"),
                );
                return TypeReference::unknown(node.location);
            }
        };
        TypeReference::direct(node.location, ty, false, Vec::new())
    }

    // Constraint resolution.

    /// Resolves one constraint argument against the (runtime) base type and
    /// checks it against the legality matrix. Returns `None` when the
    /// constraint was reported and dropped.
    fn resolve_constraint(
        &mut self,
        expression: &ExpressionNode,
        base: &Type,
        base_name: &str,
    ) -> Option<Constraint> {
        let constraint = match expression {
            // Shorthand forms.
            ExpressionNode::Range(node) => {
                if base.is_sized() {
                    self.size_constraint(node)?
                } else {
                    self.range_constraint(node)?
                }
            }
            ExpressionNode::String(node) => self.pattern_constraint(&node.value, node.location)?,
            ExpressionNode::Integer(node) => {
                Constraint::Value(AnnotationValue::Integer(node.value))
            }
            ExpressionNode::Float(node) => Constraint::Value(AnnotationValue::Float(node.value)),
            ExpressionNode::Boolean(node) => {
                Constraint::Value(AnnotationValue::Boolean(node.value))
            }
            // Named forms.
            ExpressionNode::Call(call) => {
                let ExpressionNode::Identifier(name) = call.base.as_ref() else {
                    self.error(call.location, "expression cannot be used as a constraint");
                    return None;
                };
                match name.name.as_str() {
                    "range" => {
                        let [ExpressionNode::Range(range)] = call.arguments.as_slice() else {
                            self.error(
                                call.location,
                                "range expects a single range argument",
                            );
                            return None;
                        };
                        self.range_constraint(range)?
                    }
                    "size" => {
                        let [ExpressionNode::Range(range)] = call.arguments.as_slice() else {
                            self.error(call.location, "size expects a single range argument");
                            return None;
                        };
                        self.size_constraint(range)?
                    }
                    "pattern" => {
                        let [ExpressionNode::String(value)] = call.arguments.as_slice() else {
                            self.error(
                                call.location,
                                "pattern expects a single string argument",
                            );
                            return None;
                        };
                        self.pattern_constraint(&value.value, call.location)?
                    }
                    "value" => {
                        let value = match call.arguments.as_slice() {
                            [ExpressionNode::Integer(node)] => {
                                AnnotationValue::Integer(node.value)
                            }
                            [ExpressionNode::Float(node)] => AnnotationValue::Float(node.value),
                            [ExpressionNode::Boolean(node)] => {
                                AnnotationValue::Boolean(node.value)
                            }
                            [ExpressionNode::String(node)] => {
                                AnnotationValue::String(node.value.clone())
                            }
                            _ => {
                                self.error(
                                    call.location,
                                    "value expects a single literal argument",
                                );
                                return None;
                            }
                        };
                        Constraint::Value(value)
                    }
                    other => {
                        self.error(call.location, format!("unknown constraint '{other}'"));
                        return None;
                    }
                }
            }
            other => {
                self.error(other.location(), "expression cannot be used as a constraint");
                return None;
            }
        };

        let legal = match &constraint {
            Constraint::Range { .. } => base.is_numeric(),
            Constraint::Size { .. } => base.is_sized(),
            Constraint::Pattern(_) => matches!(base, Type::String),
            Constraint::Value(_) => base.is_numeric() || matches!(base, Type::Boolean),
        };
        if !legal && !matches!(base, Type::Unknown) {
            self.error(
                expression.location(),
                format!(
                    "constraint '{}' cannot be applied to type '{base_name}'",
                    constraint.kind_name()
                ),
            );
            return None;
        }
        Some(constraint)
    }

    fn range_constraint(&mut self, node: &RangeExpressionNode) -> Option<Constraint> {
        let lower = self.numeric_bound(&node.left)?;
        let upper = self.numeric_bound(&node.right)?;
        self.checked_bounds(node, lower, upper, Bound::as_f64)
            .map(|(lower, upper)| Constraint::Range { lower, upper })
    }

    fn size_constraint(&mut self, node: &RangeExpressionNode) -> Option<Constraint> {
        let lower = self.integer_bound(&node.left)?;
        let upper = self.integer_bound(&node.right)?;
        self.checked_bounds(node, lower, upper, |b| b as f64)
            .map(|(lower, upper)| Constraint::Size { lower, upper })
    }

    /// Rejects the fully unbounded form and misordered bounds.
    fn checked_bounds<B: Copy>(
        &mut self,
        node: &RangeExpressionNode,
        lower: Option<B>,
        upper: Option<B>,
        as_f64: impl Fn(B) -> f64,
    ) -> Option<(Option<B>, Option<B>)> {
        if lower.is_none() && upper.is_none() {
            self.error(
                node.location,
                "a range constraint must have at least one bound",
            );
            return None;
        }
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if as_f64(lower) > as_f64(upper) {
                self.error(
                    node.location,
                    "the lower bound of a range must not exceed the upper bound",
                );
                return None;
            }
        }
        Some((lower, upper))
    }

    /// One side of a range bound: a number or the `*` wildcard. The outer
    /// `None` means the bound was invalid and reported.
    fn numeric_bound(&mut self, expression: &ExpressionNode) -> Option<Option<Bound>> {
        match expression {
            ExpressionNode::Integer(node) => Some(Some(Bound::Integer(node.value))),
            ExpressionNode::Float(node) => Some(Some(Bound::Float(node.value))),
            ExpressionNode::Wildcard(_) => Some(None),
            other => {
                self.error(other.location(), "range bounds must be numbers or '*'");
                None
            }
        }
    }

    fn integer_bound(&mut self, expression: &ExpressionNode) -> Option<Option<i64>> {
        match expression {
            ExpressionNode::Integer(node) => Some(Some(node.value)),
            ExpressionNode::Wildcard(_) => Some(None),
            ExpressionNode::Float(node) => {
                self.error(node.location, "size bounds must be integers");
                None
            }
            other => {
                self.error(other.location(), "size bounds must be integers or '*'");
                None
            }
        }
    }

    fn pattern_constraint(&mut self, value: &str, location: Location) -> Option<Constraint> {
        let mut parser = regex_syntax::Parser::new();
        if let Err(err) = parser.parse(value) {
            self.error(location, format!("invalid pattern: {err}"));
            return None;
        }
        Some(Constraint::Pattern(value.to_owned()))
    }
}

fn shell_declaration(
    statement: &StatementNode,
    name: &IdentifierNode,
    qualified: &str,
) -> Declaration {
    let location = statement.location();
    let name = name.name.clone();
    let qualified_name = qualified.to_owned();
    match statement {
        StatementNode::Record(_) => Declaration::Record(RecordType {
            name,
            qualified_name,
            location,
            annotations: Vec::new(),
            fields: Vec::new(),
        }),
        StatementNode::Enum(_) => Declaration::Enum(EnumType {
            name,
            qualified_name,
            location,
            annotations: Vec::new(),
            values: Vec::new(),
        }),
        StatementNode::TypeAlias(_) => Declaration::Alias(AliasType {
            name,
            qualified_name,
            location,
            annotations: Vec::new(),
            aliased: TypeReference::unknown(location),
        }),
        StatementNode::Service(_) => Declaration::Service(ServiceType {
            name,
            qualified_name,
            location,
            annotations: Vec::new(),
            operations: Vec::new(),
        }),
        StatementNode::Provider(_) => Declaration::Provider(ProviderType {
            name,
            qualified_name,
            location,
            implements: Vec::new(),
            transport: Transport {
                location,
                protocol: String::new(),
                configuration: None,
            },
        }),
        StatementNode::Consumer(_) => unreachable!("consumers are registered separately"),
    }
}

fn convert_annotations(annotations: &[AnnotationNode]) -> Vec<Annotation> {
    annotations
        .iter()
        .map(|annotation| Annotation {
            location: annotation.location,
            name: annotation.name.name.clone(),
            arguments: annotation
                .arguments
                .iter()
                .filter_map(scalar_value)
                .collect(),
        })
        .collect()
}

/// Non-scalar arguments were reported by the structural checks and are
/// dropped here.
fn scalar_value(expression: &ExpressionNode) -> Option<AnnotationValue> {
    match expression {
        ExpressionNode::Integer(node) => Some(AnnotationValue::Integer(node.value)),
        ExpressionNode::Float(node) => Some(AnnotationValue::Float(node.value)),
        ExpressionNode::Boolean(node) => Some(AnnotationValue::Boolean(node.value)),
        ExpressionNode::String(node) => Some(AnnotationValue::String(node.value.clone())),
        _ => None,
    }
}
