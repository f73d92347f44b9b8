//! In-memory schema graph: types, fields, enum values and their annotations.
//!
//! A [`SchemaGraph`] is built once from a finished definition and checked
//! against its structural invariants before anything else reads it:
//!
//! - type names are unique and never shadow a built-in scalar
//! - every type has at least one member; member names are unique within their type
//! - every field and argument type resolves to a defined type or a built-in scalar
//! - argument types are built-in scalars or enums
//! - root operation types exist and are object types

use std::collections::btree_map::{BTreeMap, Entry};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ParseTypeRefError, SchemaError};
use crate::types::{is_builtin_scalar, ElementKind};

/// Reference to a type, with list and non-null modifiers.
///
/// Serialized in GraphQL notation, e.g. `"[Book!]!"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List(Box::new(of))
    }

    pub fn non_null(of: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(of))
    }

    /// The innermost named type, with all modifiers removed.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

impl FromStr for TypeRef {
    type Err = ParseTypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseTypeRefError {
            value: s.to_string(),
        };
        let trimmed = s.trim();

        if let Some(inner) = trimmed.strip_suffix('!') {
            let inner: TypeRef = inner.parse().map_err(|_| invalid())?;
            // `String!!` is not a type
            if matches!(inner, TypeRef::NonNull(_)) {
                return Err(invalid());
            }
            return Ok(TypeRef::non_null(inner));
        }

        if let Some(inner) = trimmed.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(invalid)?;
            let inner: TypeRef = inner.parse().map_err(|_| invalid())?;
            return Ok(TypeRef::list(inner));
        }

        let mut chars = trimmed.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }

        Ok(TypeRef::named(trimmed))
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ParseTypeRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// A directive applied to one graph element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnnotationRepr")]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub arguments: Map<String, Value>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

// Shorthand `"private"` or full `{ "name": "private", "arguments": {..} }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnnotationRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        arguments: Map<String, Value>,
    },
}

impl From<AnnotationRepr> for Annotation {
    fn from(repr: AnnotationRepr) -> Self {
        match repr {
            AnnotationRepr::Name(name) => Annotation::new(name),
            AnnotationRepr::Full { name, arguments } => Annotation { name, arguments },
        }
    }
}

/// Annotations attached directly to one element, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(Vec<Annotation>);

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|a| a.name.as_str())
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    pub fn retain<F: FnMut(&Annotation) -> bool>(&mut self, f: F) {
        self.0.retain(f);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Annotation> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Argument accepted by a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentNode {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// Field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentNode>,
    #[serde(
        default,
        rename = "directives",
        skip_serializing_if = "AnnotationSet::is_empty"
    )]
    pub annotations: AnnotationSet,
}

impl FieldNode {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            annotations: AnnotationSet::new(),
        }
    }

    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.arguments.push(ArgumentNode {
            name: name.into(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Value of an enum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EnumValueRepr")]
pub struct EnumValueNode {
    pub name: String,
    #[serde(
        default,
        rename = "directives",
        skip_serializing_if = "AnnotationSet::is_empty"
    )]
    pub annotations: AnnotationSet,
}

impl EnumValueNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: AnnotationSet::new(),
        }
    }

    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnumValueRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        directives: AnnotationSet,
    },
}

impl From<EnumValueRepr> for EnumValueNode {
    fn from(repr: EnumValueRepr) -> Self {
        match repr {
            EnumValueRepr::Name(name) => EnumValueNode::new(name),
            EnumValueRepr::Full { name, directives } => EnumValueNode {
                name,
                annotations: directives,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Object,
    Enum,
}

impl TypeKind {
    pub fn element_kind(&self) -> ElementKind {
        match self {
            TypeKind::Object => ElementKind::Object,
            TypeKind::Enum => ElementKind::Enum,
        }
    }
}

/// An object type or enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub name: String,
    pub kind: TypeKind,
    #[serde(
        default,
        rename = "directives",
        skip_serializing_if = "AnnotationSet::is_empty"
    )]
    pub annotations: AnnotationSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<EnumValueNode>,
}

impl TypeNode {
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: AnnotationSet::new(),
            fields: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: EnumValueNode) -> Self {
        self.values.push(value);
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&EnumValueNode> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Number of fields (object) or values (enum).
    pub fn member_count(&self) -> usize {
        match self.kind {
            TypeKind::Object => self.fields.len(),
            TypeKind::Enum => self.values.len(),
        }
    }
}

/// Root operation type names, in `query`, `mutation`, `subscription` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootOperations {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl Default for RootOperations {
    fn default() -> Self {
        Self {
            query: "Query".to_string(),
            mutation: None,
            subscription: None,
        }
    }
}

impl RootOperations {
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            query: name.into(),
            mutation: None,
            subscription: None,
        }
    }

    /// `(operation, type name)` pairs for every declared root.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        std::iter::once(("query", self.query.as_str()))
            .chain(self.mutation.as_deref().map(|m| ("mutation", m)))
            .chain(self.subscription.as_deref().map(|s| ("subscription", s)))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.iter().any(|(_, name)| name == type_name)
    }
}

/// `directive @name on LOCATION | ...` as written in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveDeclaration {
    pub name: String,
    pub locations: Vec<ElementKind>,
}

/// Address of a field: `Type.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldCoordinate {
    pub type_name: String,
    pub field_name: String,
}

impl FieldCoordinate {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }
}

impl fmt::Display for FieldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Borrowed view of one annotated element, used by whole-graph scans.
#[derive(Debug, Clone)]
pub struct ElementRef<'a> {
    /// Schema coordinate, e.g. `Client`, `Client.secretField`, `Color.RED`.
    pub path: String,
    pub kind: ElementKind,
    pub annotations: &'a AnnotationSet,
}

/// The schema: named types plus root operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "SchemaDocument")]
pub struct SchemaGraph {
    roots: RootOperations,
    directives: Vec<DirectiveDeclaration>,
    types: BTreeMap<String, TypeNode>,
}

impl SchemaGraph {
    /// Build a graph and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` for duplicate names, members of the wrong kind,
    /// unknown root types, or references to undefined types.
    pub fn from_parts(
        roots: RootOperations,
        directives: Vec<DirectiveDeclaration>,
        types: impl IntoIterator<Item = TypeNode>,
    ) -> Result<Self, SchemaError> {
        let mut graph = Self {
            roots,
            directives,
            types: BTreeMap::new(),
        };
        for ty in types {
            graph.add_type(ty)?;
        }
        graph.check_roots()?;
        if let Some((path, type_name)) = graph.find_dangling_reference() {
            return Err(SchemaError::UnknownTypeReference { path, type_name });
        }
        graph.check_argument_types()?;
        Ok(graph)
    }

    fn add_type(&mut self, ty: TypeNode) -> Result<(), SchemaError> {
        if is_builtin_scalar(&ty.name) {
            return Err(SchemaError::ReservedTypeName { name: ty.name });
        }
        check_members(&ty)?;
        match self.types.entry(ty.name.clone()) {
            Entry::Occupied(_) => Err(SchemaError::DuplicateType { name: ty.name }),
            Entry::Vacant(slot) => {
                slot.insert(ty);
                Ok(())
            }
        }
    }

    fn check_roots(&self) -> Result<(), SchemaError> {
        for (operation, name) in self.roots.iter() {
            match self.types.get(name) {
                None => {
                    return Err(SchemaError::UnknownRootType {
                        operation: operation.to_string(),
                        type_name: name.to_string(),
                    })
                }
                Some(ty) if ty.kind != TypeKind::Object => {
                    return Err(SchemaError::RootNotObject {
                        operation: operation.to_string(),
                        type_name: name.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    // Arguments are inputs: only scalars and enums
    fn check_argument_types(&self) -> Result<(), SchemaError> {
        for ty in self.types.values() {
            for field in &ty.fields {
                for arg in &field.arguments {
                    let target = arg.ty.named_type();
                    let is_input = is_builtin_scalar(target)
                        || self
                            .types
                            .get(target)
                            .map(|t| t.kind == TypeKind::Enum)
                            .unwrap_or(false);
                    if !is_input {
                        return Err(SchemaError::InvalidArgumentType {
                            path: format!("{}.{}({}:)", ty.name, field.name, arg.name),
                            type_name: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn roots(&self) -> &RootOperations {
        &self.roots
    }

    pub fn directive_declarations(&self) -> &[DirectiveDeclaration] {
        &self.directives
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn type_node(&self, name: &str) -> Option<&TypeNode> {
        self.types.get(name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn field(&self, coordinate: &FieldCoordinate) -> Option<&FieldNode> {
        self.types
            .get(&coordinate.type_name)
            .and_then(|ty| ty.field(&coordinate.field_name))
    }

    /// Coordinates of every field, in type-name then declaration order.
    pub fn field_coordinates(&self) -> Vec<FieldCoordinate> {
        self.types
            .values()
            .flat_map(|ty| {
                ty.fields
                    .iter()
                    .map(|f| FieldCoordinate::new(ty.name.as_str(), f.name.as_str()))
            })
            .collect()
    }

    /// Every annotated-or-not element: types, fields, enum values.
    pub fn elements(&self) -> Vec<ElementRef<'_>> {
        let mut out = Vec::new();
        for ty in self.types.values() {
            out.push(ElementRef {
                path: ty.name.clone(),
                kind: ty.kind.element_kind(),
                annotations: &ty.annotations,
            });
            for field in &ty.fields {
                out.push(ElementRef {
                    path: format!("{}.{}", ty.name, field.name),
                    kind: ElementKind::Field,
                    annotations: &field.annotations,
                });
            }
            for value in &ty.values {
                out.push(ElementRef {
                    path: format!("{}.{}", ty.name, value.name),
                    kind: ElementKind::EnumValue,
                    annotations: &value.annotations,
                });
            }
        }
        out
    }

    // --- Targeted mutation ---

    pub fn remove_type(&mut self, name: &str) -> Option<TypeNode> {
        self.types.remove(name)
    }

    pub fn remove_field(&mut self, type_name: &str, field_name: &str) -> Option<FieldNode> {
        let ty = self.types.get_mut(type_name)?;
        let idx = ty.fields.iter().position(|f| f.name == field_name)?;
        Some(ty.fields.remove(idx))
    }

    pub fn remove_enum_value(&mut self, enum_name: &str, value_name: &str) -> Option<EnumValueNode> {
        let ty = self.types.get_mut(enum_name)?;
        let idx = ty.values.iter().position(|v| v.name == value_name)?;
        Some(ty.values.remove(idx))
    }

    /// Keep only the types for which `keep` returns true.
    pub fn retain_types<F: FnMut(&TypeNode) -> bool>(&mut self, mut keep: F) {
        self.types.retain(|_, ty| keep(ty));
    }

    /// Keep only the directive declarations for which `keep` returns true.
    pub fn retain_directive_declarations<F: FnMut(&DirectiveDeclaration) -> bool>(&mut self, keep: F) {
        self.directives.retain(keep);
    }

    pub(crate) fn types_mut(&mut self) -> impl Iterator<Item = &mut TypeNode> {
        self.types.values_mut()
    }

    /// First field or argument whose named type is neither defined nor built in.
    ///
    /// Returns `(path, type_name)`.
    pub fn find_dangling_reference(&self) -> Option<(String, String)> {
        for ty in self.types.values() {
            for field in &ty.fields {
                let target = field.ty.named_type();
                if !self.resolves(target) {
                    return Some((format!("{}.{}", ty.name, field.name), target.to_string()));
                }
                for arg in &field.arguments {
                    let target = arg.ty.named_type();
                    if !self.resolves(target) {
                        return Some((
                            format!("{}.{}({}:)", ty.name, field.name, arg.name),
                            target.to_string(),
                        ));
                    }
                }
            }
        }
        None
    }

    fn resolves(&self, type_name: &str) -> bool {
        is_builtin_scalar(type_name) || self.types.contains_key(type_name)
    }
}

fn check_members(ty: &TypeNode) -> Result<(), SchemaError> {
    let mismatch = |kind: &str, member: &str| SchemaError::MemberKindMismatch {
        type_name: ty.name.clone(),
        kind: kind.to_string(),
        member: member.to_string(),
    };
    match ty.kind {
        TypeKind::Object if !ty.values.is_empty() => return Err(mismatch("an object", "enum values")),
        TypeKind::Enum if !ty.fields.is_empty() => return Err(mismatch("an enum", "fields")),
        _ => {}
    }
    if ty.member_count() == 0 {
        return Err(SchemaError::EmptyType {
            type_name: ty.name.clone(),
        });
    }

    let mut seen = HashSet::new();
    for field in &ty.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateMember {
                path: format!("{}.{}", ty.name, field.name),
            });
        }
        let mut args = HashSet::new();
        for arg in &field.arguments {
            if !args.insert(arg.name.as_str()) {
                return Err(SchemaError::DuplicateMember {
                    path: format!("{}.{}({}:)", ty.name, field.name, arg.name),
                });
            }
        }
    }
    for value in &ty.values {
        if !seen.insert(value.name.as_str()) {
            return Err(SchemaError::DuplicateMember {
                path: format!("{}.{}", ty.name, value.name),
            });
        }
    }
    Ok(())
}

/// Serialized form of a [`SchemaGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub schema: RootOperations,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveDeclaration>,
    #[serde(default)]
    pub types: Vec<TypeNode>,
}

impl SchemaDocument {
    /// Convert into a checked graph.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the document violates a graph invariant.
    pub fn into_graph(self) -> Result<SchemaGraph, SchemaError> {
        SchemaGraph::from_parts(self.schema, self.directives, self.types)
    }
}

impl From<SchemaGraph> for SchemaDocument {
    fn from(graph: SchemaGraph) -> Self {
        Self {
            schema: graph.roots,
            directives: graph.directives,
            types: graph.types.into_values().collect(),
        }
    }
}
