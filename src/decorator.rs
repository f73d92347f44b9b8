//! Resolver decoration: post-processing of field results driven by transform
//! directives.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ResolverError;
use crate::graph::{FieldCoordinate, SchemaGraph};
use crate::registry::{DirectiveRegistry, TextTransform};

/// Inputs handed to a resolver for one field invocation.
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Value the parent field resolved to (`Null` for root fields).
    pub parent: Value,
    /// Field arguments supplied by the request.
    pub arguments: Map<String, Value>,
}

impl ResolveArgs {
    pub fn new(parent: Value) -> Self {
        Self {
            parent,
            arguments: Map::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

/// Future returned by a resolver.
pub type ResolverFuture = BoxFuture<'static, Result<Value, ResolverError>>;

/// Shared handle to a field's result-producing function.
///
/// Cheap to clone; the function itself may suspend.
#[derive(Clone)]
pub struct Resolver(Arc<dyn Fn(ResolveArgs) -> ResolverFuture + Send + Sync>);

impl Resolver {
    /// Wrap an async function as a resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ResolveArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ResolverError>> + Send + 'static,
    {
        Resolver(Arc::new(move |args: ResolveArgs| f(args).boxed()))
    }

    /// Resolver that always returns `value`.
    pub fn constant(value: Value) -> Self {
        Resolver::new(move |_| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// Resolver that reads the property `field_name` from the parent value.
    ///
    /// Missing properties and non-object parents resolve to `Null`.
    pub fn property(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Resolver::new(move |args| {
            let value = args.parent.get(&field_name).cloned().unwrap_or(Value::Null);
            async move { Ok(value) }
        })
    }

    /// Invoke the resolver.
    pub fn call(&self, args: ResolveArgs) -> ResolverFuture {
        (self.0)(args)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Wrap `resolver` so that text results pass through `transform`.
///
/// Non-text results are returned unchanged, and a failure of the original
/// resolver is propagated as-is.
pub fn decorate(resolver: Resolver, transform: TextTransform) -> Resolver {
    Resolver::new(move |args| {
        let inner = resolver.call(args);
        async move {
            let value = inner.await?;
            Ok(match value {
                Value::String(text) => Value::String(transform(&text)),
                other => other,
            })
        }
    })
}

/// Business resolvers keyed by field coordinate.
#[derive(Debug, Clone, Default)]
pub struct ResolverTable {
    resolvers: HashMap<FieldCoordinate, Resolver>,
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver, returning the one it replaces.
    pub fn insert(&mut self, coordinate: FieldCoordinate, resolver: Resolver) -> Option<Resolver> {
        self.resolvers.insert(coordinate, resolver)
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Resolver,
    ) -> Self {
        self.insert(FieldCoordinate::new(type_name, field_name), resolver);
        self
    }

    pub fn get(&self, coordinate: &FieldCoordinate) -> Option<&Resolver> {
        self.resolvers.get(coordinate)
    }

    /// Replace the resolver at `coordinate`, falling back to the default
    /// property resolver as the original when none is registered.
    pub fn replace<F>(&mut self, coordinate: &FieldCoordinate, wrap: F)
    where
        F: FnOnce(Resolver) -> Resolver,
    {
        let original = self
            .resolvers
            .remove(coordinate)
            .unwrap_or_else(|| Resolver::property(coordinate.field_name.as_str()));
        self.resolvers.insert(coordinate.clone(), wrap(original));
    }

    pub fn remove(&mut self, coordinate: &FieldCoordinate) -> Option<Resolver> {
        self.resolvers.remove(coordinate)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &FieldCoordinate> {
        self.resolvers.keys()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Drop entries whose coordinate is not a field of `graph`.
    pub fn retain_fields_of(&mut self, graph: &SchemaGraph) {
        self.resolvers.retain(|coordinate, _| {
            let keep = graph.field(coordinate).is_some();
            if !keep {
                debug!(field = %coordinate, "dropping resolver of filtered field");
            }
            keep
        });
    }
}

/// Wrap the resolvers of every transform-annotated field in `graph`.
///
/// Only fields present in `graph` are visited, so this must run on the
/// filtered schema. Multiple transforms on one field apply in annotation order.
pub fn decorate_schema(graph: &SchemaGraph, registry: &DirectiveRegistry, resolvers: &mut ResolverTable) {
    for ty in graph.types() {
        for field in &ty.fields {
            let transforms: Vec<(&str, TextTransform)> =
                registry.transforms(&field.annotations).collect();
            if transforms.is_empty() {
                continue;
            }

            let coordinate = FieldCoordinate::new(ty.name.as_str(), field.name.as_str());
            let named = field.ty.named_type();
            if named != "String" && named != "ID" {
                warn!(field = %coordinate, ty = %field.ty, "transform directive on a non-text field has no effect");
            }

            for (name, transform) in transforms {
                debug!(field = %coordinate, directive = name, "decorating resolver");
                resolvers.replace(&coordinate, |original| decorate(original, transform));
            }
        }
    }
}
