//! Transform registry: conflict-free, precedence-ordered transforms.

mod compose;
mod conflict;
mod order;

pub use compose::Composition;
pub use conflict::{check_conflicts, ConflictError, ConflictKind};

use crate::context::TransformContext;
use crate::engine::{EngineError, TransformEngine};
use crate::record::Value;
use crate::transform::{SchemaError, Transform, TransformDescriptor};
use order::PrecedenceGraph;
use std::sync::Arc;
use tracing::{debug, trace};

/// Errors that abort registration. The registry is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("{0} is already registered")]
    Duplicate(String),

    #[error("{transform} creates a precedence cycle among {}", .cycle.join(", "))]
    Cycle {
        transform: String,
        cycle: Vec<String>,
    },
}

/// An ordered, acyclic collection of transforms.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    /// Insertion order
    transforms: Vec<Arc<Transform>>,
    /// Execution order, as indices into `transforms`
    graph: PrecedenceGraph,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a descriptor and insert the resulting transform.
    pub fn add(&mut self, descriptor: TransformDescriptor) -> Result<Arc<Transform>, RegistryError> {
        let transform = Arc::new(descriptor.validate()?);
        self.insert(Arc::clone(&transform))?;
        Ok(transform)
    }

    /// Add descriptors one at a time. Stops at the first failure; transforms
    /// added before it stay registered.
    pub fn add_all<I>(&mut self, descriptors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = TransformDescriptor>,
    {
        for descriptor in descriptors {
            self.add(descriptor)?;
        }
        Ok(())
    }

    /// Insert an already validated transform.
    pub fn insert(&mut self, transform: Arc<Transform>) -> Result<(), RegistryError> {
        let name = transform.name();
        if self.get(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        check_conflicts(&transform, &self.transforms)?;

        self.graph
            .insert(name, transform.before(), transform.after())
            .map_err(|cycle| RegistryError::Cycle {
                transform: name.to_string(),
                cycle,
            })?;

        debug!(
            transform = name,
            root = %transform.root(),
            position = ?self.graph.order().iter().position(|&i| i == self.transforms.len()),
            "Registered transform"
        );

        self.transforms.push(transform);

        trace!(order = ?self.names(), "Transform order updated");
        Ok(())
    }

    /// Combine registries into a fresh one, re-validating every transform.
    pub fn merge(registries: &[&TransformRegistry]) -> Result<Self, RegistryError> {
        let mut merged = Self::new();
        for registry in registries {
            for transform in registry.iter() {
                merged.insert(Arc::clone(transform))?;
            }
        }
        Ok(merged)
    }

    /// Transforms in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Transform>> + '_ {
        self.graph.order().iter().map(|&i| &self.transforms[i])
    }

    /// Transforms in execution order.
    pub fn transforms(&self) -> Vec<Arc<Transform>> {
        self.iter().cloned().collect()
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Transform>> {
        self.transforms.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Engine for the current order.
    pub fn engine(&self) -> TransformEngine {
        TransformEngine::new(self.transforms())
    }

    /// Apply the registered transforms to a batch of records.
    pub fn apply(
        &self,
        records: Vec<Value>,
        ctx: &TransformContext,
    ) -> Result<Vec<Value>, EngineError> {
        self.engine().apply(records, ctx)
    }
}
