//! Realms: named scopes that own a registry and hand finished routes to a sink.

use crate::config::{ConfigError, TransformConfig};
use crate::context::TransformContext;
use crate::engine::EngineError;
use crate::record::Value;
use crate::registry::{Composition, RegistryError, TransformRegistry};
use crate::transform::TransformDescriptor;
use std::borrow::Cow;
use tracing::{debug, info};

/// Consumer of a transformed route batch.
pub trait RouteSink {
    /// Accept the final route definitions.
    fn route(&mut self, routes: Vec<Value>);
}

impl RouteSink for Vec<Value> {
    fn route(&mut self, routes: Vec<Value>) {
        self.extend(routes);
    }
}

/// A named scope with its own transforms.
///
/// The root realm's transforms apply to every realm beneath it. A child
/// realm layers its own transforms on top.
#[derive(Debug)]
pub struct Realm<'p> {
    name: String,
    registry: TransformRegistry,
    parent: Option<&'p Realm<'p>>,
}

impl Realm<'static> {
    /// Create a root realm.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: TransformRegistry::new(),
            parent: None,
        }
    }

    /// Create a root realm holding every enabled rule of a configuration.
    pub fn from_config(config: &TransformConfig) -> Result<Self, ConfigError> {
        let registry = config.registry()?;
        info!(
            realm = %config.settings.scope,
            transforms = registry.len(),
            "Realm initialized"
        );
        Ok(Self {
            name: config.settings.scope.clone(),
            registry,
            parent: None,
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_config(&TransformConfig::from_yaml(yaml)?)
    }

    /// Create from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_config(&TransformConfig::from_json(json)?)
    }
}

impl<'p> Realm<'p> {
    /// Create a child realm beneath this one.
    pub fn child(&'p self, name: impl Into<String>) -> Realm<'p> {
        Realm {
            name: name.into(),
            registry: TransformRegistry::new(),
            parent: Some(self),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    fn root_realm(&self) -> &Realm<'p> {
        let mut realm = self;
        while let Some(parent) = realm.parent {
            realm = parent;
        }
        realm
    }

    /// Register transforms in this realm.
    pub fn route_transforms<I>(&mut self, descriptors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = TransformDescriptor>,
    {
        let before = self.registry.len();
        self.registry.add_all(descriptors)?;
        debug!(
            realm = %self.name,
            added = self.registry.len() - before,
            total = self.registry.len(),
            "Registered route transforms"
        );
        Ok(())
    }

    /// The ordered transforms a batch routed from this realm would run.
    pub fn transforms_for(
        &self,
        extra: Vec<TransformDescriptor>,
        only_specified: bool,
    ) -> Result<Cow<'_, TransformRegistry>, RegistryError> {
        let root = self.root_realm();
        Composition {
            parent: Some(&root.registry),
            local: (!self.is_root()).then_some(&self.registry),
            extra,
            only_specified,
        }
        .compose()
    }

    /// Transform a batch of routes and hand the result to `sink`.
    ///
    /// Returns the number of routes handed over.
    pub fn routes<S>(
        &self,
        routes: Vec<Value>,
        extra: Vec<TransformDescriptor>,
        only_specified: bool,
        ctx: &TransformContext,
        sink: &mut S,
    ) -> Result<usize, RealmError>
    where
        S: RouteSink + ?Sized,
    {
        let registry = self.transforms_for(extra, only_specified)?;
        let input = routes.len();
        let routes = registry.apply(routes, ctx)?;
        let output = routes.len();

        info!(
            realm = %self.name,
            transforms = registry.len(),
            input,
            output,
            "Routes transformed"
        );
        sink.route(routes);
        Ok(output)
    }
}

/// Errors from routing a batch through a realm.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
