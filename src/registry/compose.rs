//! Combining inherited, local and ad hoc transforms into one order.

use super::{RegistryError, TransformRegistry};
use crate::transform::TransformDescriptor;
use std::borrow::Cow;
use tracing::debug;

/// A request to combine registries for one batch of records.
#[derive(Debug, Default)]
pub struct Composition<'a> {
    /// Transforms inherited from the root scope
    pub parent: Option<&'a TransformRegistry>,
    /// Transforms registered by the calling scope
    pub local: Option<&'a TransformRegistry>,
    /// Transforms supplied with the batch
    pub extra: Vec<TransformDescriptor>,
    /// Ignore `parent` and `local` entirely
    pub only_specified: bool,
}

impl<'a> Composition<'a> {
    /// Produce the ordered registry for this composition.
    ///
    /// When a single upstream registry is the only source, it is reused
    /// as-is without re-validating its transforms.
    pub fn compose(self) -> Result<Cow<'a, TransformRegistry>, RegistryError> {
        if self.only_specified {
            debug!(extra = self.extra.len(), "Composing specified transforms only");
            let mut registry = TransformRegistry::new();
            registry.add_all(self.extra)?;
            return Ok(Cow::Owned(registry));
        }

        let parent = self.parent.filter(|r| !r.is_empty());
        let local = self.local.filter(|r| !r.is_empty());

        match (parent, local, self.extra.is_empty()) {
            (Some(parent), None, true) => Ok(Cow::Borrowed(parent)),
            (None, Some(local), true) => Ok(Cow::Borrowed(local)),
            (parent, local, _) => {
                debug!(
                    parent = parent.map_or(0, TransformRegistry::len),
                    local = local.map_or(0, TransformRegistry::len),
                    extra = self.extra.len(),
                    "Merging transforms"
                );
                let sources: Vec<&TransformRegistry> = parent.into_iter().chain(local).collect();
                let mut registry = TransformRegistry::merge(&sources)?;
                registry.add_all(self.extra)?;
                Ok(Cow::Owned(registry))
            }
        }
    }
}
