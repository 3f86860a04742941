//! Unvalidated transform descriptors.

use super::{HandlerError, HandlerFn, Output, Transform};
use crate::context::TransformContext;
use crate::matcher::Matcher;
use crate::record::{Path, Root, Value, RECORD_ROOT};
use std::fmt;
use std::sync::Arc;

/// A transform as supplied by a caller, before validation.
///
/// Every field is optional here so that a missing `name`, `root`, `match`
/// or `handler` is reported as a [`SchemaError`] instead of a type error.
#[derive(Clone, Default)]
pub struct TransformDescriptor {
    name: Option<String>,
    description: String,
    root: Option<String>,
    consumes: Vec<String>,
    matcher: Option<Matcher>,
    handler: Option<Arc<HandlerFn>>,
    before: Vec<String>,
    after: Vec<String>,
    options: Value,
}

impl TransformDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Dotted root path; `$` selects the whole record.
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn whole_record(self) -> Self {
        self.root(RECORD_ROOT)
    }

    pub fn consumes(mut self, path: impl Into<String>) -> Self {
        self.consumes.push(path.into());
        self
    }

    pub fn matcher(mut self, matcher: impl Into<Matcher>) -> Self {
        self.matcher = Some(matcher.into());
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &TransformContext, &Value) -> Result<Output, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before.push(name.into());
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }

    pub fn options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Check the descriptor's shape and build an immutable [`Transform`].
    pub fn validate(&self) -> Result<Transform, SchemaError> {
        let name = match self.name.as_deref() {
            None => return Err(SchemaError::new(None, "name", "is required")),
            Some(name) if name.trim().is_empty() => {
                return Err(SchemaError::new(None, "name", "must not be empty"))
            }
            Some(name) => name,
        };
        let fail = |field, reason: String| SchemaError::new(Some(name), field, reason);

        let root = match self.root.as_deref() {
            None => return Err(fail("root", "is required".into())),
            Some(root) => {
                Root::parse(root).map_err(|e| fail("root", format!("is not a valid path: {e}")))?
            }
        };

        let matcher = self
            .matcher
            .clone()
            .ok_or_else(|| fail("match", "is required".into()))?;
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| fail("handler", "is required".into()))?;

        let mut consumes: Vec<Path> = Vec::with_capacity(self.consumes.len());
        for raw in &self.consumes {
            let path = match Root::parse(raw) {
                Ok(Root::Path(path)) => path,
                Ok(Root::Record) => {
                    return Err(fail("consumes", "must not include the whole record".into()))
                }
                Err(e) => return Err(fail("consumes", format!("is not a valid path: {e}"))),
            };
            if !consumes.contains(&path) {
                consumes.push(path);
            }
        }

        let before = names(&self.before, name).map_err(|reason| fail("before", reason))?;
        let after = names(&self.after, name).map_err(|reason| fail("after", reason))?;

        Ok(Transform {
            name: name.to_string(),
            description: self.description.clone(),
            root,
            consumes,
            matcher,
            handler,
            before,
            after,
            options: self.options.clone(),
        })
    }
}

/// Deduplicate a precedence list, rejecting blanks and self-references.
fn names(list: &[String], own: &str) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for name in list {
        if name.trim().is_empty() {
            return Err("must not contain empty names".into());
        }
        if name == own {
            return Err("must not reference the transform itself".into());
        }
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    Ok(out)
}

impl fmt::Debug for TransformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformDescriptor")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("consumes", &self.consumes)
            .field("matcher", &self.matcher)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// A descriptor is missing a required field or has one of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: \"{field}\" {reason}", .transform.as_deref().unwrap_or("transform"))]
pub struct SchemaError {
    /// Name of the offending transform, when it has one
    pub transform: Option<String>,
    /// Offending field
    pub field: &'static str,
    pub reason: String,
}

impl SchemaError {
    fn new(transform: Option<&str>, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            transform: transform.map(str::to_string),
            field,
            reason: reason.into(),
        }
    }
}
