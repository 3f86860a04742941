//! Transforms: named, validated rewrite rules for one path of a record.

mod builtin;
mod descriptor;

pub use builtin::{BuiltinError, BuiltinHandler};
pub use descriptor::{SchemaError, TransformDescriptor};

use crate::context::TransformContext;
use crate::matcher::{MatchResult, Matcher};
use crate::record::{get_root, Path, Root, Value};
use std::fmt;
use std::sync::Arc;

/// Error a handler may fail with. Passed through to the caller untouched.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Signature of a transform handler:
/// `(matched value, whole record, context, transform options)`.
pub type HandlerFn =
    dyn Fn(Option<&Value>, &Value, &TransformContext, &Value) -> Result<Output, HandlerError>
        + Send
        + Sync;

/// What a handler produces for one matched record.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A single replacement.
    One(Value),
    /// Fan-out: one record per replacement. Empty drops the record.
    Many(Vec<Value>),
}

impl Output {
    pub fn one(value: impl Into<Value>) -> Self {
        Output::One(value.into())
    }

    pub fn many<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Output::Many(values.into_iter().map(Into::into).collect())
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Output::One(value) => vec![value],
            Output::Many(values) => values,
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::One(value)
    }
}

/// A validated transform. Immutable once built; shared between registries
/// and engines as `Arc<Transform>`.
pub struct Transform {
    name: String,
    description: String,
    root: Root,
    consumes: Vec<Path>,
    matcher: Matcher,
    handler: Arc<HandlerFn>,
    before: Vec<String>,
    after: Vec<String>,
    options: Value,
}

impl Transform {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn consumes(&self) -> &[Path] {
        &self.consumes
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Names this transform must run earlier than.
    pub fn before(&self) -> &[String] {
        &self.before
    }

    /// Names this transform must run later than.
    pub fn after(&self) -> &[String] {
        &self.after
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Every location the transform touches: its root, then its consumes.
    pub fn touched(&self) -> impl Iterator<Item = (Root, bool)> + '_ {
        std::iter::once((self.root.clone(), false)).chain(
            self.consumes
                .iter()
                .map(|path| (Root::Path(path.clone()), true)),
        )
    }

    /// True when either transform names the other in `before` or `after`.
    pub fn is_ordered_with(&self, other: &Transform) -> bool {
        let names = |list: &[String], name: &str| list.iter().any(|n| n == name);
        names(&self.before, &other.name)
            || names(&self.after, &other.name)
            || names(&other.before, &self.name)
            || names(&other.after, &self.name)
    }

    /// Run the matcher against the value at this transform's root.
    pub fn matches(&self, record: &Value) -> MatchResult {
        self.matcher.matches(get_root(record, &self.root), record)
    }

    /// Invoke the handler with this transform's options.
    pub fn handle(
        &self,
        value: Option<&Value>,
        record: &Value,
        ctx: &TransformContext,
    ) -> Result<Output, HandlerError> {
        (self.handler)(value, record, ctx, &self.options)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("consumes", &self.consumes)
            .field("matcher", &self.matcher)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
