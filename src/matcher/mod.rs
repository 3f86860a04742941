//! Matchers decide whether a transform applies to the value at its root.

mod pattern;
mod schema;

pub use pattern::PatternMatcher;
pub use schema::Schema;

use crate::config::{Presence, SchemaOptions};
use crate::record::Value;
use std::fmt;
use std::sync::Arc;

/// Signature of a predicate matcher: `(value at root, whole record)`.
pub type PredicateFn = dyn Fn(Option<&Value>, &Value) -> MatchResult + Send + Sync;

/// How a transform decides whether it applies.
#[derive(Clone)]
pub enum Matcher {
    /// Caller-supplied function.
    Predicate(Arc<PredicateFn>),
    /// Declarative schema, validated with the given options.
    Schema(Schema, SchemaOptions),
}

impl Matcher {
    /// Wrap a predicate function.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> MatchResult + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    /// Match with a schema and default options.
    pub fn schema(schema: Schema) -> Self {
        Matcher::Schema(schema, SchemaOptions::default())
    }

    /// Match with a schema that rejects missing values.
    pub fn required(schema: Schema) -> Self {
        Matcher::Schema(
            schema,
            SchemaOptions {
                presence: Presence::Required,
                ..SchemaOptions::default()
            },
        )
    }

    /// Check the value found at a transform's root.
    pub fn matches(&self, value: Option<&Value>, record: &Value) -> MatchResult {
        match self {
            Matcher::Predicate(predicate) => predicate(value, record),
            Matcher::Schema(schema, options) => schema.validate(value, options),
        }
    }

    /// Get the matcher name for debugging.
    pub fn name(&self) -> &'static str {
        match self {
            Matcher::Predicate(_) => "predicate",
            Matcher::Schema(..) => "schema",
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
            Matcher::Schema(schema, options) => f
                .debug_tuple("Schema")
                .field(schema)
                .field(options)
                .finish(),
        }
    }
}

impl From<Schema> for Matcher {
    fn from(schema: Schema) -> Self {
        Matcher::schema(schema)
    }
}

/// Result of a match operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Whether the match succeeded
    pub matched: bool,
    /// Accepted value, possibly coerced or defaulted. `None` when the root is
    /// missing and that was acceptable.
    pub value: Option<Value>,
    /// Why the match failed
    pub reason: Option<String>,
}

impl MatchResult {
    /// Create a successful match result.
    pub fn matched(value: Option<Value>) -> Self {
        Self {
            matched: true,
            value,
            reason: None,
        }
    }

    /// Create a failed match result.
    pub fn not_matched(reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            value: None,
            reason: Some(reason.into()),
        }
    }
}

/// Errors that can occur during matcher compilation.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] glob::PatternError),
}
