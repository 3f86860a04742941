//! Execution context handed to transform handlers.

use crate::record::{get, Path, Value};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching variable expressions like ${...}
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Context available to handlers while a batch is transformed.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Scope (realm) the batch is being registered in
    pub scope: String,
    /// Correlation ID for the batch
    pub correlation_id: String,
    /// Free-form variables
    pub vars: HashMap<String, String>,
    /// Time the batch started
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new("root")
    }
}

impl TransformContext {
    /// Create a new context for a scope.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            correlation_id: String::new(),
            vars: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Resolve a variable expression.
    ///
    /// Supports:
    /// - `${scope}` - Scope name
    /// - `${correlation_id}` - Correlation ID
    /// - `${now}` - Batch timestamp (RFC 3339)
    /// - `${value}`, `${value.a.b}` - Matched value at the transform root
    /// - `${record.a.b}` - Any path in the record being transformed
    /// - `${vars.name}` or `${name}` - Context variable
    pub fn resolve(&self, expr: &str, value: Option<&Value>, record: &Value) -> Option<String> {
        let (head, rest) = match expr.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (expr, None),
        };

        match head {
            "scope" => Some(self.scope.clone()),
            "correlation_id" => Some(self.correlation_id.clone()),
            "now" => Some(self.timestamp.to_rfc3339()),
            "value" => render(lookup(value?, rest)?),
            "record" => render(lookup(record, rest)?),
            "vars" => self.vars.get(rest?).cloned(),
            _ => self.vars.get(expr).cloned(),
        }
    }

    /// Interpolate all ${...} variables in a string.
    pub fn interpolate(&self, template: &str, value: Option<&Value>, record: &Value) -> String {
        VAR_REGEX
            .replace_all(template, |caps: &regex::Captures| {
                let var_name = &caps[1];
                self.resolve(var_name, value, record).unwrap_or_default()
            })
            .to_string()
    }
}

fn lookup<'a>(value: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    match path {
        None => Some(value),
        Some(path) => get(value, &Path::parse(path).ok()?),
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Handle(_) => None,
        other => Some(other.to_string()),
    }
}
