//! Declarative schema matching.

use super::{MatchResult, MatcherError, PatternMatcher};
use crate::config::{MatchConfig, Presence, SchemaKind, SchemaOptions};
use crate::record::Value;

/// Compiled schema for the value at a transform's root.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    kind: SchemaKind,
    valid: Option<Vec<Value>>,
    pattern: Option<PatternMatcher>,
    default: Option<Value>,
    single: bool,
}

impl Schema {
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn array() -> Self {
        Self::of(SchemaKind::Array)
    }

    pub fn object() -> Self {
        Self::of(SchemaKind::Object)
    }

    /// Only accept the listed values.
    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.valid = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Require string values to match a pattern.
    pub fn pattern(mut self, pattern: PatternMatcher) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Value to accept in place of a missing one.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Array schemas also accept a lone item, wrapped into an array.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Compile a schema from configuration.
    pub fn compile(config: &MatchConfig) -> Result<Self, MatcherError> {
        let pattern = config
            .pattern
            .as_ref()
            .map(PatternMatcher::compile)
            .transpose()?;

        Ok(Self {
            kind: config.kind,
            valid: config.valid.clone(),
            pattern,
            default: config.default.clone(),
            single: config.single,
        })
    }

    /// Validate the value found at a root.
    pub fn validate(&self, value: Option<&Value>, options: &SchemaOptions) -> MatchResult {
        let value = match value {
            Some(value) => value.clone(),
            None => {
                return match (&self.default, options.presence) {
                    (Some(default), _) => MatchResult::matched(Some(default.clone())),
                    (None, Presence::Required) => MatchResult::not_matched("value is required"),
                    (None, Presence::Optional) => MatchResult::matched(None),
                };
            }
        };

        let value = if options.convert {
            self.coerce(value)
        } else {
            value
        };

        if !self.kind_accepts(&value) {
            return MatchResult::not_matched(format!(
                "value must be of type {}, found {}",
                self.kind.as_str(),
                value.kind()
            ));
        }

        if let Some(ref valid) = self.valid {
            if !valid.contains(&value) {
                return MatchResult::not_matched(format!(
                    "value {} must be one of {}",
                    value,
                    Value::from(valid.clone())
                ));
            }
        }

        if let Some(ref pattern) = self.pattern {
            if !value.as_str().is_some_and(|s| pattern.is_match(s)) {
                return MatchResult::not_matched(format!(
                    "value {} does not match pattern '{}'",
                    value,
                    pattern.as_str()
                ));
            }
        }

        MatchResult::matched(Some(value))
    }

    fn kind_accepts(&self, value: &Value) -> bool {
        match self.kind {
            SchemaKind::Any => true,
            SchemaKind::String => matches!(value, Value::String(_)),
            SchemaKind::Number => matches!(value, Value::Number(_)),
            SchemaKind::Boolean => matches!(value, Value::Bool(_)),
            SchemaKind::Array => matches!(value, Value::Array(_)),
            SchemaKind::Object => matches!(value, Value::Object(_)),
        }
    }

    fn coerce(&self, value: Value) -> Value {
        match (self.kind, value) {
            (SchemaKind::Number, Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    Value::from(n)
                } else if let Some(n) = s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    Value::Number(n)
                } else {
                    Value::String(s)
                }
            }
            (SchemaKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (SchemaKind::Array, value) if self.single && !matches!(value, Value::Array(_)) => {
                Value::from(vec![value])
            }
            (_, value) => value,
        }
    }
}
