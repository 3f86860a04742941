//! Configuration types for declarative route transforms.

use crate::context::TransformContext;
use crate::matcher::{Matcher, MatcherError, Schema};
use crate::record::Value;
use crate::registry::{RegistryError, TransformRegistry};
use crate::transform::{BuiltinError, BuiltinHandler, TransformDescriptor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Main configuration: settings plus a list of transform rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Configuration version
    pub version: String,
    /// Global settings
    pub settings: Settings,
    /// Transform rules, in registration order
    pub transforms: Vec<TransformRule>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            settings: Settings::default(),
            transforms: vec![],
        }
    }
}

impl TransformConfig {
    /// Compile every enabled rule into a descriptor, in file order.
    pub fn descriptors(&self) -> Result<Vec<TransformDescriptor>, ConfigError> {
        self.transforms
            .iter()
            .filter(|rule| rule.enabled)
            .map(TransformRule::descriptor)
            .collect()
    }

    /// Build a registry holding every enabled rule.
    pub fn registry(&self) -> Result<TransformRegistry, ConfigError> {
        let mut registry = TransformRegistry::new();
        registry.add_all(self.descriptors()?)?;
        Ok(registry)
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scope (realm) name reported to handlers
    pub scope: String,
    /// Correlation ID for the batch
    pub correlation_id: String,
    /// Variables available to `${...}` interpolation
    pub vars: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scope: "root".to_string(),
            correlation_id: String::new(),
            vars: HashMap::new(),
        }
    }
}

impl Settings {
    /// Build the execution context these settings describe.
    pub fn context(&self) -> TransformContext {
        TransformContext::new(self.scope.clone())
            .with_correlation_id(self.correlation_id.clone())
            .with_vars(self.vars.clone())
    }
}

/// A declarative transform rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRule {
    /// Unique transform name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: String,
    /// Whether the rule is registered at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Dotted root path, or `$` for the whole record
    #[serde(default)]
    pub root: Option<String>,
    /// Paths read by the handler and removed from the record
    #[serde(default, deserialize_with = "one_or_many")]
    pub consumes: Vec<String>,
    /// Transforms this one must run earlier than
    #[serde(default, deserialize_with = "one_or_many")]
    pub before: Vec<String>,
    /// Transforms this one must run later than
    #[serde(default, deserialize_with = "one_or_many")]
    pub after: Vec<String>,
    /// Schema for the value at the root
    #[serde(rename = "match", default)]
    pub matcher: MatchConfig,
    /// Built-in handler
    #[serde(default)]
    pub handler: HandlerConfig,
    /// Opaque options forwarded to the handler
    #[serde(default)]
    pub options: Value,
}

impl TransformRule {
    /// Compile this rule into an unvalidated descriptor.
    pub fn descriptor(&self) -> Result<TransformDescriptor, ConfigError> {
        let schema = Schema::compile(&self.matcher)?;
        let handler = BuiltinHandler::compile(&self.handler)?;

        let mut descriptor = TransformDescriptor::new(self.name.clone())
            .description(self.description.clone())
            .matcher(Matcher::Schema(schema, self.matcher.options()))
            .options(self.options.clone())
            .handler(move |value, record, ctx, _| Ok(handler.handle(value, record, ctx)?));

        if let Some(ref root) = self.root {
            descriptor = descriptor.root(root.clone());
        }
        for path in &self.consumes {
            descriptor = descriptor.consumes(path.clone());
        }
        for name in &self.before {
            descriptor = descriptor.before(name.clone());
        }
        for name in &self.after {
            descriptor = descriptor.after(name.clone());
        }

        Ok(descriptor)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

/// Schema configuration for the value at a transform's root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Expected value type
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    /// Allowed values
    pub valid: Option<Vec<Value>>,
    /// Pattern string values must match
    pub pattern: Option<PatternConfig>,
    /// Value used when the root is missing
    pub default: Option<Value>,
    /// Array schemas accept a lone item
    pub single: bool,
    /// Whether a missing value fails the match
    pub presence: Presence,
    /// Coerce strings into numbers/booleans
    pub convert: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            kind: SchemaKind::Any,
            valid: None,
            pattern: None,
            default: None,
            single: false,
            presence: Presence::Optional,
            convert: true,
        }
    }
}

impl MatchConfig {
    /// Validation options carried alongside the compiled schema.
    pub fn options(&self) -> SchemaOptions {
        SchemaOptions {
            presence: self.presence,
            convert: self.convert,
        }
    }
}

/// Value type a schema accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    #[default]
    Any,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Any => "any",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }
}

/// Whether a missing value is acceptable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Optional,
    Required,
}

/// Options applied when validating a value against a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    pub presence: Presence,
    pub convert: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            presence: Presence::Optional,
            convert: true,
        }
    }
}

/// String pattern configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// The pattern to match
    pub pattern: String,
    /// Match type: exact, glob, regex
    #[serde(default = "default_pattern_type", rename = "type")]
    pub pattern_type: PatternType,
}

/// Pattern matching type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Exact string match
    Exact,
    /// Glob pattern (*, ?)
    Glob,
    /// Regular expression
    #[default]
    Regex,
}

fn default_pattern_type() -> PatternType {
    PatternType::Regex
}

/// Built-in handler configuration. At most one operation may be set; none
/// means `identity`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HandlerConfig {
    /// Replace the value with a literal (strings are interpolated)
    pub set: Option<serde_json::Value>,
    /// Append to a string value
    pub append: Option<String>,
    /// Prepend to a string value
    pub prepend: Option<String>,
    /// Fan out one record per array item
    pub spread: bool,
    /// Wrap the value in an object under a key
    pub wrap: Option<WrapConfig>,
    /// Merge fields into an object value
    pub merge: Option<MergeConfig>,
    /// Replace the value with the one found at another path
    pub take: Option<TakeConfig>,
    /// Return the matched value unchanged
    pub identity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapConfig {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    pub with: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeConfig {
    pub from: String,
}

/// Errors raised while loading or compiling configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to compile matcher: {0}")]
    Matcher(#[from] MatcherError),

    #[error("Invalid handler: {0}")]
    Handler(#[from] BuiltinError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TransformConfig {
    /// Parse a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransformConfig::default();
        assert_eq!(config.version, "1");
        assert!(config.transforms.is_empty());
        assert_eq!(config.settings.scope, "root");
    }

    #[test]
    fn test_config_parsing() {
        let yaml = r#"
version: "1"
settings:
  scope: "api"
  vars:
    version: "2"
transforms:
  - name: "get-to-post"
    root: "method"
    match:
      valid: ["get"]
    handler:
      set: "post"
  - name: "prefix"
    root: "path"
    after: "get-to-post"
    match:
      type: string
      pattern:
        pattern: "/users*"
        type: glob
    handler:
      prepend: "/v${version}"
"#;
        let config = TransformConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.transforms.len(), 2);
        assert_eq!(config.settings.scope, "api");

        let prefix = &config.transforms[1];
        assert_eq!(prefix.after, vec!["get-to-post".to_string()]);
        assert!(prefix.before.is_empty());
        assert!(prefix.enabled);
        assert_eq!(prefix.matcher.kind, SchemaKind::String);
        assert_eq!(
            prefix.matcher.pattern.as_ref().map(|p| &p.pattern_type),
            Some(&PatternType::Glob)
        );
        assert_eq!(prefix.handler.prepend.as_deref(), Some("/v${version}"));
    }

    #[test]
    fn test_match_defaults() {
        let json = r#"{"transforms": [{"name": "a", "root": "x", "match": {"type": "array", "single": true}}]}"#;
        let config = TransformConfig::from_json(json).unwrap();
        let matcher = &config.transforms[0].matcher;
        assert_eq!(matcher.kind, SchemaKind::Array);
        assert!(matcher.single);
        assert_eq!(matcher.options(), SchemaOptions::default());
    }

    #[test]
    fn test_handler_parsing() {
        let json = r#"{
            "transforms": [
                {"name": "a", "root": "x", "handler": {"wrap": {"key": "data"}}},
                {"name": "b", "root": "y", "handler": {"merge": {"with": {"cors": true}}}},
                {"name": "c", "root": "z", "consumes": "old", "handler": {"take": {"from": "old"}}},
                {"name": "d", "root": "w", "handler": {"spread": true}}
            ]
        }"#;
        let config = TransformConfig::from_json(json).unwrap();
        assert_eq!(config.transforms.len(), 4);
        assert_eq!(config.transforms[0].handler.wrap.as_ref().unwrap().key, "data");
        assert_eq!(config.transforms[2].consumes, vec!["old".to_string()]);
        assert!(config.transforms[3].handler.spread);
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let yaml = r#"
transforms:
  - name: "off"
    enabled: false
    root: "method"
  - name: "on"
    root: "path"
"#;
        let config = TransformConfig::from_yaml(yaml).unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["on"]);
    }

    #[test]
    fn test_settings_context() {
        let mut settings = Settings::default();
        settings.correlation_id = "batch-1".to_string();
        settings.vars.insert("env".to_string(), "prod".to_string());

        let ctx = settings.context();
        assert_eq!(ctx.scope, "root");
        assert_eq!(ctx.correlation_id, "batch-1");
        assert_eq!(ctx.vars.get("env").map(String::as_str), Some("prod"));
    }
}
