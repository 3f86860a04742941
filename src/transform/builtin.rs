//! Built-in handlers for declarative transforms.

use super::Output;
use crate::config::HandlerConfig;
use crate::context::TransformContext;
use crate::record::{get, Map, Path, PathError, Value};
use serde_json::Value as JsonValue;

/// Compiled built-in handler.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinHandler {
    /// Return the matched value unchanged
    Identity,
    /// Replace with a literal; strings are interpolated
    Set(JsonValue),
    /// Append an interpolated suffix to a string
    Append(String),
    /// Prepend an interpolated prefix to a string
    Prepend(String),
    /// One output per array item
    Spread,
    /// `{key: value}`
    Wrap(String),
    /// Merge interpolated fields into an object
    Merge(serde_json::Map<String, JsonValue>),
    /// Value found at another path of the original record
    Take(Path),
}

impl BuiltinHandler {
    /// Compile a handler from configuration.
    pub fn compile(config: &HandlerConfig) -> Result<Self, BuiltinError> {
        let mut ops = Vec::new();

        if let Some(ref value) = config.set {
            ops.push(("set", Self::Set(value.clone())));
        }
        if let Some(ref suffix) = config.append {
            ops.push(("append", Self::Append(suffix.clone())));
        }
        if let Some(ref prefix) = config.prepend {
            ops.push(("prepend", Self::Prepend(prefix.clone())));
        }
        if config.spread {
            ops.push(("spread", Self::Spread));
        }
        if let Some(ref wrap) = config.wrap {
            ops.push(("wrap", Self::Wrap(wrap.key.clone())));
        }
        if let Some(ref merge) = config.merge {
            match merge.with {
                JsonValue::Object(ref fields) => ops.push(("merge", Self::Merge(fields.clone()))),
                _ => return Err(BuiltinError::MergeNotObject),
            }
        }
        if let Some(ref take) = config.take {
            ops.push(("take", Self::Take(Path::parse(&take.from)?)));
        }
        if config.identity {
            ops.push(("identity", Self::Identity));
        }

        match ops.len() {
            0 => Ok(Self::Identity),
            1 => Ok(ops.remove(0).1),
            _ => Err(BuiltinError::MultipleOperations(
                ops.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", "),
            )),
        }
    }

    /// Operation name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Set(_) => "set",
            Self::Append(_) => "append",
            Self::Prepend(_) => "prepend",
            Self::Spread => "spread",
            Self::Wrap(_) => "wrap",
            Self::Merge(_) => "merge",
            Self::Take(_) => "take",
        }
    }

    /// Run the handler against a matched value.
    pub fn handle(
        &self,
        value: Option<&Value>,
        record: &Value,
        ctx: &TransformContext,
    ) -> Result<Output, BuiltinError> {
        let output = match self {
            Self::Identity => Output::One(value.cloned().unwrap_or_default()),
            Self::Set(literal) => {
                Output::One(Value::from(interpolate_json_value(literal, value, record, ctx)))
            }
            Self::Append(suffix) => {
                let current = self.string(value)?;
                Output::one(format!("{}{}", current, ctx.interpolate(suffix, value, record)))
            }
            Self::Prepend(prefix) => {
                let current = self.string(value)?;
                Output::one(format!("{}{}", ctx.interpolate(prefix, value, record), current))
            }
            Self::Spread => match value {
                Some(Value::Array(items)) => Output::Many(items.to_vec()),
                Some(other) => Output::One(other.clone()),
                None => return Err(BuiltinError::Missing(self.name())),
            },
            Self::Wrap(key) => Output::One(Value::from_entries([(
                key.clone(),
                value.cloned().unwrap_or_default(),
            )])),
            Self::Merge(fields) => {
                let mut target: Map = match value {
                    None => Map::new(),
                    Some(Value::Object(map)) => (**map).clone(),
                    Some(other) => {
                        return Err(BuiltinError::NotAnObject {
                            op: self.name(),
                            found: other.kind(),
                        })
                    }
                };
                for (key, field) in fields {
                    target.insert(
                        key.clone(),
                        Value::from(interpolate_json_value(field, value, record, ctx)),
                    );
                }
                Output::One(Value::from(target))
            }
            Self::Take(from) => Output::One(
                get(record, from)
                    .or(value)
                    .cloned()
                    .unwrap_or_default(),
            ),
        };
        Ok(output)
    }

    fn string<'a>(&self, value: Option<&'a Value>) -> Result<&'a str, BuiltinError> {
        match value {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(BuiltinError::NotAString {
                op: self.name(),
                found: other.kind(),
            }),
            None => Err(BuiltinError::Missing(self.name())),
        }
    }
}

/// Interpolate variables in JSON string values.
fn interpolate_json_value(
    literal: &JsonValue,
    value: Option<&Value>,
    record: &Value,
    ctx: &TransformContext,
) -> JsonValue {
    match literal {
        JsonValue::String(s) => JsonValue::String(ctx.interpolate(s, value, record)),
        JsonValue::Array(arr) => JsonValue::Array(
            arr.iter()
                .map(|v| interpolate_json_value(v, value, record, ctx))
                .collect(),
        ),
        JsonValue::Object(obj) => {
            let mut new_obj = serde_json::Map::new();
            for (k, v) in obj {
                new_obj.insert(k.clone(), interpolate_json_value(v, value, record, ctx));
            }
            JsonValue::Object(new_obj)
        }
        other => other.clone(),
    }
}

/// Errors from compiling or running a built-in handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuiltinError {
    #[error("handler declares more than one operation: {0}")]
    MultipleOperations(String),

    #[error("merge requires an object in \"with\"")]
    MergeNotObject,

    #[error("invalid take path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("{op} requires a string value, found {found}")]
    NotAString { op: &'static str, found: &'static str },

    #[error("{op} requires an object value, found {found}")]
    NotAnObject { op: &'static str, found: &'static str },

    #[error("{0} requires a value")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MergeConfig, TakeConfig, WrapConfig};
    use serde_json::json;

    fn make_context() -> TransformContext {
        TransformContext::new("api").with_var("version", "2")
    }

    fn compile(config: HandlerConfig) -> BuiltinHandler {
        BuiltinHandler::compile(&config).unwrap()
    }

    #[test]
    fn test_empty_config_is_identity() {
        let handler = compile(HandlerConfig::default());
        assert_eq!(handler, BuiltinHandler::Identity);

        let record = Value::object();
        let out = handler
            .handle(Some(&Value::from("get")), &record, &make_context())
            .unwrap();
        assert_eq!(out, Output::one("get"));
    }

    #[test]
    fn test_multiple_operations_rejected() {
        let config = HandlerConfig {
            set: Some(json!("post")),
            spread: true,
            ..HandlerConfig::default()
        };
        assert_eq!(
            BuiltinHandler::compile(&config),
            Err(BuiltinError::MultipleOperations("set, spread".to_string()))
        );
    }

    #[test]
    fn test_set_interpolates() {
        let handler = compile(HandlerConfig {
            set: Some(json!({"tag": "${scope}-${record.method}", "weight": 3})),
            ..HandlerConfig::default()
        });
        let record = Value::from(json!({"method": "get"}));
        let out = handler.handle(None, &record, &make_context()).unwrap();
        assert_eq!(out, Output::One(Value::from(json!({"tag": "api-get", "weight": 3}))));
    }

    #[test]
    fn test_append_and_prepend() {
        let record = Value::object();
        let path = Value::from("/users");

        let prepend = compile(HandlerConfig {
            prepend: Some("/v${version}".to_string()),
            ..HandlerConfig::default()
        });
        let out = prepend.handle(Some(&path), &record, &make_context()).unwrap();
        assert_eq!(out, Output::one("/v2/users"));

        let append = compile(HandlerConfig {
            append: Some("/{id}".to_string()),
            ..HandlerConfig::default()
        });
        let out = append.handle(Some(&path), &record, &make_context()).unwrap();
        assert_eq!(out, Output::one("/users/{id}"));

        let err = append
            .handle(Some(&Value::from(3i64)), &record, &make_context())
            .unwrap_err();
        assert_eq!(err.to_string(), "append requires a string value, found number");
    }

    #[test]
    fn test_spread() {
        let handler = compile(HandlerConfig {
            spread: true,
            ..HandlerConfig::default()
        });
        let record = Value::object();
        let paths = Value::from(json!(["/one", "/two"]));
        let out = handler.handle(Some(&paths), &record, &make_context()).unwrap();
        assert_eq!(out, Output::many(["/one", "/two"]));

        let out = handler
            .handle(Some(&Value::from("/one")), &record, &make_context())
            .unwrap();
        assert_eq!(out, Output::one("/one"));
        assert_eq!(
            handler.handle(None, &record, &make_context()),
            Err(BuiltinError::Missing("spread"))
        );
    }

    #[test]
    fn test_wrap_and_merge() {
        let record = Value::object();
        let wrap = compile(HandlerConfig {
            wrap: Some(WrapConfig {
                key: "scope".to_string(),
            }),
            ..HandlerConfig::default()
        });
        let out = wrap
            .handle(Some(&Value::from("admin")), &record, &make_context())
            .unwrap();
        assert_eq!(out, Output::One(Value::from(json!({"scope": "admin"}))));

        let merge = compile(HandlerConfig {
            merge: Some(MergeConfig {
                with: json!({"cors": true, "realm": "${scope}"}),
            }),
            ..HandlerConfig::default()
        });
        let current = Value::from(json!({"cors": false, "auth": "basic"}));
        let out = merge.handle(Some(&current), &record, &make_context()).unwrap();
        assert_eq!(
            out,
            Output::One(Value::from(json!({"cors": true, "auth": "basic", "realm": "api"})))
        );

        let bad = MergeConfig { with: json!("x") };
        assert_eq!(
            BuiltinHandler::compile(&HandlerConfig {
                merge: Some(bad),
                ..HandlerConfig::default()
            }),
            Err(BuiltinError::MergeNotObject)
        );
    }

    #[test]
    fn test_take_reads_original_record() {
        let handler = compile(HandlerConfig {
            take: Some(TakeConfig {
                from: "config.auth".to_string(),
            }),
            ..HandlerConfig::default()
        });
        let record = Value::from(json!({"config": {"auth": "session"}}));
        let out = handler.handle(None, &record, &make_context()).unwrap();
        assert_eq!(out, Output::one("session"));
    }
}
