//! Ordered, conflict-checked transforms for route definitions.
//!
//! Transforms are registered independently (by different plugins or
//! subsystems) and combined into one deterministic order:
//!
//! - each transform reads and rewrites one dotted path of a record, or the
//!   whole record
//! - transforms touching overlapping paths must declare `before`/`after`
//!   precedence, otherwise registration fails
//! - the engine folds the ordered transforms over a batch of records; one
//!   record may become zero, one or many
//! - records are copied only along the path being written, so unrelated
//!   route metadata is shared with the input
//!
//! ## Configuration Example
//!
//! ```yaml
//! transforms:
//!   - name: "get-to-post"
//!     root: "method"
//!     match: { valid: ["get"] }
//!     handler: { set: "post" }
//!   - name: "multi-path"
//!     root: "path"
//!     match: { type: array }
//!     handler: { spread: true }
//! ```
//!
//! ## Programmatic Example
//!
//! ```
//! use serde_json::json;
//! use zentinel_route_transforms::{
//!     Output, Schema, TransformContext, TransformDescriptor, TransformRegistry, Value,
//! };
//!
//! let mut registry = TransformRegistry::new();
//! registry
//!     .add(
//!         TransformDescriptor::new("get-to-post")
//!             .root("method")
//!             .matcher(Schema::any().valid(["get"]))
//!             .handler(|_, _, _, _| Ok(Output::one("post"))),
//!     )
//!     .unwrap();
//!
//! let routes = vec![Value::from(json!({"method": "get", "path": "/"}))];
//! let routes = registry.apply(routes, &TransformContext::default()).unwrap();
//! assert_eq!(routes[0].get("method"), Some(&Value::from("post")));
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod matcher;
pub mod realm;
pub mod record;
pub mod registry;
pub mod transform;

pub use config::{ConfigError, TransformConfig};
pub use context::TransformContext;
pub use engine::{EngineError, TransformEngine};
pub use matcher::{MatchResult, Matcher, Schema};
pub use realm::{Realm, RealmError, RouteSink};
pub use record::{Handle, Path, Root, Value};
pub use registry::{Composition, ConflictError, RegistryError, TransformRegistry};
pub use transform::{Output, SchemaError, Transform, TransformDescriptor};
