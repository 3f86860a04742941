//! Dotted paths into records and in-place accessors.
//!
//! `set` and `delete` mutate the record they are given. They copy a
//! container only while it is still shared, so they never write through to
//! another record, but the intended call pattern is to hand them a record
//! produced by [`clone_along_path`](super::clone_along_path) first.

use super::value::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The spelling of the whole-record root in configuration.
pub const RECORD_ROOT: &str = "$";

/// How far past the end of an array `set` may write.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// A parsed dotted path, e.g. `config.cors.headers`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Parse a dotted path. Every segment must be non-empty.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }

        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segment-wise prefix test. A path is a prefix of itself.
    ///
    /// `a.b` is a prefix of `a.b.c` but not of `a.bc`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }

    /// True when either path is a prefix of the other.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Where a transform reads and writes: the whole record or one path in it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Root {
    Record,
    Path(Path),
}

impl Root {
    /// Parse a root. `$` selects the whole record.
    pub fn parse(root: &str) -> Result<Self, PathError> {
        if root == RECORD_ROOT {
            Ok(Root::Record)
        } else {
            Path::parse(root).map(Root::Path)
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Root::Record)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Root::Record => None,
            Root::Path(path) => Some(path),
        }
    }

    /// The whole record overlaps every root.
    pub fn overlaps(&self, other: &Root) -> bool {
        match (self, other) {
            (Root::Path(a), Root::Path(b)) => a.overlaps(b),
            _ => true,
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Record => f.write_str(RECORD_ROOT),
            Root::Path(path) => path.fmt(f),
        }
    }
}

impl From<Path> for Root {
    fn from(path: Path) -> Self {
        Root::Path(path)
    }
}

/// Read the value at `path`. Missing intermediates yield `None`.
pub fn get<'a>(record: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(record, |current, segment| current.get(segment))
}

/// Read the value a root selects.
pub fn get_root<'a>(record: &'a Value, root: &Root) -> Option<&'a Value> {
    match root {
        Root::Record => Some(record),
        Root::Path(path) => get(record, path),
    }
}

/// Write `value` at `path`, creating containers for missing intermediates.
///
/// Scalars found on the way are replaced by empty objects. Numeric
/// segments index into arrays, padding with `null` past the end by at most
/// [`MAX_ARRAY_PADDING`] slots. An existing array is never replaced: a
/// non-numeric segment under one is an error.
pub fn set(record: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let mut current = record;
    for segment in path.segments() {
        current = slot(current, segment, path)?;
    }
    *current = value;
    Ok(())
}

/// Remove and return the value at `path`. Missing intermediates are a no-op.
pub fn delete(record: &mut Value, path: &Path) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    get(record, path)?;

    let mut current = record;
    for segment in parents {
        current = existing_mut(current, segment)?;
    }

    match current {
        Value::Object(map) => {
            if !map.contains_key(last) {
                return None;
            }
            Arc::make_mut(map).shift_remove(last)
        }
        Value::Array(items) => {
            let index = array_index(items, last)?;
            Some(Arc::make_mut(items).remove(index))
        }
        _ => None,
    }
}

/// Mutable access to an existing child. Copies the parent container only if
/// the child exists and the parent is shared.
pub(crate) fn existing_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => {
            if !map.contains_key(segment) {
                return None;
            }
            Arc::make_mut(map).get_mut(segment)
        }
        Value::Array(items) => {
            let index = array_index(items, segment)?;
            Arc::make_mut(items).get_mut(index)
        }
        _ => None,
    }
}

/// Mutable access to a child, creating it (and its container) if needed.
fn slot<'a>(
    container: &'a mut Value,
    segment: &str,
    path: &Path,
) -> Result<&'a mut Value, PathError> {
    match container {
        Value::Array(items) => {
            let index = segment
                .parse::<usize>()
                .map_err(|_| PathError::NotAnIndex {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
            if index.saturating_sub(items.len()) > MAX_ARRAY_PADDING {
                return Err(PathError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }

            let items = Arc::make_mut(items);
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        Value::Object(map) => Ok(Arc::make_mut(map)
            .entry(segment.to_string())
            .or_insert(Value::Null)),
        other => {
            *other = Value::object();
            slot(other, segment, path)
        }
    }
}

fn array_index(items: &[Value], segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index < items.len())
}

/// Errors from parsing a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path must not be empty")]
    Empty,

    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("cannot write '{path}': '{segment}' is not an index into the existing array")]
    NotAnIndex { path: String, segment: String },

    #[error("cannot write '{path}': index {index} is too far past the end of {len} items")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(path("config.app.deep").len(), 3);
        assert_eq!(path("method").to_string(), "method");
        assert_eq!(Path::parse(""), Err(PathError::Empty));
        assert!(matches!(
            Path::parse("a..b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(Path::parse(".a").is_err());
        assert!(Path::parse("a.").is_err());
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(Root::parse("$"), Ok(Root::Record));
        assert_eq!(Root::parse("a.b"), Ok(Root::Path(path("a.b"))));
        assert_eq!(Root::Record.to_string(), "$");
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        assert!(path("a.b").is_prefix_of(&path("a.b.c")));
        assert!(path("a.b").is_prefix_of(&path("a.b")));
        assert!(!path("a.b").is_prefix_of(&path("a.bc")));
        assert!(!path("app.hot").overlaps(&path("app.hotdog")));
        assert!(!path("a.b.c").is_prefix_of(&path("a.b")));
    }

    #[test]
    fn test_record_root_overlaps_everything() {
        let record = Root::Record;
        let method = Root::Path(path("method"));
        assert!(record.overlaps(&method));
        assert!(method.overlaps(&record));
        assert!(record.overlaps(&Root::Record));
        assert!(!method.overlaps(&Root::Path(path("path"))));
    }

    #[test]
    fn test_get() {
        let record = Value::from(json!({"config": {"cors": {"headers": ["a", "b"]}}}));
        assert_eq!(
            get(&record, &path("config.cors.headers.1")),
            Some(&Value::from("b"))
        );
        assert_eq!(get(&record, &path("config.missing.deep")), None);
        assert_eq!(get(&record, &path("config.cors.headers.9")), None);
        assert!(get_root(&record, &Root::Record).is_some());
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut record = Value::from(json!({"method": "get", "config": {}}));
        set(&mut record, &path("config.app.deep"), Value::Bool(true)).unwrap();
        assert_eq!(
            record.to_json(),
            json!({"method": "get", "config": {"app": {"deep": true}}})
        );
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut record = Value::from(json!({"config": 5}));
        set(&mut record, &path("config.app"), Value::from("x")).unwrap();
        assert_eq!(record.to_json(), json!({"config": {"app": "x"}}));
    }

    #[test]
    fn test_set_array_index() {
        let mut record = Value::from(json!({"items": ["a", "b"]}));
        set(&mut record, &path("items.1"), Value::from("B")).unwrap();
        set(&mut record, &path("items.3"), Value::from("D")).unwrap();
        assert_eq!(record.to_json(), json!({"items": ["a", "B", null, "D"]}));
    }

    #[test]
    fn test_set_refuses_key_under_array() {
        let mut record = Value::from(json!({"items": [1, 2]}));
        let err = set(&mut record, &path("items.extra"), Value::from("x")).unwrap_err();
        assert_eq!(
            err,
            PathError::NotAnIndex {
                path: "items.extra".to_string(),
                segment: "extra".to_string(),
            }
        );
        assert_eq!(record.to_json(), json!({"items": [1, 2]}));
    }

    #[test]
    fn test_set_limits_array_padding() {
        let mut record = Value::from(json!({"items": []}));
        let err = set(&mut record, &path("items.18446744073709551615"), Value::Null)
            .unwrap_err();
        assert!(matches!(err, PathError::IndexOutOfRange { len: 0, .. }));

        let far = format!("items.{}", MAX_ARRAY_PADDING + 1);
        assert!(set(&mut record, &path(&far), Value::Null).is_err());
        assert_eq!(record.to_json(), json!({"items": []}));

        let edge = format!("items.{}", MAX_ARRAY_PADDING);
        set(&mut record, &path(&edge), Value::Bool(true)).unwrap();
        assert_eq!(
            record.get("items").and_then(Value::as_array).map(<[Value]>::len),
            Some(MAX_ARRAY_PADDING + 1)
        );
    }

    #[test]
    fn test_delete() {
        let mut record = Value::from(json!({"a": {"b": 1, "c": 2}, "items": [1, 2, 3]}));
        assert_eq!(delete(&mut record, &path("a.b")), Some(Value::from(1i64)));
        assert_eq!(delete(&mut record, &path("items.0")), Some(Value::from(1i64)));
        assert_eq!(record.to_json(), json!({"a": {"c": 2}, "items": [2, 3]}));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let original = Value::from(json!({"a": {"c": 2}}));
        let mut record = original.clone();
        assert_eq!(delete(&mut record, &path("x.y.z")), None);
        assert_eq!(delete(&mut record, &path("a.missing")), None);
        assert_eq!(delete(&mut record, &path("a.c.deeper")), None);
        assert!(Value::ptr_eq(&record, &original));
        assert!(Value::ptr_eq(
            record.get("a").unwrap(),
            original.get("a").unwrap()
        ));
    }

    #[test]
    fn test_writes_never_reach_shared_structure() {
        let original = Value::from(json!({"a": {"b": 1}}));
        let mut record = original.clone();
        set(&mut record, &path("a.b"), Value::from(2i64)).unwrap();
        delete(&mut record, &path("a"));
        assert_eq!(original.to_json(), json!({"a": {"b": 1}}));
    }
}
