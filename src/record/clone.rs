//! Minimal cloning of records along a path.

use super::path::{existing_mut, Path};
use super::value::Value;
use std::sync::Arc;

/// Copy `record` so that the containers on `path` are owned by the copy.
///
/// Only the containers actually traversed are shallow-copied; cloning stops
/// at the first scalar or missing segment. Every sibling sub-tree stays
/// shared with `record`, and `record` itself is never modified.
pub fn clone_along_path(record: &Value, path: &Path) -> Value {
    let mut copy = record.clone();
    detach(&mut copy);

    let mut current = &mut copy;
    for segment in path.segments() {
        current = match existing_mut(current, segment) {
            Some(next) => next,
            None => break,
        };
        detach(current);
    }

    copy
}

/// Give a container its own top-level allocation. Children stay shared.
fn detach(value: &mut Value) {
    match value {
        Value::Object(map) => *map = Arc::new((**map).clone()),
        Value::Array(items) => *items = Arc::new((**items).clone()),
        _ => {}
    }
}
