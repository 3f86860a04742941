//! Applies an ordered list of transforms to a batch of records.

use crate::context::TransformContext;
use crate::record::{clone_along_path, delete, set, Path, PathError, Root, Value};
use crate::transform::{HandlerError, Transform};
use std::sync::Arc;
use tracing::{debug, trace};

/// Errors surfaced while applying transforms.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("transform {transform} failed: {source}")]
    Handler {
        transform: String,
        source: HandlerError,
    },

    #[error("transform {transform} failed: {source}")]
    Write {
        transform: String,
        source: PathError,
    },
}

/// An ordered plan of transforms.
///
/// The engine holds no record state: each [`apply`](Self::apply) call is a
/// pure fold of the plan over the batch it is given.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    transforms: Vec<Arc<Transform>>,
}

impl TransformEngine {
    pub fn new(transforms: Vec<Arc<Transform>>) -> Self {
        Self { transforms }
    }

    pub fn transforms(&self) -> &[Arc<Transform>] {
        &self.transforms
    }

    /// Run every transform, in order, over the batch.
    pub fn apply(
        &self,
        records: Vec<Value>,
        ctx: &TransformContext,
    ) -> Result<Vec<Value>, EngineError> {
        apply(&self.transforms, records, ctx)
    }
}

/// Run `transforms`, in order, over `records`.
///
/// Each transform sees the whole batch produced by the previous one,
/// including any fan-out.
pub fn apply(
    transforms: &[Arc<Transform>],
    mut records: Vec<Value>,
    ctx: &TransformContext,
) -> Result<Vec<Value>, EngineError> {
    for transform in transforms {
        let input = records.len();
        let mut output = Vec::with_capacity(input);
        let mut matched = 0usize;

        for record in records {
            if apply_one(transform, record, ctx, &mut output)? {
                matched += 1;
            }
        }

        debug!(
            transform = transform.name(),
            input,
            matched,
            output = output.len(),
            "Applied transform"
        );
        records = output;
    }

    Ok(records)
}

/// Apply one transform to one record, pushing the results onto `out`.
/// Returns whether the record matched.
fn apply_one(
    transform: &Transform,
    record: Value,
    ctx: &TransformContext,
    out: &mut Vec<Value>,
) -> Result<bool, EngineError> {
    let result = transform.matches(&record);
    if !result.matched {
        trace!(
            transform = transform.name(),
            reason = result.reason.as_deref().unwrap_or_default(),
            "Record passed through"
        );
        out.push(record);
        return Ok(false);
    }

    let base = strip_consumed(&record, transform.consumes());
    let values = transform
        .handle(result.value.as_ref(), &record, ctx)
        .map_err(|source| EngineError::Handler {
            transform: transform.name().to_string(),
            source,
        })?
        .into_values();

    match transform.root() {
        Root::Record => out.extend(values),
        Root::Path(path) => {
            for value in values {
                let mut next = clone_along_path(&base, path);
                set(&mut next, path, value).map_err(|source| EngineError::Write {
                    transform: transform.name().to_string(),
                    source,
                })?;
                out.push(next);
            }
        }
    }

    Ok(true)
}

/// The record with every consumed path removed, sharing everything else.
fn strip_consumed(record: &Value, consumes: &[Path]) -> Value {
    let mut base = record.clone();
    for path in consumes {
        base = clone_along_path(&base, path);
        delete(&mut base, path);
    }
    base
}
