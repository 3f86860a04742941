//! Conflict detection between transforms touching overlapping paths.

use crate::record::Root;
use crate::transform::Transform;
use std::fmt;
use std::sync::Arc;

/// Which location of the existing transform was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Root,
    Consumes,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictKind::Root => "root",
            ConflictKind::Consumes => "consumes",
        })
    }
}

/// Two transforms touch overlapping paths and neither orders the other.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{transform} conflicts with {kind} of {existing}")]
pub struct ConflictError {
    /// The transform being added
    pub transform: String,
    /// The already-registered transform
    pub existing: String,
    pub kind: ConflictKind,
    /// Location of the new transform that overlaps
    pub path: Root,
    /// Location of the existing transform that overlaps
    pub existing_path: Root,
}

/// Check `candidate` against every transform already registered.
///
/// Transforms related by `before`/`after` in either direction may touch the
/// same paths; all others must touch disjoint paths, where the whole record
/// overlaps everything.
pub fn check_conflicts<'a, I>(candidate: &Transform, existing: I) -> Result<(), ConflictError>
where
    I: IntoIterator<Item = &'a Arc<Transform>>,
{
    for other in existing {
        if candidate.is_ordered_with(other) {
            continue;
        }

        for (path, _) in candidate.touched() {
            for (existing_path, consumed) in other.touched() {
                if path.overlaps(&existing_path) {
                    return Err(ConflictError {
                        transform: candidate.name().to_string(),
                        existing: other.name().to_string(),
                        kind: if consumed {
                            ConflictKind::Consumes
                        } else {
                            ConflictKind::Root
                        },
                        path,
                        existing_path,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Schema;
    use crate::transform::{Output, TransformDescriptor};

    fn transform(name: &str, root: &str) -> TransformDescriptor {
        TransformDescriptor::new(name)
            .root(root)
            .matcher(Schema::any())
            .handler(|_, _, _, _| Ok(Output::one("x")))
    }

    fn build(descriptor: TransformDescriptor) -> Arc<Transform> {
        Arc::new(descriptor.validate().unwrap())
    }

    #[test]
    fn test_prefix_conflict() {
        let a = build(transform("a", "x.y"));
        let b = build(transform("b", "x.y.z"));

        let err = check_conflicts(&b, [&a]).unwrap_err();
        assert_eq!(err.to_string(), "b conflicts with root of a");
        assert_eq!(err.kind, ConflictKind::Root);
        assert_eq!(err.existing_path, Root::parse("x.y").unwrap());
    }

    #[test]
    fn test_sibling_names_are_disjoint() {
        let hot = build(transform("hot", "app.hot"));
        let hotdog = build(transform("hotdog", "app.hotdog"));
        assert!(check_conflicts(&hotdog, [&hot]).is_ok());
    }

    #[test]
    fn test_whole_record_conflicts_with_everything() {
        let method = build(transform("method", "method"));
        let replace = build(transform("replace", "$"));
        let err = check_conflicts(&replace, [&method]).unwrap_err();
        assert_eq!(err.to_string(), "replace conflicts with root of method");
    }

    #[test]
    fn test_precedence_allows_overlap() {
        let a = build(transform("a", "x.y"));
        let b = build(transform("b", "x.y.z").after("a"));
        assert!(check_conflicts(&b, [&a]).is_ok());

        let c = build(transform("c", "x").before("b"));
        let d = build(transform("d", "x.y.z"));
        // c and b are ordered, but c and a are not
        assert!(check_conflicts(&c, [&a, &b]).is_err());
        assert!(check_conflicts(&b, [&c]).is_ok());
        assert!(check_conflicts(&d, [&b]).is_err());
    }

    #[test]
    fn test_consumes_conflict() {
        let migrate = build(transform("migrate", "config.auth").consumes("auth"));
        let legacy = build(transform("legacy", "auth.mode"));

        let err = check_conflicts(&legacy, [&migrate]).unwrap_err();
        assert_eq!(err.to_string(), "legacy conflicts with consumes of migrate");
        assert_eq!(err.kind, ConflictKind::Consumes);
    }
}
