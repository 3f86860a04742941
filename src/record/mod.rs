//! Records: nested route definitions, paths into them, and minimal cloning.

mod clone;
mod path;
mod value;

pub use clone::clone_along_path;
pub use path::{
    delete, get, get_root, set, Path, PathError, Root, MAX_ARRAY_PADDING, RECORD_ROOT,
};
pub use value::{Handle, Map, Value};
