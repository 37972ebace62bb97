//! Namespace system - dotted paths resolving to packages and registered objects

mod path;
mod registry;

pub use path::{is_class_name, segments, short_name, split_path};
pub use registry::{
    Child, Entry, NamespaceError, Package, PackageId, Registry, Resolved, Statics,
};
