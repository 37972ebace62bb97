//! Dotted path utilities
//!
//! Namespace paths are dot-separated segments, e.g. `ui.widgets.Button`.
//! Class names follow a stricter grammar:
//! - Zero or more package segments: `[a-z][a-z0-9]*`
//! - One final type segment: `[A-Z][a-zA-Z0-9]*`

use regex::Regex;
use std::sync::LazyLock;

/// Class name pattern: lowercase package prefixes, capitalized final segment
static CLASS_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z0-9]*\.)*[A-Z][a-zA-Z0-9]*$").expect("class name pattern is valid")
});

/// Check whether `name` is a valid class name.
///
/// # Examples
/// ```
/// use classkit::namespace::is_class_name;
///
/// assert!(is_class_name("Widget"));
/// assert!(is_class_name("ui.widgets.Button"));
///
/// assert!(!is_class_name("ui.widgets.button")); // final segment must be capitalized
/// assert!(!is_class_name("Ui.Button"));         // packages must be lowercase
/// assert!(!is_class_name("ui..Button"));        // empty segment
/// ```
pub fn is_class_name(name: &str) -> bool {
    CLASS_NAME_REGEX.is_match(name)
}

/// Split a path into its package prefix and final segment.
///
/// # Examples
/// ```
/// use classkit::namespace::split_path;
///
/// assert_eq!(split_path("ui.widgets.Button"), ("ui.widgets", "Button"));
/// assert_eq!(split_path("Button"), ("", "Button"));
/// ```
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(dot) => (&path[..dot], &path[dot + 1..]),
        None => ("", path),
    }
}

/// Iterate over the segments of a package path. An empty path has no segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(move |_| !path.is_empty())
}

/// Extract the final segment (short name) of a path.
pub fn short_name(path: &str) -> &str {
    split_path(path).1
}
