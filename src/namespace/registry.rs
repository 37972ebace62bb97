//! Namespace registry - package tree, path cache and statics side channel

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::path::{segments, split_path};
use crate::class::{ClassDef, Member};
use crate::interface::{Conformance, Interface};
use crate::Settings;

/// Errors raised by registry lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("object '{0}' is not registered")]
    NotRegistered(String),
}

/// Index of a package node inside a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageId(usize);

/// An object registered at a dotted path
#[derive(Debug, Clone)]
pub enum Entry {
    /// A declared class
    Class(Arc<ClassDef>),
    /// An interface contract
    Interface(Arc<Interface>),
    /// Any other registered value
    Value(serde_json::Value),
}

impl Entry {
    /// Check whether this entry is a class descriptor
    pub fn is_class(&self) -> bool {
        matches!(self, Entry::Class(_))
    }

    /// Get the class descriptor, if this entry is one
    pub fn as_class(&self) -> Option<&Arc<ClassDef>> {
        match self {
            Entry::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Get the interface, if this entry is one
    pub fn as_interface(&self) -> Option<&Arc<Interface>> {
        match self {
            Entry::Interface(iface) => Some(iface),
            _ => None,
        }
    }

    /// Short human-readable description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Entry::Class(class) => format!("[class {}]", class.name()),
            Entry::Interface(iface) => format!("[interface {}]", iface.name()),
            Entry::Value(value) => value.to_string(),
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Class(a), Entry::Class(b)) => Arc::ptr_eq(a, b),
            (Entry::Interface(a), Entry::Interface(b)) => Arc::ptr_eq(a, b),
            (Entry::Value(a), Entry::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Arc<ClassDef>> for Entry {
    fn from(class: Arc<ClassDef>) -> Self {
        Entry::Class(class)
    }
}

impl From<Arc<Interface>> for Entry {
    fn from(iface: Arc<Interface>) -> Self {
        Entry::Interface(iface)
    }
}

impl From<serde_json::Value> for Entry {
    fn from(value: serde_json::Value) -> Self {
        Entry::Value(value)
    }
}

/// A child slot of a package
#[derive(Debug, Clone)]
pub enum Child {
    Package(PackageId),
    Object(Entry),
}

/// A named container in the namespace tree
#[derive(Debug)]
pub struct Package {
    segment: String,
    children: BTreeMap<String, Child>,
}

impl Package {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            children: BTreeMap::new(),
        }
    }

    /// Path component this package represents (empty for the root)
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Look up a direct child by segment name
    pub fn child(&self, name: &str) -> Option<&Child> {
        self.children.get(name)
    }

    /// Iterate over children in segment order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Child)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of resolving a path
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Package(PackageId),
    Object(Entry),
}

impl Resolved {
    /// Convert to the registered object, discarding package hits
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Resolved::Object(entry) => Some(entry),
            Resolved::Package(_) => None,
        }
    }
}

/// Static members attached beside a registered object
pub type Statics = BTreeMap<String, Member>;

/// Registry of packages and objects addressed by dotted paths
#[derive(Debug)]
pub struct Registry {
    packages: Vec<Package>,
    cache: HashMap<String, Entry>,
    statics: HashMap<String, Statics>,
    settings: Settings,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create an empty registry with the given settings
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            packages: vec![Package::new("")],
            cache: HashMap::new(),
            statics: HashMap::new(),
            settings,
        }
    }

    /// Whether declarations are validated, conflict-checked and sealed
    pub fn is_strict(&self) -> bool {
        self.settings.strict
    }

    /// Toggle strict mode for subsequent declarations
    pub fn set_strict(&mut self, strict: bool) {
        self.settings.strict = strict;
    }

    /// Get the active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The root package
    pub fn root(&self) -> PackageId {
        PackageId(0)
    }

    /// Get a package node
    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0)
    }

    /// Create or get the package at `path`, creating missing segments.
    ///
    /// An empty path yields the root.
    pub fn define_package(&mut self, path: &str) -> PackageId {
        let mut current = self.root();

        for segment in segments(path) {
            let existing = match self.packages[current.0].children.get(segment) {
                Some(Child::Package(id)) => Some(*id),
                Some(Child::Object(_)) => {
                    warn!(path, segment, "replacing registered object with a package");
                    None
                }
                None => None,
            };

            current = match existing {
                Some(id) => id,
                None => self.create_package(current, segment),
            };
        }

        current
    }

    fn create_package(&mut self, parent: PackageId, segment: &str) -> PackageId {
        let id = PackageId(self.packages.len());
        self.packages.push(Package::new(segment));
        self.packages[parent.0]
            .children
            .insert(segment.to_string(), Child::Package(id));
        debug!(segment, "created package");
        id
    }

    /// Register `entry` at `path`, creating intermediate packages.
    ///
    /// Re-assigning an existing path replaces the previous object.
    pub fn assign(&mut self, path: &str, entry: impl Into<Entry>) -> Entry {
        let entry = entry.into();
        let (prefix, name) = split_path(path);
        let package = self.define_package(prefix);

        let previous = self.packages[package.0]
            .children
            .insert(name.to_string(), Child::Object(entry.clone()));
        match previous {
            Some(Child::Object(_)) => warn!(path, "overwriting registered object"),
            Some(Child::Package(_)) => warn!(path, "replacing package with an object"),
            None => {}
        }

        self.cache.insert(path.to_string(), entry.clone());
        entry
    }

    /// Resolve a dotted path to a package or registered object
    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        if path.is_empty() {
            return None;
        }

        if let Some(entry) = self.cache.get(path) {
            return Some(Resolved::Object(entry.clone()));
        }

        let mut current = Resolved::Package(self.root());
        for segment in path.split('.') {
            let Resolved::Package(id) = current else {
                return None;
            };
            current = match self.packages[id.0].children.get(segment)? {
                Child::Package(child) => Resolved::Package(*child),
                Child::Object(entry) => Resolved::Object(entry.clone()),
            };
        }

        Some(current)
    }

    /// Resolve a path to a registered object, ignoring packages
    pub fn resolve_entry(&self, path: &str) -> Option<Entry> {
        self.resolve(path).and_then(Resolved::into_entry)
    }

    /// Find a class by its fully qualified name
    pub fn class_by_name(&self, name: &str) -> Option<Arc<ClassDef>> {
        match self.resolve_entry(name)? {
            Entry::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Find an interface by its fully qualified name
    pub fn interface_by_name(&self, name: &str) -> Option<Arc<Interface>> {
        match self.resolve_entry(name)? {
            Entry::Interface(iface) => Some(iface),
            _ => None,
        }
    }

    /// Attach static members beside the object registered at `path`.
    ///
    /// Statics never enter a class's member table. Adding a static that
    /// already exists replaces it.
    pub fn add_statics<I>(&mut self, path: &str, statics: I) -> Result<(), NamespaceError>
    where
        I: IntoIterator<Item = (String, Member)>,
    {
        if !self.cache.contains_key(path) {
            return Err(NamespaceError::NotRegistered(path.to_string()));
        }

        let table = self.statics.entry(path.to_string()).or_default();
        for (name, member) in statics {
            debug!(path, name = name.as_str(), "attached static");
            table.insert(name, member);
        }

        Ok(())
    }

    /// All statics attached to `path`
    pub fn statics(&self, path: &str) -> Option<&Statics> {
        self.statics.get(path)
    }

    /// A single static attached to `path`
    pub fn static_member(&self, path: &str, name: &str) -> Option<&Member> {
        self.statics.get(path)?.get(name)
    }

    /// All registered classes, ordered by name
    pub fn classes(&self) -> Vec<Arc<ClassDef>> {
        let mut classes: Vec<_> = self
            .cache
            .values()
            .filter_map(|entry| entry.as_class().cloned())
            .collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_resolve_round_trip() {
        let mut registry = Registry::new();
        registry.assign("a.b.Thing", json!({"x": 1}));

        assert_eq!(
            registry.resolve_entry("a.b.Thing"),
            Some(Entry::Value(json!({"x": 1})))
        );
    }

    #[test]
    fn test_assign_without_prefix() {
        let mut registry = Registry::new();
        registry.assign("Thing", json!(7));

        let root = registry.package(registry.root()).unwrap();
        assert!(matches!(root.child("Thing"), Some(Child::Object(_))));
        assert_eq!(registry.resolve_entry("Thing"), Some(Entry::Value(json!(7))));
    }

    #[test]
    fn test_define_package_shares_prefix() {
        let mut registry = Registry::new();
        let left = registry.define_package("a.b.left");
        let right = registry.define_package("a.b.right");
        assert_ne!(left, right);

        let Some(Resolved::Package(ab1)) = registry.resolve("a.b") else {
            panic!("a.b should be a package");
        };
        registry.define_package("a.b");
        let Some(Resolved::Package(ab2)) = registry.resolve("a.b") else {
            panic!("a.b should be a package");
        };
        assert_eq!(ab1, ab2);

        let ab = registry.package(ab1).unwrap();
        assert_eq!(ab.segment(), "b");
        assert_eq!(ab.children().count(), 2);
    }

    #[test]
    fn test_define_package_idempotent() {
        let mut registry = Registry::new();
        let first = registry.define_package("x.y.z");
        let second = registry.define_package("x.y.z");
        assert_eq!(first, second);
        assert_eq!(registry.define_package(""), registry.root());
    }

    #[test]
    fn test_resolve_missing() {
        let mut registry = Registry::new();
        registry.assign("a.b.Thing", json!(1));

        assert_eq!(registry.resolve(""), None);
        assert_eq!(registry.resolve("a.c"), None);
        assert_eq!(registry.resolve("a.b.Other"), None);
        assert_eq!(registry.resolve("a.b.Thing.deeper"), None);
    }

    #[test]
    fn test_resolve_by_tree_walk() {
        let mut registry = Registry::new();
        let pkg = registry.define_package("a.b");

        assert_eq!(registry.resolve("a.b"), Some(Resolved::Package(pkg)));
        assert!(registry.resolve_entry("a.b").is_none());
    }

    #[test]
    fn test_reassign_last_write_wins() {
        let mut registry = Registry::new();
        registry.assign("a.Thing", json!(1));
        registry.assign("a.Thing", json!(2));

        assert_eq!(registry.resolve_entry("a.Thing"), Some(Entry::Value(json!(2))));
    }

    #[test]
    fn test_leaf_replaced_by_package_keeps_cache() {
        let mut registry = Registry::new();
        registry.assign("a.Thing", json!("leaf"));
        registry.assign("a.Thing.Inner", json!("inner"));

        // The cache still answers for the original leaf
        assert_eq!(
            registry.resolve_entry("a.Thing"),
            Some(Entry::Value(json!("leaf")))
        );
        assert_eq!(
            registry.resolve_entry("a.Thing.Inner"),
            Some(Entry::Value(json!("inner")))
        );
    }

    #[test]
    fn test_add_statics_unregistered() {
        let mut registry = Registry::new();
        let err = registry
            .add_statics("no.such.Thing", vec![("x".to_string(), Member::data(json!(1)))])
            .unwrap_err();

        assert_eq!(err, NamespaceError::NotRegistered("no.such.Thing".to_string()));
        assert!(err.to_string().contains("no.such.Thing"));
    }

    #[test]
    fn test_add_statics() {
        let mut registry = Registry::new();
        registry.assign("a.Thing", json!({}));
        registry
            .add_statics(
                "a.Thing",
                vec![
                    ("version".to_string(), Member::data(json!(3))),
                    ("label".to_string(), Member::data(json!("thing"))),
                ],
            )
            .unwrap();

        let version = registry.static_member("a.Thing", "version").unwrap();
        assert_eq!(version.as_data(), Some(&json!(3)));
        assert_eq!(registry.statics("a.Thing").unwrap().len(), 2);

        // Registered value is untouched
        assert_eq!(registry.resolve_entry("a.Thing"), Some(Entry::Value(json!({}))));
    }

    #[test]
    fn test_empty_path_never_resolves() {
        let mut registry = Registry::new();
        registry.assign("", json!("unnamed"));

        assert_eq!(registry.resolve(""), None);
        assert!(registry.resolve_entry("").is_none());
    }

    #[test]
    fn test_entry_kinds() {
        let mut registry = Registry::new();
        registry.assign("ui.Drawable", Arc::new(Interface::new("ui.Drawable")));
        registry.assign("ui.Plain", json!(1));

        let iface = registry.resolve_entry("ui.Drawable").unwrap();
        assert!(!iface.is_class());
        assert_eq!(iface.as_interface().unwrap().name, "ui.Drawable");
        assert_eq!(iface.describe(), "[interface ui.Drawable]");

        let plain = registry.resolve_entry("ui.Plain").unwrap();
        assert!(!plain.is_class());
        assert!(plain.as_interface().is_none());
        assert_eq!(plain.describe(), "1");
    }

    #[test]
    fn test_settings_follow_strict_toggle() {
        let mut registry = Registry::new();
        assert!(registry.settings().strict);

        registry.set_strict(false);
        assert!(!registry.settings().strict);
        assert!(!registry.is_strict());
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = Registry::new();
        let second = Registry::new();
        first.assign("a.Thing", json!(1));

        assert!(first.resolve("a.Thing").is_some());
        assert!(second.resolve("a.Thing").is_none());
    }
}
