//! Class declarations - the input to [`Registry::declare_class`]
//!
//! [`Registry::declare_class`]: crate::namespace::Registry::declare_class

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{ClassDef, EventTable, Instance, Member, MethodFn};
use crate::interface::Conformance;

/// A class to compose into a new declaration
#[derive(Debug, Clone)]
pub enum Include {
    /// A class descriptor held by the caller
    Class(Arc<ClassDef>),
    /// A path resolved against the registry at declaration time
    Path(String),
}

impl From<Arc<ClassDef>> for Include {
    fn from(class: Arc<ClassDef>) -> Self {
        Include::Class(class)
    }
}

impl From<&Arc<ClassDef>> for Include {
    fn from(class: &Arc<ClassDef>) -> Self {
        Include::Class(class.clone())
    }
}

impl From<&str> for Include {
    fn from(path: &str) -> Self {
        Include::Path(path.to_string())
    }
}

impl From<String> for Include {
    fn from(path: String) -> Self {
        Include::Path(path)
    }
}

/// Everything a class is declared from, apart from its name
#[derive(Clone, Default)]
pub struct Declaration {
    pub(crate) ctor: Option<MethodFn>,
    pub(crate) members: HashMap<String, Member>,
    pub(crate) events: EventTable,
    pub(crate) includes: Vec<Include>,
    pub(crate) implements: Vec<Option<Arc<dyn Conformance>>>,
    pub(crate) statics: Vec<(String, Member)>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the constructor
    pub fn ctor<F>(self, f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.ctor_fn(Arc::new(f))
    }

    pub fn ctor_fn(mut self, f: MethodFn) -> Self {
        self.ctor = Some(f);
        self
    }

    /// Add a method member
    pub fn method<F>(self, key: &str, f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.member(key, Member::method(f))
    }

    /// Add a data member
    pub fn data(self, key: &str, value: Value) -> Self {
        self.member(key, Member::data(value))
    }

    /// Add a member; a later member with the same key replaces an earlier one
    pub fn member(mut self, key: &str, member: Member) -> Self {
        self.members.insert(key.to_string(), member);
        self
    }

    /// Declare an event
    pub fn event(self, name: &str) -> Self {
        self.event_with(name, Value::Bool(true))
    }

    /// Declare an event with an explicit marker value
    pub fn event_with(mut self, name: &str, marker: Value) -> Self {
        self.events.insert(name.to_string(), marker);
        self
    }

    /// Compose another class into this one
    pub fn include(mut self, include: impl Into<Include>) -> Self {
        self.includes.push(include.into());
        self
    }

    /// Require conformance to an interface
    pub fn implements(self, iface: Arc<dyn Conformance>) -> Self {
        self.implements_entry(Some(iface))
    }

    /// Add an interface slot; `None` marks an invalid entry
    pub fn implements_entry(mut self, iface: Option<Arc<dyn Conformance>>) -> Self {
        self.implements.push(iface);
        self
    }

    /// Publish a static beside the class once it is registered
    pub fn with_static(mut self, key: &str, member: Member) -> Self {
        self.statics.push((key.to_string(), member));
        self
    }

    pub fn has_member(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut members: Vec<_> = self.members.keys().collect();
        members.sort();
        f.debug_struct("Declaration")
            .field("ctor", &self.ctor.is_some())
            .field("members", &members)
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("includes", &self.includes)
            .field("implements", &self.implements)
            .field(
                "statics",
                &self.statics.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_collects_sections() {
        let decl = Declaration::new()
            .data("size", json!(1))
            .method("grow", |_, _| Ok(Value::Null))
            .event("grown")
            .include("a.Base")
            .with_static("create", Member::data(json!(null)));

        assert!(decl.has_member("size"));
        assert!(decl.has_member("grow"));
        assert!(decl.ctor.is_none());
        assert!(decl.events.contains_key("grown"));
        assert!(matches!(&decl.includes[0], Include::Path(p) if p == "a.Base"));
        assert_eq!(decl.statics.len(), 1);
    }

    #[test]
    fn test_member_replaces_same_key() {
        let decl = Declaration::new()
            .data("size", json!(1))
            .data("size", json!(2));
        assert_eq!(decl.members["size"].as_data(), Some(&json!(2)));
    }
}
