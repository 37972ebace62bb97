//! Class instances

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde_json::Value;

use super::ClassDef;

/// Per-instance state, stored as JSON-compatible key-value pairs
pub type Properties = HashMap<String, Value>;

/// Source of process-wide unique instance ids
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// An object created from a class
pub struct Instance {
    id: u64,
    class: Arc<ClassDef>,
    fields: Properties,
}

impl Instance {
    pub(crate) fn new(class: Arc<ClassDef>) -> Self {
        Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            class,
            fields: Properties::new(),
        }
    }

    /// Process-wide unique id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Class this instance was created from
    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Instance fields only, without class defaults
    pub fn fields(&self) -> &Properties {
        &self.fields
    }

    /// Read a field, falling back to the class's data member of the same name
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.fields.get(key) {
            return Some(value.clone());
        }
        self.class
            .member(key)
            .and_then(|member| member.as_data().cloned())
    }

    /// Set an instance field, shadowing any class default
    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// Invoke a method member of the class on this instance
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        let member = self
            .class
            .member(method)
            .ok_or_else(|| anyhow!("{} has no member '{}'", self, method))?;

        let Some(f) = member.as_method() else {
            bail!("member '{}' of {} is not a method", method, self.class);
        };

        let f = f.clone();
        f(self, args)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.class.name(), self.id)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("fields", &self.fields)
            .finish()
    }
}
