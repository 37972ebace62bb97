//! JSON declaration manifests
//!
//! A manifest lists interfaces and classes to register, in order:
//!
//! ```json
//! {
//!   "interfaces": [{ "name": "ui.Drawable", "methods": ["draw"] }],
//!   "classes": [{
//!     "name": "ui.Box",
//!     "ctor": "box.init",
//!     "members": { "width": 10, "draw": { "fn": "box.draw" } },
//!     "events": { "resized": true },
//!     "include": ["ui.Base"],
//!     "implement": ["ui.Drawable"],
//!     "statics": { "unit": "px" }
//!   }]
//! }
//! ```
//!
//! Behavior is referenced by name (`{"fn": "..."}`) and bound through
//! [`Natives`]. Section kinds are checked only in strict mode; lenient mode
//! ignores sections of the wrong kind.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::class::{ClassDef, ClassError, Declaration, Include, Instance, Member, MethodFn, Visibility};
use crate::interface::{Conformance, Interface};
use crate::namespace::{is_class_name, Registry};

/// Key marking a member value as a reference to native behavior
pub const METHOD_KEY: &str = "fn";

/// Errors that can occur while loading or applying a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Interfaces and raw class bodies, in declaration order
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub classes: Vec<Value>,
}

impl Manifest {
    pub fn from_json(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let source = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&source)
    }
}

/// Native behavior that manifests can reference by name
#[derive(Clone, Default)]
pub struct Natives {
    table: HashMap<String, MethodFn>,
    fallback: Option<MethodFn>,
}

impl Natives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Natives that bind every unknown name to a no-op, for checking
    /// manifests without host code
    pub fn permissive() -> Self {
        Self::new().with_fallback(Arc::new(|_: &mut Instance, _: &[Value]| Ok(Value::Null)))
    }

    /// Register a named function
    pub fn register<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.table.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Bind every unregistered name to `f`
    pub fn with_fallback(mut self, f: MethodFn) -> Self {
        self.fallback = Some(f);
        self
    }

    /// Look up a name, falling back when one is set
    pub fn get(&self, name: &str) -> Option<MethodFn> {
        self.table.get(name).or(self.fallback.as_ref()).cloned()
    }
}

impl fmt::Debug for Natives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.table.keys().collect();
        names.sort();
        f.debug_struct("Natives")
            .field("names", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Build a [`Declaration`] from a raw JSON class body.
///
/// In strict mode the name is checked first, then the kind of every
/// section present.
pub fn declaration_from_value(
    registry: &Registry,
    name: &str,
    body: &Value,
    natives: &Natives,
) -> Result<Declaration, ClassError> {
    let strict = registry.is_strict();
    if strict && !is_class_name(name) {
        return Err(ClassError::InvalidName(name.to_string()));
    }

    let shape = |section: &'static str| ClassError::InvalidShape {
        class: name.to_string(),
        section,
    };

    let mut decl = Declaration::new();
    let Some(body) = body.as_object() else {
        return if strict {
            Err(shape("declaration"))
        } else {
            Ok(decl)
        };
    };

    if let Some(ctor) = body.get("ctor") {
        match ctor.as_str().and_then(|native| natives.get(native)) {
            Some(f) => decl = decl.ctor_fn(f),
            None if strict => return Err(shape("constructor")),
            None => debug!(class = name, "ignoring unresolved constructor"),
        }
    }

    match body.get("events") {
        Some(Value::Object(events)) => {
            for (event, marker) in events {
                decl = decl.event_with(event, marker.clone());
            }
        }
        Some(_) if strict => return Err(shape("events section")),
        _ => {}
    }

    match body.get("members") {
        Some(Value::Object(members)) => {
            for (key, member) in members_from_map(members, natives, strict)
                .ok_or_else(|| shape("members section"))?
            {
                decl = decl.member(&key, member);
            }
        }
        Some(_) if strict => return Err(shape("members section")),
        _ => {}
    }

    match body.get("include") {
        Some(Value::Array(items)) => {
            for item in items {
                match item.as_str() {
                    Some(path) => decl = decl.include(Include::Path(path.to_string())),
                    None if strict => {
                        return Err(ClassError::InvalidInclude {
                            class: name.to_string(),
                            entry: item.to_string(),
                        })
                    }
                    None => {}
                }
            }
        }
        Some(_) if strict => return Err(shape("include list")),
        _ => {}
    }

    match body.get("implement") {
        Some(Value::Array(items)) => {
            for item in items {
                let iface = item
                    .as_str()
                    .and_then(|path| registry.interface_by_name(path))
                    .map(|iface| iface as Arc<dyn Conformance>);
                decl = decl.implements_entry(iface);
            }
        }
        Some(_) if strict => return Err(shape("implement list")),
        _ => {}
    }

    match body.get("statics") {
        Some(Value::Object(statics)) => {
            for (key, member) in members_from_map(statics, natives, strict)
                .ok_or_else(|| shape("statics section"))?
            {
                decl = decl.with_static(&key, member);
            }
        }
        Some(_) if strict => return Err(shape("statics section")),
        _ => {}
    }

    Ok(decl)
}

/// Convert a JSON member map. `None` when a method reference cannot be
/// bound in strict mode; lenient mode keeps such entries as data.
fn members_from_map(
    map: &Map<String, Value>,
    natives: &Natives,
    strict: bool,
) -> Option<Vec<(String, Member)>> {
    let mut members = Vec::with_capacity(map.len());

    for (key, value) in map {
        let member = match method_reference(value) {
            Some((native, visibility)) => match natives.get(native) {
                Some(f) => {
                    let member = Member::from_fn(f);
                    match visibility {
                        Some(visibility) => member.with_visibility(visibility),
                        None => member,
                    }
                }
                None if strict => return None,
                None => Member::data(value.clone()),
            },
            None => Member::data(value.clone()),
        };
        members.push((key.clone(), member));
    }

    Some(members)
}

/// Recognize `{"fn": "<native>", "visibility": "<vis>"?}`
fn method_reference(value: &Value) -> Option<(&str, Option<Visibility>)> {
    let object = value.as_object()?;
    let native = object.get(METHOD_KEY)?.as_str()?;
    let visibility = object
        .get("visibility")
        .and_then(|v| serde_json::from_value(v.clone()).ok());
    Some((native, visibility))
}

impl Registry {
    /// Declare a class from a raw JSON body
    pub fn declare_class_from_value(
        &mut self,
        name: &str,
        body: &Value,
        natives: &Natives,
    ) -> Result<Arc<ClassDef>, ClassError> {
        let declaration = declaration_from_value(self, name, body, natives)?;
        self.declare_class(name, declaration)
    }

    /// Register a manifest's interfaces, then declare its classes in order.
    ///
    /// Stops at the first failing class; classes declared before it stay
    /// registered.
    pub fn apply_manifest(
        &mut self,
        manifest: &Manifest,
        natives: &Natives,
    ) -> Result<Vec<Arc<ClassDef>>, ClassError> {
        for iface in &manifest.interfaces {
            self.assign(&iface.name, Arc::new(iface.clone()));
        }

        let mut declared = Vec::with_capacity(manifest.classes.len());
        for body in &manifest.classes {
            let name = match body.get("name") {
                Some(Value::String(name)) => name.as_str(),
                other => {
                    return Err(ClassError::InvalidName(
                        other.map(Value::to_string).unwrap_or_default(),
                    ))
                }
            };
            declared.push(self.declare_class_from_value(name, body, natives)?);
        }

        Ok(declared)
    }
}
