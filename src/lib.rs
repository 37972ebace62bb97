//! classkit - namespaced class registry with mixin composition
//!
//! Classes are declared from a constructor, a member table, included
//! classes and interface contracts, and registered under dotted paths.

pub mod class;
pub mod interface;
pub mod manifest;
pub mod namespace;

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub use class::{ClassDef, ClassError, Declaration, ErrorKind, Instance, Member};
pub use interface::{Conformance, Interface};
pub use namespace::{Entry, NamespaceError, Registry};

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Validate, conflict-check and seal every declaration
    pub strict: bool,
    /// Default tracing filter for the binary
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict: true,
            log_filter: "classkit=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then the optional TOML file, then
    /// `CLASSKIT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("CLASSKIT_")).extract()
    }
}
