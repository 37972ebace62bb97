//! Class members and their visibility

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Instance;

/// Prefix marking a member name as private
pub const PRIVATE_PREFIX: &str = "__";

/// Callable behavior: constructors, methods and function statics
pub type MethodFn = Arc<dyn Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Member visibility, used by the composition conflict rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Classify a member name by convention: `__name` is private
    pub fn from_key(key: &str) -> Self {
        if key.starts_with(PRIVATE_PREFIX) {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    /// Whether collisions on this member are always errors
    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

/// What a member holds
#[derive(Clone)]
pub enum MemberKind {
    Method(MethodFn),
    Data(Value),
}

/// A single entry of a member table
#[derive(Clone)]
pub struct Member {
    kind: MemberKind,
    visibility: Option<Visibility>,
    label: Option<String>,
}

impl Member {
    /// Create a method member
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::from_fn(Arc::new(f))
    }

    /// Create a method member from an already shared function
    pub fn from_fn(f: MethodFn) -> Self {
        Self {
            kind: MemberKind::Method(f),
            visibility: None,
            label: None,
        }
    }

    /// Create a data member
    pub fn data(value: Value) -> Self {
        Self {
            kind: MemberKind::Data(value),
            visibility: None,
            label: None,
        }
    }

    /// Tag the member with an explicit visibility, overriding the name convention
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// What the member holds
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Whether the member is a method
    pub fn is_invocable(&self) -> bool {
        matches!(self.kind, MemberKind::Method(_))
    }

    /// Get the method, if this member is one
    pub fn as_method(&self) -> Option<&MethodFn> {
        match &self.kind {
            MemberKind::Method(f) => Some(f),
            MemberKind::Data(_) => None,
        }
    }

    /// Get the data value, if this member is one
    pub fn as_data(&self) -> Option<&Value> {
        match &self.kind {
            MemberKind::Data(value) => Some(value),
            MemberKind::Method(_) => None,
        }
    }

    /// Explicit visibility tag, if one was given
    pub fn explicit_visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    /// Effective visibility of this member when stored under `key`
    pub fn visibility_for(&self, key: &str) -> Visibility {
        self.visibility.unwrap_or_else(|| Visibility::from_key(key))
    }

    /// Diagnostic label (`Type.member`) of a method
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    /// Pin the visibility derived from `key` so it survives re-keying
    pub(crate) fn settle_visibility(&mut self, key: &str) {
        self.visibility = Some(self.visibility_for(key));
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Member");
        match &self.kind {
            MemberKind::Method(_) => s.field("kind", &"method"),
            MemberKind::Data(value) => s.field("data", value),
        };
        s.field("visibility", &self.visibility)
            .field("label", &self.label)
            .finish()
    }
}
