//! Interface contracts checked against assembled classes

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::class::ClassDef;

/// Reasons a class fails to satisfy an interface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformanceError {
    #[error("missing method '{0}'")]
    MissingMethod(String),

    #[error("member '{0}' is not a method")]
    NotInvocable(String),

    #[error("missing event '{0}'")]
    MissingEvent(String),
}

/// Something a class can be checked against
pub trait Conformance: fmt::Debug + Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Fail if `class` does not satisfy this contract
    fn check(&self, class: &ClassDef) -> Result<(), ConformanceError>;
}

/// A named set of required methods and events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

impl Interface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Require a method
    pub fn method(mut self, name: &str) -> Self {
        self.methods.push(name.to_string());
        self
    }

    /// Require an event
    pub fn event(mut self, name: &str) -> Self {
        self.events.push(name.to_string());
        self
    }
}

impl Conformance for Interface {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, class: &ClassDef) -> Result<(), ConformanceError> {
        for method in &self.methods {
            match class.member(method) {
                Some(member) if member.is_invocable() => {}
                Some(_) => return Err(ConformanceError::NotInvocable(method.clone())),
                None => return Err(ConformanceError::MissingMethod(method.clone())),
            }
        }

        if let Some(event) = self
            .events
            .iter()
            .find(|event| !class.events().contains_key(event.as_str()))
        {
            return Err(ConformanceError::MissingEvent(event.clone()));
        }

        Ok(())
    }
}
