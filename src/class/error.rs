//! Class declaration errors

use thiserror::Error;

use crate::interface::ConformanceError;
use crate::namespace::NamespaceError;

/// Broad category of a [`ClassError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Shape,
    Include,
    Conflict,
    Interface,
    Lookup,
    Sealed,
}

/// Errors that abort a class declaration or a member table write
#[derive(Debug, Error)]
pub enum ClassError {
    #[error("invalid class name '{0}'")]
    InvalidName(String),

    #[error("invalid {section} in class '{class}'")]
    InvalidShape {
        class: String,
        section: &'static str,
    },

    #[error("class '{class}' includes an invalid class {entry}")]
    InvalidInclude { class: String, entry: String },

    #[error("included class '{included}' overwrites a private member called '{key}' in class '{class}'")]
    PrivateOverride {
        class: String,
        included: String,
        key: String,
    },

    #[error("included class '{included}' overwrites the private member '{key}' of another included class '{previous}' in class '{class}'")]
    PrivateMemberConflict {
        class: String,
        included: String,
        previous: String,
        key: String,
    },

    #[error("included class '{included}' overwrites the member '{key}' of another included class '{previous}' in class '{class}' without a local override")]
    MemberConflict {
        class: String,
        included: String,
        previous: String,
        key: String,
    },

    #[error("included class '{included}' overwrites an event '{event}' of another included class '{previous}' in class '{class}'")]
    EventConflict {
        class: String,
        included: String,
        previous: String,
        event: String,
    },

    #[error("class '{class}' redeclares the event '{event}' of included class '{included}'")]
    LocalEventConflict {
        class: String,
        included: String,
        event: String,
    },

    #[error("class '{class}' implements an invalid interface at position: {position}")]
    InvalidInterface { class: String, position: usize },

    #[error("class '{class}' fails to implement the interface '{interface}': {source}")]
    InterfaceMismatch {
        class: String,
        interface: String,
        #[source]
        source: ConformanceError,
    },

    #[error("class '{class}' is sealed; cannot {action} member '{key}'")]
    Sealed {
        class: String,
        key: String,
        action: &'static str,
    },

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

impl ClassError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassError::InvalidName(_) => ErrorKind::Name,
            ClassError::InvalidShape { .. } => ErrorKind::Shape,
            ClassError::InvalidInclude { .. } => ErrorKind::Include,
            ClassError::PrivateOverride { .. }
            | ClassError::PrivateMemberConflict { .. }
            | ClassError::MemberConflict { .. }
            | ClassError::EventConflict { .. }
            | ClassError::LocalEventConflict { .. } => ErrorKind::Conflict,
            ClassError::InvalidInterface { .. } | ClassError::InterfaceMismatch { .. } => {
                ErrorKind::Interface
            }
            ClassError::Sealed { .. } => ErrorKind::Sealed,
            ClassError::Namespace(_) => ErrorKind::Lookup,
        }
    }
}
