#![forbid(unsafe_code)]

//! Binding errors.

use std::fmt;

/// Why a binding could not be built or activated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A binding selector matched nothing inside the container.
    #[error("\"{selector}\" element not found")]
    ElementNotFound { selector: String },

    /// The container selector matched nothing in the document.
    #[error("\"{selector}\" container selector not found")]
    ContainerNotFound { selector: String },

    /// The bound path does not name a tracked field of the model.
    #[error("\"{key}\" is not a field of the model")]
    UnknownField { key: String },

    /// Custom event handlers were configured for a binding with no elements.
    #[error("\"{key}\" has event handlers but no elements to attach them to")]
    NoElements { key: String },

    /// A hook (options, read, format) panicked while the binding activated.
    #[error("\"{key}\" panicked in a hook while activating")]
    HookPanicked { key: String },
}

pub type Result<T> = std::result::Result<T, BindError>;

/// A per-entry activation failure collected by [`Binder::bind`](crate::Binder::bind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFailure {
    /// The configured field path.
    pub key: String,
    pub error: BindError,
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}
