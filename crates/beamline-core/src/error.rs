//! Errors raised while constructing or editing elements and catalogs.

use thiserror::Error;

use crate::identifier::Id;

/// Errors for element construction, parameter access and catalog edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("invalid parameter for element `{element}`: {message}")]
    InvalidParameter { element: Id, message: String },

    #[error("unsupported element kind `{0}`")]
    UnsupportedKind(String),

    #[error("unknown parameter `{key}` for element `{element}`")]
    UnknownParameter { element: Id, key: String },

    #[error("element `{element}` has no attribute `{attribute}`")]
    UnsupportedAttribute { element: Id, attribute: String },

    #[error("element `{0}` is already defined")]
    DuplicateElement(Id),

    #[error("element `{0}` is not defined")]
    MissingElement(Id),
}

impl ElementError {
    /// Shorthand for [`ElementError::InvalidParameter`].
    pub fn invalid(element: Id, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            element,
            message: message.into(),
        }
    }
}

/// A type alias for `Result<T, ElementError>`.
pub type Result<T> = std::result::Result<T, ElementError>;
