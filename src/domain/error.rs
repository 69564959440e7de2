//! Domain validation errors.
//!
//! Returned by `try_new` constructors when an invariant on a domain type
//! would be violated.
//!
//! ```
//! use modelbus::domain::error::IdentityError;
//! use modelbus::domain::ModelIdentity;
//!
//! let result = ModelIdentity::try_new("", 1, 0);
//! assert!(matches!(result, Err(IdentityError::EmptyName)));
//! ```

use thiserror::Error;

/// Errors raised when a model identity cannot be turned into topic names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Model names must be non-empty.
    #[error("model name cannot be empty")]
    EmptyName,

    /// Model names are embedded in topic names and share their length limit.
    #[error("model name is {len} characters, maximum is {max}")]
    NameTooLong {
        /// Length of the rejected name.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Model names may only use the characters legal in a topic name.
    #[error("model name '{name}' contains illegal character {ch:?}")]
    IllegalCharacter {
        /// The rejected name.
        name: String,
        /// First offending character.
        ch: char,
    },
}
