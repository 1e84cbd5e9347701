//! Error types for tool registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The server name is empty after trimming.
    #[error("tool server name must not be empty")]
    EmptyServerName,

    /// The server name exceeds the 100-character limit.
    #[error("tool server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The server endpoint is empty after trimming.
    #[error("tool server endpoint must not be empty")]
    EmptyEndpoint,

    /// Two stored servers share an identifier.
    #[error("tool server id {0} is used more than once")]
    DuplicateServerId(u64),

    /// Every server identifier up to `u64::MAX` is already taken.
    #[error("no tool server identifiers remain")]
    IdSpaceExhausted,
}

/// A raw tool entry that could not be normalized into a descriptor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolShapeError {
    /// The entry is not a JSON object (a bare string, number, array, ...).
    #[error("tool entry is not an object: {0}")]
    NotAnObject(String),

    /// The entry has no non-empty string `name`.
    #[error("tool entry has no usable name")]
    MissingName,

    /// The entry's `description` is present but not a string.
    #[error("tool '{0}' has a non-string description")]
    InvalidDescription(String),

    /// The entry's schema is present but not a JSON object.
    #[error("tool '{tool}' has a non-object {field}")]
    InvalidSchema {
        /// Tool name.
        tool: String,
        /// Offending schema field.
        field: &'static str,
    },
}
