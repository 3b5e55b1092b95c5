//! # Error Types
//!
//! One `Error` enum covers every failure the crate can report. Construction
//! errors are part of the builder's contract: callers match on the variant to
//! tell a state-machine misuse apart from a schema violation. Read-side
//! variants cover malformed or truncated input handed to [`crate::TableView`].
//!
//! All violations are detected synchronously at the offending call and none
//! are retried internally; `end_table` either commits the whole table or
//! nothing beyond already-finalized siblings.

use thiserror::Error;

/// The error type for table construction and decoding.
///
/// # Error Categories
///
/// ## Builder State Machine
/// - [`Error::Nesting`] - construction ordering violated (no open table,
///   unbalanced `end_table`, open tables at `finish`, or depth exceeded)
/// - [`Error::DuplicateField`] - a field was set twice in one table
/// - [`Error::Ordering`] - an offset field references a table that is not
///   finalized in this buffer
/// - [`Error::RequiredField`] - a schema-required field was never set
///
/// ## Schema Lookup
/// - [`Error::UnknownField`] - ordinal outside the schema's field list
/// - [`Error::FieldType`] - value kind does not match the declared field kind
///
/// ## Clone Engine
/// - [`Error::CyclicReference`] - a source table transitively references
///   itself (only possible on malformed, externally-crafted input)
///
/// ## Resources
/// - [`Error::Allocation`] - the buffer cannot grow
///
/// ## Decoding
/// - [`Error::Malformed`] - inconsistent table or vtable encoding
/// - [`Error::OutOfBounds`] - a read would run past the end of the buffer
#[derive(Error, Debug)]
pub enum Error {
    /// The builder's frame stack does not permit the requested operation.
    #[error("invalid table nesting: {message}")]
    Nesting { message: String },

    /// A field was added more than once to the same open table.
    #[error("field `{name}` is already set")]
    DuplicateField { name: String },

    /// An offset field referenced a table that has not been finalized in
    /// this buffer. Children must be fully built before a parent can
    /// reference them.
    #[error("field `{name}` references a table that is not finalized in this buffer")]
    Ordering { name: String },

    /// A field declared `required` by the schema was never set when
    /// `end_table` was called.
    #[error("required field `{name}` was never set")]
    RequiredField { name: String },

    /// The ordinal does not name a field in the open table's schema.
    #[error("unknown field ordinal {ordinal}")]
    UnknownField { ordinal: u16 },

    /// The value's type does not match the field's declared kind or width.
    #[error("field `{name}` type mismatch: expected {expected}")]
    FieldType { name: String, expected: String },

    /// A source table graph references itself, directly or transitively,
    /// or nests beyond the supported depth.
    #[error("source table graph at offset {position} is cyclic or nested beyond the supported depth")]
    CyclicReference { position: usize },

    /// The buffer cannot grow to hold the requested bytes.
    #[error("buffer allocation failed: {message}")]
    Allocation { message: String },

    /// The encoded bytes are internally inconsistent.
    #[error("malformed table encoding: {message}")]
    Malformed { message: String },

    /// A read would run past the end of the buffer.
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn nesting(message: impl Into<String>) -> Self {
        Error::Nesting {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed {
            message: message.into(),
        }
    }
}
