//! # Configuration
//!
//! Centralizes the crate's limits and the per-session [`BufferConfig`].
//! Constants that depend on each other are co-located so their relationships
//! stay visible.
//!
//! ```text
//! MAX_BUFFER_SIZE (i32::MAX)
//!       │
//!       └─> All stored displacements are signed 32-bit. Keeping the buffer
//!           below 2 GiB guarantees any table-to-vtable or field-to-child
//!           displacement fits an i32 without wrapping.
//!
//! MAX_NESTING_DEPTH (16)
//!       │
//!       ├─> Bounds the builder's frame stack (start_table fails beyond it)
//!       └─> Bounds the clone engine's recursion over source tables
//!
//! MAX_FIELD_COUNT (4096)
//!       │
//!       └─> Keeps every vtable length and field offset inside the 16-bit
//!           entries the layout descriptor uses
//! ```

use crate::error::{Error, Result};

/// Maximum total buffer size in bytes. Displacements are signed 32-bit.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Maximum depth of nested table construction, and of clone recursion over
/// source tables.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Maximum number of fields a single table schema may declare.
pub const MAX_FIELD_COUNT: usize = 4096;

/// Initial capacity of a builder's buffer when none is requested.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Byte length of the optional buffer identifier tag.
pub const FILE_IDENTIFIER_LEN: usize = 4;

/// Advisory file extension for buffers written by sessions that do not
/// override it.
pub const DEFAULT_FILE_EXTENSION: &str = "bin";

/// Per-session buffer metadata.
///
/// The identifier tag, when present, is stamped into the buffer header right
/// after the root offset so consumers can sanity-check what they were handed.
/// The extension is advisory metadata for the consuming ecosystem; neither
/// value participates in the encoding algorithm itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub file_identifier: Option<[u8; FILE_IDENTIFIER_LEN]>,
    pub file_extension: &'static str,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            file_identifier: None,
            file_extension: DEFAULT_FILE_EXTENSION,
        }
    }
}

impl BufferConfig {
    /// Config with an identifier tag taken from the first four bytes of
    /// `tag`. Fails if `tag` is not exactly four ASCII bytes.
    pub fn with_identifier(tag: &str) -> Result<Self> {
        let bytes = tag.as_bytes();
        if bytes.len() != FILE_IDENTIFIER_LEN || !bytes.iter().all(u8::is_ascii) {
            return Err(Error::malformed(format!(
                "file identifier must be exactly {FILE_IDENTIFIER_LEN} ASCII bytes, got {:?}",
                tag
            )));
        }
        let mut id = [0u8; FILE_IDENTIFIER_LEN];
        id.copy_from_slice(bytes);
        Ok(Self {
            file_identifier: Some(id),
            ..Self::default()
        })
    }

    /// Byte length of the buffer header this config produces: the root
    /// offset slot plus the identifier tag when one is configured.
    pub fn header_len(&self) -> usize {
        match self.file_identifier {
            Some(_) => 4 + FILE_IDENTIFIER_LEN,
            None => 4,
        }
    }
}
