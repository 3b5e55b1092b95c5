//! # flattable - Self-Describing Flat Table Encoding
//!
//! flattable serializes structured records (named scalar fields with types
//! and defaults) into a compact flat byte buffer that is readable without a
//! deserialization pass. One generic engine, parameterized by a per-record
//! [`TableSchema`], replaces per-record generated builder code:
//!
//! - **Default elision**: a field equal to its declared default occupies no
//!   wire space; readers substitute the default
//! - **Shared layout descriptors**: structurally identical tables reference
//!   one interned vtable
//! - **Relative addressing**: every stored offset is a signed displacement,
//!   so the buffer is relocatable during construction
//! - **Clone with deduplication**: rebuilding a table from a decoded view
//!   reuses identical encodings already in the buffer
//!
//! ## Quick Start
//!
//! ```ignore
//! use flattable::{FieldDescriptor, ScalarType, TableBuilder, TableSchema, TableView};
//!
//! let schema = TableSchema::new(vec![
//!     FieldDescriptor::scalar("received_at", ScalarType::U32),
//!     FieldDescriptor::scalar("reactions", ScalarType::U32),
//!     FieldDescriptor::scalar("zap_total", ScalarType::U64),
//! ]);
//!
//! let mut builder = TableBuilder::new();
//! builder.start_table(&schema)?;
//! builder.add_u32(1, 5)?;
//! let stats = builder.end_table()?;
//! let bytes = builder.finish(stats)?;
//!
//! let view = TableView::root(&bytes, &schema)?;
//! assert_eq!(view.get_u32(1)?, 5);
//! assert_eq!(view.get_u32(0)?, 0); // absent, declared default
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Record Layer (caller schemas)      │
//! ├─────────────────────────────────────────┤
//! │  TableBuilder state machine │ TableView │
//! ├─────────────────────────────┴───────────┤
//! │   Clone/Pick Engine + Memoization       │
//! ├─────────────────────────────────────────┤
//! │  Layout Assignment │ Vtable Interning   │
//! ├─────────────────────────────────────────┤
//! │        Growable Byte Buffer             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Construction is single-writer and strictly post-order: a child table is
//! finalized (and its offset minted) before any parent references it.
//! Independent builders share nothing and may run on separate threads; a
//! finished buffer is immutable and freely shareable.

pub mod buffer;
pub mod config;
pub mod error;
pub mod schema;
pub mod table;

pub use buffer::ByteBuffer;
pub use config::{BufferConfig, DEFAULT_FILE_EXTENSION, MAX_FIELD_COUNT, MAX_NESTING_DEPTH};
pub use error::{Error, Result};
pub use schema::{FieldDescriptor, FieldKind, ScalarType, TableSchema};
pub use table::{identifier_matches, read_identifier, TableBuilder, TableOffset, TableView};
