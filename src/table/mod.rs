//! # Flat Table Encoding
//!
//! This module is the encoding engine: schema-driven construction of
//! self-describing flat tables inside one growing buffer, plus the zero-copy
//! read side the clone engine and consumers share.
//!
//! ## Buffer Layout
//!
//! ```text
//! +-------------+----------------+---------+-----------+---------+-----------+
//! | Root Offset | Identifier Tag | Vtable  | Table     | Vtable  | Table ... |
//! | (u32)       | [u8; 4], opt.  |         |           |         |           |
//! +-------------+----------------+---------+-----------+---------+-----------+
//! ```
//!
//! Children are finalized before the parents that reference them, so tables
//! appear in post-order. Structurally identical layouts share one vtable.
//!
//! ## Table Layout
//!
//! ```text
//! +--------------------+----------------------------------+
//! | Vtable Displacement| Present Fields (packed, aligned) |
//! | (i32)              | [u8; ...]                        |
//! +--------------------+----------------------------------+
//! ```
//!
//! | Component | Type | Description |
//! |-----------|------|-------------|
//! | **Vtable Displacement** | `i32` | `table_pos - vtable_pos` |
//! | **Field slot** | scalar or `i32` | scalars at native size; offset fields store `field_pos - child_pos` |
//!
//! ## Vtable Layout
//!
//! ```text
//! +-------------+--------------+---------------------------+
//! | Vtable Len  | Table Len    | Entry per declared ordinal|
//! | (u16)       | (u16)        | [u16; N]                  |
//! +-------------+--------------+---------------------------+
//! ```
//!
//! An entry of `0` means the field is absent and readers substitute the
//! schema's declared default; any other value is the field's byte offset
//! from the table start. A field set to exactly its default is elided, so
//! explicit-default and never-set are indistinguishable on the wire.
//!
//! ## Design Goals
//!
//! 1. **Readable without deserialization**: every access is an offset
//!    computation over the flat buffer
//! 2. **Deterministic**: identical construction calls produce identical bytes
//! 3. **Compact**: defaults elided, layouts shared, clones deduplicated
//! 4. **Relocatable**: all stored offsets are relative displacements
//!
//! ## Module Structure
//!
//! - `builder`: [`TableBuilder`] state machine and [`TableOffset`]
//! - `vtable`: layout assignment and the vtable interning cache
//! - `view`: [`TableView`] zero-copy reader
//! - `clone`: clone/pick reconstruction with memoization

pub mod builder;
pub mod clone;
pub mod view;
pub(crate) mod vtable;

pub use builder::{TableBuilder, TableOffset};
pub use view::{identifier_matches, read_identifier, TableView};
