//! # TableBuilder - Table Construction
//!
//! `TableBuilder` is the state machine governing construction: a stack of
//! open table frames over one growing buffer. Fields are staged in the
//! innermost frame and nothing is written until `end_table`, which assigns
//! the layout, interns the vtable, writes the packed body, and returns a
//! [`TableOffset`] the parent (or `finish`) consumes.
//!
//! Children are always finalized before the parent that references them;
//! `add_table` rejects any offset that is not a finalized table of this
//! buffer. Sibling construction is strictly sequential: only the innermost
//! frame accepts fields.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = TableBuilder::new();
//! builder.start_table(&schema)?;
//! builder.add_u32(1, 5)?;
//! builder.add_u32(3, 2)?;
//! let stats = builder.end_table()?;
//! let bytes = builder.finish(stats)?;
//! ```

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::buffer::ByteBuffer;
use crate::config::{BufferConfig, DEFAULT_BUFFER_CAPACITY, MAX_NESTING_DEPTH};
use crate::error::{Error, Result};
use crate::schema::{FieldKind, ScalarType, TableSchema};
use crate::table::vtable::{assign_layout, LayoutImage, ResolvedField, ResolvedValue, VtableCache};

/// Position of a finalized table, relative to the start of its buffer.
///
/// Only minted by [`TableBuilder::end_table`] (and the clone engine); the
/// table it names is immutable for the lifetime of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableOffset(pub(crate) u32);

impl TableOffset {
    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Slot {
    Unset,
    /// Set to exactly the declared default; occupies no wire space but
    /// still counts as set for duplicate and required checks.
    Elided,
    Scalar(u64),
    Child(TableOffset),
}

#[derive(Debug)]
pub(crate) struct Frame<'s> {
    pub schema: &'s TableSchema,
    pub slots: SmallVec<[Slot; 16]>,
}

pub struct TableBuilder<'s> {
    pub(crate) buf: ByteBuffer,
    pub(crate) vtables: VtableCache,
    pub(crate) memo: HashMap<Vec<u8>, TableOffset>,
    pub(crate) finished: HashSet<u32>,
    pub(crate) frames: Vec<Frame<'s>>,
    config: BufferConfig,
}

impl Default for TableBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> TableBuilder<'s> {
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    pub fn with_config(config: BufferConfig) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, config)
    }

    pub fn with_capacity(capacity: usize, config: BufferConfig) -> Self {
        let mut buf = ByteBuffer::with_capacity(capacity.max(config.header_len()));
        buf.append_zeros(config.header_len());
        if let Some(id) = config.file_identifier {
            buf.write_bytes(4, &id);
        }
        Self {
            buf,
            vtables: VtableCache::default(),
            memo: HashMap::new(),
            finished: HashSet::new(),
            frames: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Bytes used so far, padding included.
    pub fn buffer_len(&self) -> usize {
        self.buf.position()
    }

    /// Number of distinct layout descriptors written so far.
    pub fn vtable_count(&self) -> usize {
        self.vtables.len()
    }

    pub fn is_finalized(&self, table: TableOffset) -> bool {
        self.finished.contains(&table.0)
    }

    /// Open a new table frame. Tables nest, but only the innermost frame
    /// accepts fields until its `end_table`.
    pub fn start_table(&mut self, schema: &'s TableSchema) -> Result<()> {
        if self.frames.len() >= MAX_NESTING_DEPTH {
            return Err(Error::nesting(format!(
                "table nesting deeper than {MAX_NESTING_DEPTH}"
            )));
        }
        self.frames.push(Frame {
            schema,
            slots: SmallVec::from_elem(Slot::Unset, schema.field_count()),
        });
        Ok(())
    }

    pub fn add_bool(&mut self, ordinal: u16, value: bool) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value), ScalarType::Bool)
    }

    pub fn add_u8(&mut self, ordinal: u16, value: u8) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value), ScalarType::U8)
    }

    pub fn add_i8(&mut self, ordinal: u16, value: i8) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value as u8), ScalarType::I8)
    }

    pub fn add_u16(&mut self, ordinal: u16, value: u16) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value), ScalarType::U16)
    }

    pub fn add_i16(&mut self, ordinal: u16, value: i16) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value as u16), ScalarType::I16)
    }

    pub fn add_u32(&mut self, ordinal: u16, value: u32) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value), ScalarType::U32)
    }

    pub fn add_i32(&mut self, ordinal: u16, value: i32) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value as u32), ScalarType::I32)
    }

    pub fn add_u64(&mut self, ordinal: u16, value: u64) -> Result<()> {
        self.add_scalar_bits(ordinal, value, ScalarType::U64)
    }

    pub fn add_i64(&mut self, ordinal: u16, value: i64) -> Result<()> {
        self.add_scalar_bits(ordinal, value as u64, ScalarType::I64)
    }

    pub fn add_f32(&mut self, ordinal: u16, value: f32) -> Result<()> {
        self.add_scalar_bits(ordinal, u64::from(value.to_bits()), ScalarType::F32)
    }

    pub fn add_f64(&mut self, ordinal: u16, value: f64) -> Result<()> {
        self.add_scalar_bits(ordinal, value.to_bits(), ScalarType::F64)
    }

    /// Reference a finalized child table from an offset-typed field.
    pub fn add_table(&mut self, ordinal: u16, child: TableOffset) -> Result<()> {
        let finalized = self.finished.contains(&child.0);
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| Error::nesting("no table is open"))?;
        let desc = frame
            .schema
            .field(ordinal)
            .ok_or(Error::UnknownField { ordinal })?;
        match desc.kind() {
            FieldKind::Table(_) => {}
            FieldKind::Scalar(ty) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: ty.name().to_string(),
                });
            }
        }
        if !finalized {
            return Err(Error::Ordering {
                name: desc.name().to_string(),
            });
        }
        let slot = &mut frame.slots[ordinal as usize];
        if !matches!(slot, Slot::Unset) {
            return Err(Error::DuplicateField {
                name: desc.name().to_string(),
            });
        }
        *slot = Slot::Child(child);
        Ok(())
    }

    pub(crate) fn add_scalar_bits(&mut self, ordinal: u16, bits: u64, ty: ScalarType) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| Error::nesting("no table is open"))?;
        let desc = frame
            .schema
            .field(ordinal)
            .ok_or(Error::UnknownField { ordinal })?;
        let declared = match desc.kind() {
            FieldKind::Scalar(declared) => *declared,
            FieldKind::Table(_) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: "table offset".to_string(),
                });
            }
        };
        if declared != ty {
            return Err(Error::FieldType {
                name: desc.name().to_string(),
                expected: declared.name().to_string(),
            });
        }
        let default = desc.default_bits();
        let name = desc.name();
        let slot = &mut frame.slots[ordinal as usize];
        if !matches!(slot, Slot::Unset) {
            return Err(Error::DuplicateField {
                name: name.to_string(),
            });
        }
        *slot = if bits == default {
            Slot::Elided
        } else {
            Slot::Scalar(bits)
        };
        Ok(())
    }

    /// Close the innermost table: check required fields, assign the layout,
    /// intern the vtable, write the body, and return the table's offset.
    pub fn end_table(&mut self) -> Result<TableOffset> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::nesting("end_table without a matching start_table"))?;

        for (ordinal, desc) in frame.schema.fields().iter().enumerate() {
            if desc.is_required() && matches!(frame.slots[ordinal], Slot::Unset) {
                return Err(Error::RequiredField {
                    name: desc.name().to_string(),
                });
            }
        }

        let mut resolved: Vec<ResolvedField> = Vec::with_capacity(frame.slots.len());
        for (ordinal, slot) in frame.slots.iter().enumerate() {
            let value = match slot {
                Slot::Unset | Slot::Elided => continue,
                Slot::Scalar(bits) => ResolvedValue::Bits(*bits),
                Slot::Child(child) => ResolvedValue::Child(*child),
            };
            let desc = &frame.schema.fields()[ordinal];
            resolved.push(ResolvedField {
                ordinal: ordinal as u16,
                size: desc.size(),
                align: desc.align(),
                offset: 0,
                value,
            });
        }

        let layout = assign_layout(frame.schema.field_count(), &mut resolved)?;
        self.emit_table(layout, &resolved)
    }

    /// Write one fully resolved table. Shared by `end_table` and the clone
    /// engine; `fields` must already be in placement order with offsets
    /// assigned.
    pub(crate) fn emit_table(
        &mut self,
        layout: LayoutImage,
        fields: &[ResolvedField],
    ) -> Result<TableOffset> {
        let vtable_pos = self.vtables.intern(layout.vtable_bytes, &mut self.buf)?;
        let pos = self.buf.reserve(layout.table_len, layout.table_align)?;
        self.buf
            .write_i32(pos, (i64::from(pos) - i64::from(vtable_pos)) as i32);
        for field in fields {
            let at = pos + u32::from(field.offset);
            match field.value {
                ResolvedValue::Bits(bits) => self.buf.write_scalar_bits(at, bits, field.size),
                ResolvedValue::Child(child) => {
                    self.buf
                        .write_i32(at, (i64::from(at) - i64::from(child.0)) as i32);
                }
            }
        }
        self.finished.insert(pos);
        Ok(TableOffset(pos))
    }

    /// Stamp the root offset into the header and release the buffer.
    /// Fails if any table is still open.
    pub fn finish(mut self, root: TableOffset) -> Result<Vec<u8>> {
        if !self.frames.is_empty() {
            return Err(Error::nesting(format!(
                "{} table(s) still open at finish",
                self.frames.len()
            )));
        }
        if !self.finished.contains(&root.0) {
            return Err(Error::Ordering {
                name: "root".to_string(),
            });
        }
        self.buf.patch_u32(0, root.0);
        Ok(self.buf.into_vec())
    }
}
