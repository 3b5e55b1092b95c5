//! # TableView - Zero-Copy Table Access
//!
//! `TableView` reads a finalized table directly out of the flat buffer: an
//! access is one vtable lookup plus one aligned load, with no
//! deserialization pass. Absent fields read back as the schema's declared
//! default.
//!
//! Input bytes are not trusted: the vtable displacement and vtable bounds
//! are validated at construction, and every field load is bounds-checked
//! against the buffer.
//!
//! ## Thread Safety
//!
//! `TableView` borrows immutably from a byte slice. Any number of views can
//! read the same finished buffer concurrently.

use crate::error::{Error, Result};
use crate::schema::{FieldKind, ScalarType, TableSchema};

#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    data: &'a [u8],
    pos: usize,
    vtable_pos: usize,
    entry_count: u16,
    schema: &'a TableSchema,
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes: [u8; 2] = data
        .get(offset..offset + 2)
        .and_then(|s| s.try_into().ok())
        .ok_or(Error::OutOfBounds { offset, len: 2 })?;
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(Error::OutOfBounds { offset, len: 4 })?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_i32(data: &[u8], offset: usize) -> Result<i32> {
    read_u32(data, offset).map(|v| v as i32)
}

impl<'a> TableView<'a> {
    /// View of the buffer's root table, as stamped by
    /// [`crate::TableBuilder::finish`].
    pub fn root(data: &'a [u8], schema: &'a TableSchema) -> Result<Self> {
        let root = read_u32(data, 0)? as usize;
        Self::at(data, root, schema)
    }

    /// View of the table at `pos`, validating its vtable displacement and
    /// vtable bounds.
    pub fn at(data: &'a [u8], pos: usize, schema: &'a TableSchema) -> Result<Self> {
        let displacement = read_i32(data, pos)?;
        let vtable_pos = pos as i64 - i64::from(displacement);
        if vtable_pos < 0 || vtable_pos as usize + 4 > data.len() {
            return Err(Error::malformed(format!(
                "vtable displacement at table offset {pos} points outside the buffer"
            )));
        }
        let vtable_pos = vtable_pos as usize;
        let vtable_len = read_u16(data, vtable_pos)? as usize;
        if vtable_len < 4 || vtable_len % 2 != 0 || vtable_pos + vtable_len > data.len() {
            return Err(Error::malformed(format!(
                "vtable at offset {vtable_pos} has invalid length {vtable_len}"
            )));
        }
        let table_len = read_u16(data, vtable_pos + 2)? as usize;
        if table_len < 4 || pos + table_len > data.len() {
            return Err(Error::malformed(format!(
                "table of {table_len} bytes at offset {pos} runs past the end of the buffer"
            )));
        }
        Ok(Self {
            data,
            pos,
            vtable_pos,
            entry_count: ((vtable_len - 4) / 2) as u16,
            schema,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn schema(&self) -> &'a TableSchema {
        self.schema
    }

    /// Buffer position of this table; the value its `TableOffset` carried
    /// at construction time.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Vtable entry for `ordinal`: 0 when absent, else the field's byte
    /// offset from the table start. Ordinals beyond the stored entry list
    /// are absent, which is what keeps additively-extended schemas readable.
    pub fn entry(&self, ordinal: u16) -> u16 {
        if ordinal >= self.entry_count {
            return 0;
        }
        let at = self.vtable_pos + 4 + 2 * ordinal as usize;
        u16::from_le_bytes([self.data[at], self.data[at + 1]])
    }

    pub fn is_present(&self, ordinal: u16) -> bool {
        self.entry(ordinal) != 0
    }

    /// Raw bit pattern of a present scalar field, `None` when elided.
    pub(crate) fn scalar_field_bits(&self, ordinal: u16) -> Result<Option<u64>> {
        let desc = self
            .schema
            .field(ordinal)
            .ok_or(Error::UnknownField { ordinal })?;
        let ty = match desc.kind() {
            FieldKind::Scalar(ty) => *ty,
            FieldKind::Table(_) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: "table offset".to_string(),
                });
            }
        };
        let entry = self.entry(ordinal);
        if entry == 0 {
            return Ok(None);
        }
        let offset = self.pos + entry as usize;
        let size = ty.size();
        let bytes = self
            .data
            .get(offset..offset + size)
            .ok_or(Error::OutOfBounds { offset, len: size })?;
        let mut bits = [0u8; 8];
        bits[..size].copy_from_slice(bytes);
        Ok(Some(u64::from_le_bytes(bits)))
    }

    fn scalar_or_default(&self, ordinal: u16, expected: ScalarType) -> Result<u64> {
        let desc = self
            .schema
            .field(ordinal)
            .ok_or(Error::UnknownField { ordinal })?;
        match desc.kind() {
            FieldKind::Scalar(ty) if *ty == expected => {}
            FieldKind::Scalar(ty) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: ty.name().to_string(),
                });
            }
            FieldKind::Table(_) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: "table offset".to_string(),
                });
            }
        }
        Ok(self
            .scalar_field_bits(ordinal)?
            .unwrap_or(desc.default_bits()))
    }

    pub fn get_bool(&self, ordinal: u16) -> Result<bool> {
        Ok(self.scalar_or_default(ordinal, ScalarType::Bool)? != 0)
    }

    pub fn get_u8(&self, ordinal: u16) -> Result<u8> {
        Ok(self.scalar_or_default(ordinal, ScalarType::U8)? as u8)
    }

    pub fn get_i8(&self, ordinal: u16) -> Result<i8> {
        Ok(self.scalar_or_default(ordinal, ScalarType::I8)? as u8 as i8)
    }

    pub fn get_u16(&self, ordinal: u16) -> Result<u16> {
        Ok(self.scalar_or_default(ordinal, ScalarType::U16)? as u16)
    }

    pub fn get_i16(&self, ordinal: u16) -> Result<i16> {
        Ok(self.scalar_or_default(ordinal, ScalarType::I16)? as u16 as i16)
    }

    pub fn get_u32(&self, ordinal: u16) -> Result<u32> {
        Ok(self.scalar_or_default(ordinal, ScalarType::U32)? as u32)
    }

    pub fn get_i32(&self, ordinal: u16) -> Result<i32> {
        Ok(self.scalar_or_default(ordinal, ScalarType::I32)? as u32 as i32)
    }

    pub fn get_u64(&self, ordinal: u16) -> Result<u64> {
        self.scalar_or_default(ordinal, ScalarType::U64)
    }

    pub fn get_i64(&self, ordinal: u16) -> Result<i64> {
        Ok(self.scalar_or_default(ordinal, ScalarType::I64)? as i64)
    }

    pub fn get_f32(&self, ordinal: u16) -> Result<f32> {
        Ok(f32::from_bits(
            self.scalar_or_default(ordinal, ScalarType::F32)? as u32,
        ))
    }

    pub fn get_f64(&self, ordinal: u16) -> Result<f64> {
        Ok(f64::from_bits(
            self.scalar_or_default(ordinal, ScalarType::F64)?,
        ))
    }

    /// View of a child table, `None` when the field is absent.
    pub fn get_table(&self, ordinal: u16) -> Result<Option<TableView<'a>>> {
        let desc = self
            .schema
            .field(ordinal)
            .ok_or(Error::UnknownField { ordinal })?;
        let child_schema = match desc.kind() {
            FieldKind::Table(schema) => schema.as_ref(),
            FieldKind::Scalar(ty) => {
                return Err(Error::FieldType {
                    name: desc.name().to_string(),
                    expected: ty.name().to_string(),
                });
            }
        };
        let entry = self.entry(ordinal);
        if entry == 0 {
            return Ok(None);
        }
        let field_pos = self.pos + entry as usize;
        let displacement = read_i32(self.data, field_pos)?;
        let child_pos = field_pos as i64 - i64::from(displacement);
        if child_pos < 0 || child_pos as usize >= self.data.len() {
            return Err(Error::malformed(format!(
                "field `{}` displacement points outside the buffer",
                desc.name()
            )));
        }
        Self::at(self.data, child_pos as usize, child_schema).map(Some)
    }
}

/// Identifier tag stamped after the root offset, if the buffer is long
/// enough to carry one. Buffers written without an identifier return
/// whatever bytes sit there, so prefer [`identifier_matches`] against a
/// known tag.
pub fn read_identifier(data: &[u8]) -> Option<[u8; 4]> {
    let bytes: [u8; 4] = data.get(4..8)?.try_into().ok()?;
    Some(bytes)
}

/// Whether the buffer carries `tag` as its identifier.
pub fn identifier_matches(data: &[u8], tag: &str) -> bool {
    read_identifier(data).is_some_and(|id| id.as_slice() == tag.as_bytes())
}
