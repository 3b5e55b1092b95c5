//! # Schema Definition
//!
//! A [`TableSchema`] is the ordered list of [`FieldDescriptor`]s for one
//! record type. The builder validates every `add_*` call against it, and the
//! view uses it to type reads and substitute declared defaults for absent
//! fields. Ordinals are positions in the field list and double as indices
//! into each table's layout descriptor.
//!
//! Schemas are constructed once per record type and shared; offset-typed
//! fields embed an `Arc` to the child record's schema so views and the clone
//! engine can traverse nested tables without caller assistance.
//!
//! Defaults are stored as bit patterns. Elision compares bit patterns, not
//! numeric values, so a NaN default is honored bit-for-bit.

use std::sync::Arc;

use crate::config::MAX_FIELD_COUNT;

/// Scalar field types, stored at native size and alignment.
///
/// | Type | Size (bytes) |
/// |------|--------------|
/// | Bool, U8, I8 | 1 |
/// | U16, I16 | 2 |
/// | U32, I32, F32 | 4 |
/// | U64, I64, F64 | 8 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ScalarType {
    pub fn size(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::F64 => 8,
        }
    }

    /// Alignment equals size for every scalar type.
    pub fn align(self) -> usize {
        self.size()
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::U8 => "u8",
            ScalarType::I8 => "i8",
            ScalarType::U16 => "u16",
            ScalarType::I16 => "i16",
            ScalarType::U32 => "u32",
            ScalarType::I32 => "i32",
            ScalarType::U64 => "u64",
            ScalarType::I64 => "i64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }
}

/// What a field slot holds: an inline scalar or an offset to a child table.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarType),
    Table(Arc<TableSchema>),
}

/// One named slot in a record type's logical schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) default_bits: u64,
    pub(crate) required: bool,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(ty),
            default_bits: 0,
            required: false,
        }
    }

    /// An offset-typed field referencing a child record type.
    pub fn table(name: impl Into<String>, schema: Arc<TableSchema>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Table(schema),
            default_bits: 0,
            required: false,
        }
    }

    /// Declare the default as a raw bit pattern.
    pub fn with_default_bits(mut self, bits: u64) -> Self {
        self.default_bits = bits;
        self
    }

    pub fn with_default_bool(self, value: bool) -> Self {
        self.with_default_bits(u64::from(value))
    }

    pub fn with_default_u32(self, value: u32) -> Self {
        self.with_default_bits(u64::from(value))
    }

    pub fn with_default_i32(self, value: i32) -> Self {
        self.with_default_bits(u64::from(value as u32))
    }

    pub fn with_default_u64(self, value: u64) -> Self {
        self.with_default_bits(value)
    }

    pub fn with_default_i64(self, value: i64) -> Self {
        self.with_default_bits(value as u64)
    }

    pub fn with_default_f32(self, value: f32) -> Self {
        self.with_default_bits(u64::from(value.to_bits()))
    }

    pub fn with_default_f64(self, value: f64) -> Self {
        self.with_default_bits(value.to_bits())
    }

    /// Mark the field as required: `end_table` fails if it was never set.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_bits(&self) -> u64 {
        self.default_bits
    }

    /// Storage size within a table body. Offset fields store a signed
    /// 32-bit displacement.
    pub(crate) fn size(&self) -> usize {
        match &self.kind {
            FieldKind::Scalar(ty) => ty.size(),
            FieldKind::Table(_) => 4,
        }
    }

    pub(crate) fn align(&self) -> usize {
        match &self.kind {
            FieldKind::Scalar(ty) => ty.align(),
            FieldKind::Table(_) => 4,
        }
    }
}

/// The schema of one record type: an ordered field list.
#[derive(Debug, Clone)]
pub struct TableSchema {
    fields: Vec<FieldDescriptor>,
}

impl TableSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        assert!(
            fields.len() <= MAX_FIELD_COUNT,
            "a table schema may declare at most {MAX_FIELD_COUNT} fields"
        );
        Self { fields }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, ordinal: u16) -> Option<&FieldDescriptor> {
        self.fields.get(ordinal as usize)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}
