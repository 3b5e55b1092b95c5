//! Fuzz testing for the table builder and encoding engine.
//!
//! This fuzz target drives TableBuilder with arbitrary operation sequences
//! to ensure construction either succeeds or fails with a typed error, and
//! that every buffer it does produce decodes without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flattable::{FieldDescriptor, ScalarType, TableBuilder, TableSchema, TableView};

#[derive(Debug, Arbitrary)]
struct BuilderInput {
    schema: Vec<FuzzField>,
    operations: Vec<BuilderOperation>,
}

#[derive(Debug, Arbitrary)]
struct FuzzField {
    scalar_type: FuzzScalarType,
    default_bits: u64,
    required: bool,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzScalarType {
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

#[derive(Debug, Arbitrary)]
enum BuilderOperation {
    Start,
    AddBool(u8, bool),
    AddU8(u8, u8),
    AddI8(u8, i8),
    AddU16(u8, u16),
    AddI16(u8, i16),
    AddU32(u8, u32),
    AddI32(u8, i32),
    AddU64(u8, u64),
    AddI64(u8, i64),
    AddF32(u8, f32),
    AddF64(u8, f64),
    AddLastTable(u8),
    End,
}

impl From<FuzzScalarType> for ScalarType {
    fn from(fst: FuzzScalarType) -> Self {
        match fst {
            FuzzScalarType::Bool => ScalarType::Bool,
            FuzzScalarType::U8 => ScalarType::U8,
            FuzzScalarType::I8 => ScalarType::I8,
            FuzzScalarType::U16 => ScalarType::U16,
            FuzzScalarType::I16 => ScalarType::I16,
            FuzzScalarType::U32 => ScalarType::U32,
            FuzzScalarType::I32 => ScalarType::I32,
            FuzzScalarType::U64 => ScalarType::U64,
            FuzzScalarType::I64 => ScalarType::I64,
            FuzzScalarType::F32 => ScalarType::F32,
            FuzzScalarType::F64 => ScalarType::F64,
        }
    }
}

fuzz_target!(|input: BuilderInput| {
    if input.schema.is_empty() || input.schema.len() > 32 {
        return;
    }

    let fields: Vec<FieldDescriptor> = input
        .schema
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let desc = FieldDescriptor::scalar(format!("field{}", i), field.scalar_type.into())
                .with_default_bits(field.default_bits);
            if field.required {
                desc.required()
            } else {
                desc
            }
        })
        .collect();

    let schema = TableSchema::new(fields);
    let mut builder = TableBuilder::new();
    let mut last_table = None;

    for op in &input.operations {
        let result = match op {
            BuilderOperation::Start => builder.start_table(&schema),
            BuilderOperation::AddBool(ord, v) => builder.add_bool(u16::from(*ord), *v),
            BuilderOperation::AddU8(ord, v) => builder.add_u8(u16::from(*ord), *v),
            BuilderOperation::AddI8(ord, v) => builder.add_i8(u16::from(*ord), *v),
            BuilderOperation::AddU16(ord, v) => builder.add_u16(u16::from(*ord), *v),
            BuilderOperation::AddI16(ord, v) => builder.add_i16(u16::from(*ord), *v),
            BuilderOperation::AddU32(ord, v) => builder.add_u32(u16::from(*ord), *v),
            BuilderOperation::AddI32(ord, v) => builder.add_i32(u16::from(*ord), *v),
            BuilderOperation::AddU64(ord, v) => builder.add_u64(u16::from(*ord), *v),
            BuilderOperation::AddI64(ord, v) => builder.add_i64(u16::from(*ord), *v),
            BuilderOperation::AddF32(ord, v) => builder.add_f32(u16::from(*ord), *v),
            BuilderOperation::AddF64(ord, v) => builder.add_f64(u16::from(*ord), *v),
            BuilderOperation::AddLastTable(ord) => match last_table {
                Some(table) => builder.add_table(u16::from(*ord), table),
                None => Ok(()),
            },
            BuilderOperation::End => match builder.end_table() {
                Ok(table) => {
                    last_table = Some(table);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };
        // Errors are part of the contract; panics are not.
        let _ = result;
    }

    if let Some(table) = last_table {
        if let Ok(bytes) = builder.finish(table) {
            if let Ok(view) = TableView::root(&bytes, &schema) {
                for ordinal in 0..schema.field_count() as u16 {
                    let _ = view.get_bool(ordinal);
                    let _ = view.get_u64(ordinal);
                    let _ = view.is_present(ordinal);
                }
            }
        }
    }
});
