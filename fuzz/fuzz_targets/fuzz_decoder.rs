//! Fuzz testing for the table decoder and clone engine.
//!
//! This fuzz target feeds arbitrary byte sequences to TableView to ensure
//! malformed input is rejected with typed errors rather than panics, and
//! runs the clone engine over whatever parses so cyclic or deeply nested
//! source graphs are rejected instead of recursing unboundedly.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flattable::{FieldDescriptor, ScalarType, TableBuilder, TableSchema, TableView};

#[derive(Debug, Arbitrary)]
struct DecoderInput {
    scalar_types: Vec<FuzzScalarType>,
    nested: bool,
    data: Vec<u8>,
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

fuzz_target!(|input: DecoderInput| {
    if input.scalar_types.len() > 32 {
        return;
    }

    let mut fields: Vec<FieldDescriptor> = input
        .scalar_types
        .iter()
        .enumerate()
        .map(|(i, ty)| FieldDescriptor::scalar(format!("field{}", i), (*ty).into()))
        .collect();
    if input.nested {
        // A self-describing buffer can claim any displacement; the child
        // schema reuses the same shape one level down so traversal and
        // clone exercise the cycle guard.
        let child = Arc::new(TableSchema::new(fields.clone()));
        fields.push(FieldDescriptor::table("child", child));
    }
    let schema = TableSchema::new(fields);

    let Ok(view) = TableView::root(&input.data, &schema) else {
        return;
    };

    for ordinal in 0..schema.field_count() as u16 {
        let _ = view.is_present(ordinal);
        let _ = view.get_bool(ordinal);
        let _ = view.get_u32(ordinal);
        let _ = view.get_u64(ordinal);
        let _ = view.get_f64(ordinal);
        if let Ok(Some(child)) = view.get_table(ordinal) {
            for child_ordinal in 0..child.schema().field_count() as u16 {
                let _ = child.get_u64(child_ordinal);
            }
        }
    }

    let mut builder = TableBuilder::new();
    let _ = builder.clone_table(&view);
});
