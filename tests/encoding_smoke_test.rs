//! # Encoding Smoke Test
//!
//! End-to-end coverage of the public encoding surface: table construction,
//! default elision, layout sharing, clone/pick reconstruction, memoization,
//! and the error contract. Everything here goes through the public API the
//! way a generated record layer would.

use std::sync::Arc;

use flattable::{
    identifier_matches, BufferConfig, Error, FieldDescriptor, ScalarType, TableBuilder,
    TableSchema, TableView,
};

/// Stats record: five 32-bit counters and one 64-bit total.
fn stats_schema() -> TableSchema {
    TableSchema::new(vec![
        FieldDescriptor::scalar("received_at", ScalarType::U32),
        FieldDescriptor::scalar("reactions", ScalarType::U32),
        FieldDescriptor::scalar("quotes", ScalarType::U32),
        FieldDescriptor::scalar("reposts", ScalarType::U32),
        FieldDescriptor::scalar("zaps", ScalarType::U32),
        FieldDescriptor::scalar("zap_total", ScalarType::U64),
    ])
}

const RECEIVED_AT: u16 = 0;
const REACTIONS: u16 = 1;
const QUOTES: u16 = 2;
const REPOSTS: u16 = 3;
const ZAPS: u16 = 4;
const ZAP_TOTAL: u16 = 5;

fn encode_stats(values: [u64; 6]) -> Vec<u8> {
    let schema = stats_schema();
    let mut builder = TableBuilder::new();
    builder.start_table(&schema).unwrap();
    builder.add_u32(RECEIVED_AT, values[0] as u32).unwrap();
    builder.add_u32(REACTIONS, values[1] as u32).unwrap();
    builder.add_u32(QUOTES, values[2] as u32).unwrap();
    builder.add_u32(REPOSTS, values[3] as u32).unwrap();
    builder.add_u32(ZAPS, values[4] as u32).unwrap();
    builder.add_u64(ZAP_TOTAL, values[5]).unwrap();
    let table = builder.end_table().unwrap();
    builder.finish(table).unwrap()
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn all_fields_set_read_back_exactly() {
        let bytes = encode_stats([1_700_000_000, 12, 3, 7, 2, 55_000]);
        let schema = stats_schema();
        let view = TableView::root(&bytes, &schema).unwrap();

        assert_eq!(view.get_u32(RECEIVED_AT).unwrap(), 1_700_000_000);
        assert_eq!(view.get_u32(REACTIONS).unwrap(), 12);
        assert_eq!(view.get_u32(QUOTES).unwrap(), 3);
        assert_eq!(view.get_u32(REPOSTS).unwrap(), 7);
        assert_eq!(view.get_u32(ZAPS).unwrap(), 2);
        assert_eq!(view.get_u64(ZAP_TOTAL).unwrap(), 55_000);
    }

    #[test]
    fn sparse_record_reads_defaults_for_unset_counters() {
        let bytes = encode_stats([0, 5, 0, 2, 0, 0]);
        let schema = stats_schema();
        let view = TableView::root(&bytes, &schema).unwrap();

        let present: Vec<u16> = (0..6).filter(|&o| view.is_present(o)).collect();
        assert_eq!(present, vec![REACTIONS, REPOSTS]);

        assert_eq!(view.get_u32(RECEIVED_AT).unwrap(), 0);
        assert_eq!(view.get_u32(REACTIONS).unwrap(), 5);
        assert_eq!(view.get_u32(QUOTES).unwrap(), 0);
        assert_eq!(view.get_u32(REPOSTS).unwrap(), 2);
        assert_eq!(view.get_u32(ZAPS).unwrap(), 0);
        assert_eq!(view.get_u64(ZAP_TOTAL).unwrap(), 0);
    }

    #[test]
    fn boundary_values_survive_the_wire() {
        let bytes = encode_stats([u32::MAX as u64, 0, 0, 0, 0, u64::MAX]);
        let schema = stats_schema();
        let view = TableView::root(&bytes, &schema).unwrap();

        assert_eq!(view.get_u32(RECEIVED_AT).unwrap(), u32::MAX);
        assert_eq!(view.get_u64(ZAP_TOTAL).unwrap(), u64::MAX);
    }
}

mod elision_tests {
    use super::*;

    #[test]
    fn explicit_defaults_cost_no_bytes() {
        let explicit = encode_stats([0, 5, 0, 2, 0, 0]);

        let schema = stats_schema();
        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();
        builder.add_u32(REACTIONS, 5).unwrap();
        builder.add_u32(REPOSTS, 2).unwrap();
        let table = builder.end_table().unwrap();
        let omitted = builder.finish(table).unwrap();

        assert_eq!(explicit, omitted);
    }

    #[test]
    fn custom_defaults_participate_in_elision() {
        let schema = TableSchema::new(vec![
            FieldDescriptor::scalar("retries", ScalarType::U32).with_default_u32(3),
            FieldDescriptor::scalar("enabled", ScalarType::Bool).with_default_bool(true),
        ]);
        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();
        builder.add_u32(0, 3).unwrap();
        builder.add_bool(1, true).unwrap();
        let table = builder.end_table().unwrap();
        let bytes = builder.finish(table).unwrap();

        let view = TableView::root(&bytes, &schema).unwrap();
        assert!(!view.is_present(0));
        assert!(!view.is_present(1));
        assert_eq!(view.get_u32(0).unwrap(), 3);
        assert!(view.get_bool(1).unwrap());
    }
}

mod sharing_tests {
    use super::*;

    #[test]
    fn repeated_layouts_intern_one_vtable() {
        let schema = stats_schema();
        let mut builder = TableBuilder::new();
        for reactions in 1..=10u32 {
            builder.start_table(&schema).unwrap();
            builder.add_u32(REACTIONS, reactions).unwrap();
            builder.end_table().unwrap();
        }
        assert_eq!(builder.vtable_count(), 1);
    }

    #[test]
    fn presence_pattern_changes_add_vtables() {
        let schema = stats_schema();
        let mut builder = TableBuilder::new();

        builder.start_table(&schema).unwrap();
        builder.add_u32(REACTIONS, 1).unwrap();
        builder.end_table().unwrap();

        builder.start_table(&schema).unwrap();
        builder.add_u32(REACTIONS, 1).unwrap();
        builder.add_u64(ZAP_TOTAL, 10).unwrap();
        builder.end_table().unwrap();

        assert_eq!(builder.vtable_count(), 2);
    }
}

mod clone_tests {
    use super::*;

    #[test]
    fn clone_of_a_decoded_record_is_field_for_field_equal() {
        let source_bytes = encode_stats([9, 5, 0, 2, 0, 31]);
        let schema = stats_schema();
        let source = TableView::root(&source_bytes, &schema).unwrap();

        let mut builder = TableBuilder::new();
        let table = builder.clone_table(&source).unwrap();
        let bytes = builder.finish(table).unwrap();
        let view = TableView::root(&bytes, &schema).unwrap();

        for ordinal in 0..5 {
            assert_eq!(
                view.get_u32(ordinal).unwrap(),
                source.get_u32(ordinal).unwrap()
            );
        }
        assert_eq!(
            view.get_u64(ZAP_TOTAL).unwrap(),
            source.get_u64(ZAP_TOTAL).unwrap()
        );
    }

    #[test]
    fn re_cloning_within_one_session_grows_the_buffer_once() {
        let source_bytes = encode_stats([9, 5, 0, 2, 0, 31]);
        let schema = stats_schema();
        let source = TableView::root(&source_bytes, &schema).unwrap();

        let mut builder = TableBuilder::new();
        let first = builder.clone_table(&source).unwrap();
        let used = builder.buffer_len();
        let second = builder.clone_table(&source).unwrap();

        assert_eq!(first, second);
        assert_eq!(builder.buffer_len(), used);
    }

    #[test]
    fn rebuild_with_one_counter_bumped() {
        let source_bytes = encode_stats([9, 5, 0, 2, 0, 31]);
        let schema = stats_schema();
        let source = TableView::root(&source_bytes, &schema).unwrap();

        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();
        builder
            .add_u32(REACTIONS, source.get_u32(REACTIONS).unwrap() + 1)
            .unwrap();
        builder.pick_fields(&source).unwrap();
        let table = builder.end_table().unwrap();
        let bytes = builder.finish(table).unwrap();

        let view = TableView::root(&bytes, &schema).unwrap();
        assert_eq!(view.get_u32(REACTIONS).unwrap(), 6);
        assert_eq!(view.get_u32(RECEIVED_AT).unwrap(), 9);
        assert_eq!(view.get_u32(REPOSTS).unwrap(), 2);
        assert_eq!(view.get_u64(ZAP_TOTAL).unwrap(), 31);
    }

    #[test]
    fn nested_records_clone_with_shared_children_deduplicated() {
        let point = Arc::new(TableSchema::new(vec![
            FieldDescriptor::scalar("x", ScalarType::I32),
            FieldDescriptor::scalar("y", ScalarType::I32),
        ]));
        let segment = TableSchema::new(vec![
            FieldDescriptor::table("start", Arc::clone(&point)),
            FieldDescriptor::table("end", Arc::clone(&point)),
        ]);

        // Both endpoints carry identical coordinates.
        let mut source_builder = TableBuilder::new();
        source_builder.start_table(&point).unwrap();
        source_builder.add_i32(0, 3).unwrap();
        let a = source_builder.end_table().unwrap();
        source_builder.start_table(&point).unwrap();
        source_builder.add_i32(0, 3).unwrap();
        let b = source_builder.end_table().unwrap();
        source_builder.start_table(&segment).unwrap();
        source_builder.add_table(0, a).unwrap();
        source_builder.add_table(1, b).unwrap();
        let root = source_builder.end_table().unwrap();
        let source_bytes = source_builder.finish(root).unwrap();
        let source = TableView::root(&source_bytes, &segment).unwrap();

        let mut builder = TableBuilder::new();
        let table = builder.clone_table(&source).unwrap();
        let bytes = builder.finish(table).unwrap();

        let view = TableView::root(&bytes, &segment).unwrap();
        let start = view.get_table(0).unwrap().unwrap();
        let end = view.get_table(1).unwrap().unwrap();
        assert_eq!(start.get_i32(0).unwrap(), 3);
        assert_eq!(end.get_i32(0).unwrap(), 3);
        // One physical child for two identical endpoints.
        assert_eq!(start.position(), end.position());
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn duplicate_field_reports_its_name() {
        let schema = stats_schema();
        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();
        builder.add_u32(REACTIONS, 5).unwrap();

        let err = builder.add_u32(REACTIONS, 7).unwrap_err();
        assert!(err.to_string().contains("reactions"));
        assert!(matches!(err, Error::DuplicateField { .. }));
    }

    #[test]
    fn required_field_enforced_at_end() {
        let schema = TableSchema::new(vec![
            FieldDescriptor::scalar("id", ScalarType::U64).required(),
        ]);
        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();

        let err = builder.end_table().unwrap_err();
        assert!(matches!(err, Error::RequiredField { .. }));
    }

    #[test]
    fn finish_with_open_frame_fails() {
        let schema = stats_schema();
        let mut builder = TableBuilder::new();
        builder.start_table(&schema).unwrap();
        builder.start_table(&schema).unwrap();
        let inner = builder.end_table().unwrap();

        let err = builder.finish(inner).unwrap_err();
        assert!(matches!(err, Error::Nesting { .. }));
    }

    #[test]
    fn decoding_garbage_fails_without_panicking() {
        let schema = stats_schema();
        for len in 0..32usize {
            let data = vec![0xA5u8; len];
            let _ = TableView::root(&data, &schema);
        }
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn identifier_tagged_buffers_are_recognizable() {
        let schema = stats_schema();
        let config = BufferConfig::with_identifier("NSTA").unwrap();
        assert_eq!(config.header_len(), 8);
        assert_eq!(config.file_extension, "bin");

        let mut builder = TableBuilder::with_config(config);
        builder.start_table(&schema).unwrap();
        builder.add_u32(REACTIONS, 2).unwrap();
        let table = builder.end_table().unwrap();
        let bytes = builder.finish(table).unwrap();

        assert!(identifier_matches(&bytes, "NSTA"));
        let view = TableView::root(&bytes, &schema).unwrap();
        assert_eq!(view.get_u32(REACTIONS).unwrap(), 2);
    }

    #[test]
    fn malformed_identifier_tag_is_rejected() {
        assert!(BufferConfig::with_identifier("TOOLONG").is_err());
        assert!(BufferConfig::with_identifier("ab").is_err());
    }

    #[test]
    fn independent_builders_on_threads_produce_identical_buffers() {
        let schema = stats_schema();
        let encode = || {
            let mut builder = TableBuilder::new();
            builder.start_table(&schema).unwrap();
            builder.add_u32(REACTIONS, 5).unwrap();
            builder.add_u64(ZAP_TOTAL, 100).unwrap();
            let table = builder.end_table().unwrap();
            builder.finish(table).unwrap()
        };

        let (a, b) = std::thread::scope(|s| {
            let ta = s.spawn(&encode);
            let tb = s.spawn(&encode);
            (ta.join().unwrap(), tb.join().unwrap())
        });
        assert_eq!(a, b);
    }
}
