//! Property-based tests for the writer and reader.
//!
//! Writing a value through the binary encoder and reading it back yields a
//! structurally equal value, for every schema kind.

use proptest::prelude::*;

use avro_generic::encoder::{encode_varint, encode_zigzag, BinaryEncoder, EventEncoder};
use avro_generic::generic::*;
use avro_generic::reader::varint::{decode_varint, decode_zigzag};
use avro_generic::reader::GenericDatumReader;
use avro_generic::schema::*;
use avro_generic::writer::GenericDatumWriter;

fn round_trip(schema: &Schema, value: &GenericValue) -> GenericValue {
    let mut encoder = BinaryEncoder::new(Vec::new());
    GenericDatumWriter::new(schema)
        .write(value, &mut encoder)
        .unwrap();
    let bytes = encoder.into_inner().unwrap();
    let mut cursor = &bytes[..];
    let read = GenericDatumReader::new(schema).read(&mut cursor).unwrap();
    assert!(cursor.is_empty(), "{} trailing bytes", cursor.len());
    read
}

fn record_schema() -> Schema {
    parse_schema(
        r#"{"type": "record", "name": "Sample", "namespace": "prop", "fields": [
            {"name": "id", "type": "long"},
            {"name": "label", "type": ["null", "string"]},
            {"name": "score", "type": "double"},
            {"name": "flags", "type": {"type": "array", "items": "boolean"}},
            {"name": "suit", "type": {"type": "enum", "name": "Suit",
                "symbols": ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]}},
            {"name": "hash", "type": {"type": "fixed", "name": "Hash", "size": 4}}
        ]}"#,
    )
    .unwrap()
}

// ============================================================================
// Generators
// ============================================================================

/// Generate valid Avro names (must start with [A-Za-z_] and contain only [A-Za-z0-9_]).
fn arb_avro_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,15}"
}

/// Generate enum symbols (non-empty list of unique valid names).
fn arb_enum_symbols() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_avro_name(), 1..8).prop_filter("symbols must be unique", |symbols| {
        let mut seen = std::collections::HashSet::new();
        symbols.iter().all(|s| seen.insert(s.clone()))
    })
}

fn arb_sample(schema: Schema) -> impl Strategy<Value = GenericValue> {
    (
        any::<i64>(),
        prop::option::of("\\PC{0,12}"),
        -1.0e12f64..1.0e12,
        prop::collection::vec(any::<bool>(), 0..6),
        0usize..4,
        prop::array::uniform4(any::<u8>()),
    )
        .prop_map(move |(id, label, score, flags, suit, hash)| {
            let field_schema = |name: &str| schema.field(name).unwrap().schema().clone();
            let flags_array = GenericArray::new(&field_schema("flags")).unwrap();
            for flag in flags {
                flags_array.push(flag);
            }
            let suit_schema = field_schema("suit");
            let symbol = suit_schema.symbols().unwrap()[suit].clone();

            let mut record = GenericRecord::new(&schema).unwrap();
            record.put("id", id).unwrap();
            record.put("label", label).unwrap();
            record.put("score", score).unwrap();
            record.put("flags", flags_array).unwrap();
            record.put("suit", EnumSymbol::new(&suit_schema, symbol)).unwrap();
            record
                .put("hash", GenericFixed::new(&field_schema("hash"), hash.to_vec()))
                .unwrap();
            record.into()
        })
}

// ============================================================================
// Varints
// ============================================================================

proptest! {
    #[test]
    fn prop_varint_round_trip(value in any::<u64>()) {
        let encoded = encode_varint(value);
        prop_assert!(encoded.len() <= 10);
        let mut cursor = &encoded[..];
        prop_assert_eq!(decode_varint(&mut cursor).unwrap(), value);
        prop_assert!(cursor.is_empty());
    }

    #[test]
    fn prop_zigzag_round_trip(value in any::<i64>()) {
        let encoded = encode_zigzag(value);
        let mut cursor = &encoded[..];
        prop_assert_eq!(decode_zigzag(&mut cursor).unwrap(), value);
    }
}

// ============================================================================
// Primitive Round Trips
// ============================================================================

proptest! {
    #[test]
    fn prop_boolean_round_trip(value in any::<bool>()) {
        let value = GenericValue::Boolean(value);
        prop_assert_eq!(round_trip(&Schema::boolean(), &value), value);
    }

    #[test]
    fn prop_int_round_trip(value in any::<i32>()) {
        let value = GenericValue::Int(value);
        prop_assert_eq!(round_trip(&Schema::int(), &value), value);
    }

    #[test]
    fn prop_long_round_trip(value in any::<i64>()) {
        let value = GenericValue::Long(value);
        prop_assert_eq!(round_trip(&Schema::long(), &value), value);
    }

    #[test]
    fn prop_float_round_trip(value in -1.0e30f32..1.0e30) {
        let value = GenericValue::Float(value);
        prop_assert_eq!(round_trip(&Schema::float(), &value), value);
    }

    #[test]
    fn prop_double_round_trip(value in -1.0e300f64..1.0e300) {
        let value = GenericValue::Double(value);
        prop_assert_eq!(round_trip(&Schema::double(), &value), value);
    }

    #[test]
    fn prop_string_round_trip(value in "\\PC{0,64}") {
        let value = GenericValue::String(value);
        prop_assert_eq!(round_trip(&Schema::string(), &value), value);
    }

    #[test]
    fn prop_bytes_round_trip(value in prop::collection::vec(any::<u8>(), 0..256)) {
        let value = GenericValue::Bytes(value);
        prop_assert_eq!(round_trip(&Schema::bytes(), &value), value);
    }

    #[test]
    fn prop_int_promotes_to_long(value in any::<i32>()) {
        let read = round_trip(&Schema::long(), &GenericValue::Int(value));
        prop_assert_eq!(read, GenericValue::Long(i64::from(value)));
    }
}

// ============================================================================
// Complex Round Trips
// ============================================================================

proptest! {
    #[test]
    fn prop_enum_round_trip(symbols in arb_enum_symbols(), pick in any::<prop::sample::Index>()) {
        let schema = Schema::enumeration(Name::new("E", None).unwrap(), symbols.clone()).unwrap();
        let value: GenericValue = EnumSymbol::new(&schema, pick.get(&symbols).clone()).into();
        prop_assert_eq!(round_trip(&schema, &value), value);
    }

    #[test]
    fn prop_array_round_trip(items in prop::collection::vec(any::<i64>(), 0..64)) {
        let schema = Schema::array(Schema::long());
        let array = GenericArray::new(&schema).unwrap();
        for item in items {
            array.push(item);
        }
        let value: GenericValue = array.into();
        prop_assert_eq!(round_trip(&schema, &value), value);
    }

    #[test]
    fn prop_map_round_trip(entries in prop::collection::hash_map("[a-z]{1,8}", any::<i32>(), 0..16)) {
        let schema = Schema::map(Schema::int());
        let map = GenericMap::new(&schema).unwrap();
        for (key, value) in entries {
            map.insert(key, value);
        }
        let value: GenericValue = map.into();
        prop_assert_eq!(round_trip(&schema, &value), value);
    }

    #[test]
    fn prop_record_round_trip(value in arb_sample(record_schema())) {
        let schema = match &value {
            GenericValue::Record(record) => record.schema().clone(),
            _ => unreachable!(),
        };
        prop_assert!(validate(&schema, &value));
        prop_assert_eq!(round_trip(&schema, &value), value);
    }

    #[test]
    fn prop_empty_and_full_arrays_bracket_their_items(len in 0usize..20) {
        let schema = Schema::array(Schema::int());
        let array = GenericArray::new(&schema).unwrap();
        for i in 0..len {
            array.push(i as i32);
        }
        let mut encoder = EventEncoder::new();
        GenericDatumWriter::new(&schema).write(&array.into(), &mut encoder).unwrap();
        let expected = if len == 0 { 2 } else { 3 + 2 * len };
        prop_assert_eq!(encoder.events().len(), expected);
    }
}
