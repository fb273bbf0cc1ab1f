use codec::{Session, SessionConfig, TypeRegistry, Value};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Field {
    Unsigned { value: u32, max: u32 },
    Signed { value: i32, max: u32 },
    Flag(bool),
    Double(f64),
    Ascii(String),
    Compressed(String),
    Minimal(String),
    Pad(bool),
}

fn field_strategy() -> impl Strategy<Value = Field> {
    prop_oneof![
        (any::<u32>(), any::<u32>()).prop_map(|(a, b)| Field::Unsigned {
            value: a.min(b),
            max: a.max(b),
        }),
        (0..=i32::MAX as u32, any::<i32>()).prop_map(|(max, raw)| {
            let bound = i64::from(max);
            let value = i64::from(raw).clamp(-bound, bound);
            Field::Signed {
                value: i32::try_from(value).unwrap(),
                max,
            }
        }),
        any::<bool>().prop_map(Field::Flag),
        any::<f64>().prop_map(Field::Double),
        "[ -~]{0,24}".prop_map(Field::Ascii),
        ".{0,24}".prop_map(Field::Compressed),
        prop::sample::select(vec!["id", "name", "zoë", "", "id"])
            .prop_map(|word| Field::Minimal(word.to_string())),
        any::<bool>().prop_map(Field::Pad),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = "[a-zA-Z0-9 ]{0,8}".prop_map(Value::String);
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::set),
            prop::collection::vec((inner.clone(), inner), 0..6).prop_map(Value::Mapping),
        ]
    })
}

proptest! {
    #[test]
    fn prop_session_fields_roundtrip(fields in prop::collection::vec(field_strategy(), 0..48)) {
        let mut writer = Session::new(SessionConfig::for_testing());
        writer.start_serializing().unwrap();
        for field in &fields {
            match field {
                Field::Unsigned { value, max } => writer.add_unsigned_max(*value, *max).unwrap(),
                Field::Signed { value, max } => writer.add_signed_max(*value, *max).unwrap(),
                Field::Flag(value) => writer.add_bool(*value).unwrap(),
                Field::Double(value) => writer.add_f64(*value).unwrap(),
                Field::Ascii(text) => writer.add_string_ascii(text).unwrap(),
                Field::Compressed(text) => writer.add_string_compressed(text).unwrap(),
                Field::Minimal(text) => writer.add_string_minimal(text).unwrap(),
                Field::Pad(bit) => {
                    writer.add_padding_to_next_byte(*bit).unwrap();
                }
            }
        }
        let data = writer.finalize_serializing().unwrap();
        prop_assert_eq!(data.bit_len(), writer.bits_written());

        let mut reader = Session::new(SessionConfig::for_testing());
        reader.start_deserializing_with(data).unwrap();
        for field in &fields {
            match field {
                Field::Unsigned { value, max } => {
                    prop_assert_eq!(reader.get_unsigned_max(*max).unwrap(), *value);
                }
                Field::Signed { value, max } => {
                    prop_assert_eq!(reader.get_signed_max(*max).unwrap(), *value);
                }
                Field::Flag(value) => {
                    prop_assert_eq!(reader.get_bool().unwrap(), *value);
                }
                Field::Double(value) => {
                    prop_assert_eq!(reader.get_f64().unwrap().to_bits(), value.to_bits());
                }
                Field::Ascii(text) => {
                    prop_assert_eq!(&reader.get_string_ascii().unwrap(), text);
                }
                Field::Compressed(text) => {
                    prop_assert_eq!(&reader.get_string_compressed().unwrap(), text);
                }
                Field::Minimal(text) => {
                    prop_assert_eq!(&reader.get_string_minimal().unwrap(), text);
                }
                Field::Pad(_) => {
                    reader.get_to_next_byte().unwrap();
                }
            }
        }
        prop_assert_eq!(reader.bit_position(), reader.bits_written());
    }

    #[test]
    fn prop_object_graph_roundtrip(graph in value_strategy(), minimal_keys in any::<bool>()) {
        let config = SessionConfig::default().with_minimal_mapping_keys(minimal_keys);
        let mut writer = Session::new(config.clone());
        writer.start_serializing().unwrap();
        writer.add_object(&graph).unwrap();
        let data = writer.finalize_serializing().unwrap();

        let mut reader = Session::new(config);
        reader.start_deserializing_with(data).unwrap();
        let decoded = reader.get_object(&TypeRegistry::new()).unwrap();
        prop_assert_eq!(decoded, graph);
    }
}
