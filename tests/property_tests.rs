//! Property-based tests for the round-trip guarantees.
//!
//! Generated values go through each encoding and must come back equal, with
//! the parser reporting exactly `node_count()` nodes. Arbitrary bytes fed to
//! the parsers must produce a result or an error, never a panic.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_llsd::xml::is_xml_char;
use serde_llsd::{
    from_value, to_value, Encoding, FormatOptions, LlsdDate, LlsdMap, LlsdValue, ParseOptions,
};
use uuid::Uuid;

fn xml_safe_string() -> impl Strategy<Value = String> {
    any::<String>().prop_map(|s| s.chars().filter(|&c| is_xml_char(c)).collect())
}

fn leaf() -> impl Strategy<Value = LlsdValue> {
    prop_oneof![
        Just(LlsdValue::Undefined),
        any::<bool>().prop_map(LlsdValue::Boolean),
        any::<i32>().prop_map(LlsdValue::Integer),
        // Reals are limited to values whose shortest text form parses back
        // bit-for-bit; NaN never compares equal.
        (-1.0e12_f64..1.0e12).prop_map(LlsdValue::Real),
        xml_safe_string().prop_map(LlsdValue::String),
        any::<u128>().prop_map(|n| LlsdValue::Uuid(Uuid::from_u128(n))),
        // Quarter seconds between 1970 and 2096 survive the text forms exactly.
        (0_i64..16_000_000_000).prop_map(|q| LlsdValue::Date(LlsdDate::from_seconds(q as f64 / 4.0))),
        xml_safe_string().prop_map(LlsdValue::Uri),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(LlsdValue::Binary),
    ]
}

fn value() -> impl Strategy<Value = LlsdValue> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(LlsdValue::Array),
            prop::collection::vec((xml_safe_string(), inner), 0..6)
                .prop_map(|entries| LlsdValue::Map(entries.into_iter().collect::<LlsdMap>())),
        ]
    })
}

fn roundtrip(value: &LlsdValue, encoding: Encoding, options: &FormatOptions) -> bool {
    let mut bytes = Vec::new();
    if let Err(e) = encoding.format_to(value, &mut bytes, options) {
        eprintln!("Format failed: {}", e);
        return false;
    }
    match encoding.parse_slice(&bytes, &ParseOptions::new()) {
        Ok(parsed) => parsed.value == *value && parsed.nodes == value.node_count(),
        Err(e) => {
            eprintln!("Parse failed: {}", e);
            eprintln!("Formatted was: {}", String::from_utf8_lossy(&bytes));
            false
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Avatar {
    name: String,
    age: u16,
    position: (f32, f32, f32),
    friends: Vec<String>,
    title: Option<String>,
}

fn avatar() -> impl Strategy<Value = Avatar> {
    (
        any::<String>(),
        any::<u16>(),
        (-256.0_f32..256.0, -256.0_f32..256.0, 0.0_f32..4096.0),
        prop::collection::vec(any::<String>(), 0..5),
        proptest::option::of(any::<String>()),
    )
        .prop_map(|(name, age, position, friends, title)| Avatar {
            name,
            age,
            position,
            friends,
            title,
        })
}

proptest! {
    #[test]
    fn prop_notation_roundtrip(v in value()) {
        prop_assert!(roundtrip(&v, Encoding::Notation, &FormatOptions::new()));
    }

    #[test]
    fn prop_notation_pretty_roundtrip(v in value()) {
        prop_assert!(roundtrip(&v, Encoding::Notation, &FormatOptions::pretty()));
    }

    #[test]
    fn prop_xml_roundtrip(v in value()) {
        prop_assert!(roundtrip(&v, Encoding::Xml, &FormatOptions::new()));
    }

    #[test]
    fn prop_binary_roundtrip(v in value()) {
        prop_assert!(roundtrip(&v, Encoding::Binary, &FormatOptions::new()));
    }

    #[test]
    fn prop_serde_roundtrip(a in avatar()) {
        let value = to_value(&a).unwrap();
        let back: Avatar = from_value(value).unwrap();
        prop_assert_eq!(back, a);
    }

    #[test]
    fn prop_i64_widens(n in any::<i64>()) {
        let value = to_value(&n).unwrap();
        match i32::try_from(n) {
            Ok(small) => prop_assert_eq!(value, LlsdValue::Integer(small)),
            Err(_) => prop_assert_eq!(value, LlsdValue::Real(n as f64)),
        }
    }

    #[test]
    fn prop_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        for encoding in [Encoding::Binary, Encoding::Xml, Encoding::Notation] {
            let _ = encoding.parse_slice(&bytes, &ParseOptions::new().with_depth_limit(32));
        }
        let _ = serde_llsd::deserialize(&bytes, &ParseOptions::new());
        let headed = [&b"<?"[..], bytes.as_slice()].concat();
        let _ = serde_llsd::deserialize(&headed, &ParseOptions::new());
        let _ = serde_llsd::deserialize_from(&headed[..], &ParseOptions::new());
    }

    #[test]
    fn prop_budget_is_respected(v in value(), cut in 0_usize..64) {
        let mut bytes = Vec::new();
        Encoding::Binary.format_to(&v, &mut bytes, &FormatOptions::new()).unwrap();
        let budget = bytes.len().saturating_sub(cut + 1);
        let options = ParseOptions::new().with_byte_budget(budget);
        prop_assert!(Encoding::Binary.parse_slice(&bytes, &options).is_err());
    }
}
