use serde_llsd::{llsd, to_notation, LlsdDate, LlsdMap, LlsdValue};
use uuid::Uuid;

#[test]
fn test_llsd_macro_undef() {
    let value = llsd!(undef);
    assert_eq!(value, LlsdValue::Undefined);
}

#[test]
fn test_llsd_macro_booleans() {
    assert_eq!(llsd!(true), LlsdValue::Boolean(true));
    assert_eq!(llsd!(false), LlsdValue::Boolean(false));
}

#[test]
fn test_llsd_macro_numbers() {
    assert_eq!(llsd!(42), LlsdValue::Integer(42));
    assert_eq!(llsd!(3.5), LlsdValue::Real(3.5));
    assert_eq!(llsd!(-123), LlsdValue::Integer(-123));
    assert_eq!(llsd!(7_u8), LlsdValue::Integer(7));
    assert_eq!(llsd!(0.5_f32), LlsdValue::Real(0.5));
}

#[test]
fn test_llsd_macro_strings() {
    assert_eq!(llsd!("hello world"), LlsdValue::String("hello world".to_string()));
    assert_eq!(llsd!(""), LlsdValue::String(String::new()));
}

#[test]
fn test_llsd_macro_typed_scalars() {
    let id = Uuid::parse_str("c96f9b1e-f589-4100-9774-d98643ce0bed").unwrap();
    let value = llsd!({ "id": id, "when": (LlsdDate::epoch()), "home": (LlsdValue::uri("http://example.com/")) });
    assert_eq!(value.get("id"), Some(&LlsdValue::Uuid(id)));
    assert_eq!(value.get("when"), Some(&LlsdValue::Date(LlsdDate::epoch())));
    assert!(value.get("home").is_some_and(LlsdValue::is_uri));
}

#[test]
fn test_llsd_macro_arrays() {
    let value = llsd!([1, 2.5, "three", undef, (-4)]);
    assert_eq!(
        value,
        LlsdValue::Array(vec![
            LlsdValue::Integer(1),
            LlsdValue::Real(2.5),
            LlsdValue::from("three"),
            LlsdValue::Undefined,
            LlsdValue::Integer(-4),
        ])
    );
}

#[test]
fn test_llsd_macro_maps() {
    let value = llsd!({
        "name": "Alice",
        "age": 30,
        "tags": ["rust", "llsd"],
    });
    let mut expected = LlsdMap::new();
    expected.insert("name".to_string(), LlsdValue::from("Alice"));
    expected.insert("age".to_string(), LlsdValue::Integer(30));
    expected.insert(
        "tags".to_string(),
        LlsdValue::Array(vec![LlsdValue::from("rust"), LlsdValue::from("llsd")]),
    );
    assert_eq!(value, LlsdValue::Map(expected));
}

#[test]
fn test_llsd_macro_nested() {
    let value = llsd!({
        "region": { "name": "Ahern", "size": [256, 256] },
        "agents": [{ "name": "a" }, { "name": "b" }],
        "empty": { "map": {}, "array": [] }
    });
    assert_eq!(value.node_count(), 14);
    assert_eq!(
        to_notation(&value).unwrap(),
        b"{'region':{'name':'Ahern','size':[i256,i256]},\
'agents':[{'name':'a'},{'name':'b'}],'empty':{'map':{},'array':[]}}"
            .to_vec()
    );
}

#[test]
fn test_llsd_macro_variables() {
    let name = "Bob".to_string();
    let scores = vec![1, 2, 3];
    let maybe: Option<i32> = None;
    let value = llsd!({ "name": name, "scores": scores, "maybe": maybe });
    assert_eq!(value.get("name").and_then(LlsdValue::as_str), Some("Bob"));
    assert_eq!(value.get("scores").map(LlsdValue::len), Some(3));
    assert_eq!(value.get("maybe"), Some(&LlsdValue::Undefined));
}
