use std::cmp::Ordering;

use indoc::indoc;
use pacgen_core::{Colors, Constant};

use super::test_utils::{json, program, run_with};
use super::{Runtime, Value};

const RECORD: &str = indoc! {r#"
    {
        "name": "Record",
        "params": [{ "name": "n", "type": "uint" }],
        "variables": [{ "name": "tags", "type": { "list": "uint" }, "default": [] }],
        "productions": {
            "record": { "kind": "sequence", "members": ["name", "raw", "tag"] },
            "name": {
                "kind": "variable",
                "unpack": { "bytes": { "param": "n" } },
                "name": "name",
                "filter": "utf8"
            },
            "raw": { "kind": "variable", "unpack": { "bytes": { "const": 2 } }, "name": "raw" },
            "tag": {
                "kind": "variable",
                "unpack": "uint8",
                "name": "tag",
                "hooks": [{ "name": "append", "args": ["tags"] }]
            }
        }
    }
"#};

#[test]
fn object_formatting() {
    let program = program(RECORD);
    let runtime = Runtime::builder(&program).build().unwrap();
    let object = run_with(runtime, "Record", vec![Value::UInt(3)], &[b"a\"b\x00\xff\x07"]).unwrap();
    let value = Value::Object(object);

    insta::assert_snapshot!(value.format(&program, true, Colors::OFF), @r#"
    {
      "name": "a\"b",
      "raw": "\\x00\\xff",
      "tag": 7,
      "tags": [
        7
      ]
    }
    "#);
    let Value::Object(object) = &value else {
        unreachable!();
    };
    assert_eq!(
        value.format(&program, false, Colors::OFF),
        json(&program, object)
    );
}

#[test]
fn hidden_parameter_slots_are_omitted() {
    let program = program(RECORD);
    let runtime = Runtime::builder(&program).build().unwrap();
    let object = run_with(runtime, "Record", vec![Value::UInt(0)], &[b"\x01\x02\x03"]).unwrap();

    assert_eq!(object.slots.len(), 5);
    assert_eq!(object.get(&program, "__param_n"), Some(&Value::UInt(0)));
    insta::assert_snapshot!(
        json(&program, &object),
        @r#"{"name":"","raw":"\\x01\\x02","tag":3,"tags":[3]}"#
    );
}

#[test]
fn empty_containers() {
    let program = program(RECORD);

    assert_eq!(Value::List(vec![]).format(&program, true, Colors::OFF), "[]");
    assert_eq!(Value::Null.format(&program, true, Colors::OFF), "null");
}

#[test]
fn integers_compare_across_signedness() {
    assert_eq!(Value::UInt(1).compare(&Value::Int(-1)), Some(Ordering::Greater));
    assert_eq!(Value::Int(-1).compare(&Value::UInt(0)), Some(Ordering::Less));
    assert!(Value::UInt(5).loosely_eq(&Value::Int(5)));
    assert!(!Value::Int(-1).loosely_eq(&Value::UInt(u64::MAX)));
}

#[test]
fn bytes_and_text_compare_bytewise() {
    let bytes = Value::Bytes(b"ab".to_vec());
    let text = Value::Text("ab".to_owned());

    assert!(bytes.loosely_eq(&text));
    assert_eq!(bytes.compare(&Value::Bytes(b"b".to_vec())), Some(Ordering::Less));
    assert_eq!(bytes.compare(&Value::UInt(1)), None);
    assert!(!bytes.loosely_eq(&Value::UInt(1)));
}

#[test]
fn lists_fall_back_to_structural_equality() {
    let list = Value::List(vec![Value::UInt(1)]);

    assert_eq!(list.compare(&list), None);
    assert!(list.loosely_eq(&Value::List(vec![Value::UInt(1)])));
}

#[test]
fn truthiness_and_lengths() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Bytes(Vec::new()).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert_eq!(Value::Int(-1).as_usize(), None);
    assert_eq!(Value::UInt(4).as_usize(), Some(4));
}

#[test]
fn constants_convert() {
    let constant = Constant::List(vec![Constant::Bytes(b"x".to_vec()), Constant::Int(-2)]);

    assert_eq!(
        Value::from(&constant),
        Value::List(vec![Value::Bytes(b"x".to_vec()), Value::Int(-2)])
    );
}
