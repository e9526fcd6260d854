use pacgen_bytecode::{ObjectType, Slot, TypeId};
use pacgen_core::ValueType;

use super::{Callbacks, HookAction, HookContext, ParseObject, Value};

fn record() -> ObjectType {
    let slot = |name: &str, ty| Slot {
        name: name.to_owned(),
        ty,
        init: None,
    };
    ObjectType {
        name: "Record".to_owned(),
        slots: vec![
            slot("items", ValueType::List(Box::new(ValueType::UInt))),
            slot("count", ValueType::UInt),
        ],
        params: Vec::new(),
    }
}

/// Run hook `name` with `args` on `object` after a production valued `value`.
fn call(
    name: &str,
    args: &[&str],
    object: &mut ParseObject,
    value: Value,
) -> Result<HookAction, String> {
    let ty = record();
    let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
    let callbacks = Callbacks::new();
    let hook = callbacks.get_hook(name).unwrap();
    let mut ctx = HookContext {
        ty: &ty,
        object,
        value: &value,
        args: &args,
        position: 0,
    };
    hook.call(&mut ctx)
}

fn filter(name: &str, value: Value) -> Result<Value, String> {
    Callbacks::new().get_filter(name).unwrap().apply(value)
}

fn empty_record() -> ParseObject {
    ParseObject::new(TypeId(0), &record())
}

#[test]
fn append_starts_and_extends_lists() {
    let mut object = empty_record();

    call("append", &["items"], &mut object, Value::UInt(1)).unwrap();
    call("append", &["items"], &mut object, Value::UInt(2)).unwrap();

    assert_eq!(
        object.slots[0],
        Value::List(vec![Value::UInt(1), Value::UInt(2)])
    );
}

#[test]
fn append_errors() {
    let mut object = empty_record();
    object.slots[1] = Value::UInt(0);

    let no_arg = call("append", &[], &mut object, Value::UInt(1)).unwrap_err();
    let not_list = call("append", &["count"], &mut object, Value::UInt(1)).unwrap_err();
    let missing = call("append", &["nope"], &mut object, Value::UInt(1)).unwrap_err();

    assert_eq!(no_arg, "expects the name of a list field");
    assert_eq!(not_list, "field `count` holds uint");
    assert_eq!(missing, "no field `nope`");
}

#[test]
fn stop_if_compares_numbers_and_bytes() {
    let mut object = empty_record();

    let zero = call("stop_if", &["0"], &mut object, Value::UInt(0)).unwrap();
    let other = call("stop_if", &["0"], &mut object, Value::UInt(7)).unwrap();
    let end = call("stop_if", &["END"], &mut object, Value::Bytes(b"END".to_vec())).unwrap();

    assert_eq!(zero, HookAction::Stop);
    assert_eq!(other, HookAction::Continue);
    assert_eq!(end, HookAction::Stop);
}

#[test]
fn utf8_filter() {
    assert_eq!(
        filter("utf8", Value::Bytes(b"ok".to_vec())),
        Ok(Value::Text("ok".to_owned()))
    );
    assert_eq!(
        filter("utf8", Value::UInt(1)),
        Err("expected bytes, got uint".to_owned())
    );
    assert!(filter("utf8", Value::Bytes(vec![0xff])).is_err());
}

#[test]
fn ascii_uint_filter() {
    assert_eq!(
        filter("ascii_uint", Value::Bytes(b"0042".to_vec())),
        Ok(Value::UInt(42))
    );
    assert_eq!(
        filter("ascii_uint", Value::Bytes(b"4x".to_vec())),
        Err(r#""4x" is not a decimal number"#.to_owned())
    );
    assert_eq!(
        filter("ascii_uint", Value::Bytes(b"99999999999999999999".to_vec())),
        Err(r#""99999999999999999999" overflows uint"#.to_owned())
    );
}

#[test]
fn registration_replaces_by_name() {
    let callbacks = Callbacks::empty()
        .filter("id", |value: Value| -> Result<Value, String> { Ok(value) })
        .filter("id", |_: Value| -> Result<Value, String> { Ok(Value::Null) });

    let out = callbacks.get_filter("id").unwrap().apply(Value::UInt(1));

    assert_eq!(out, Ok(Value::Null));
    assert!(callbacks.get_hook("append").is_none());
}
