use std::cell::RefCell;
use std::rc::Rc;

use indoc::indoc;

use super::test_utils::{assert_chunking_invariant, json, program, run, run_chunks, run_with};
use super::{
    Callbacks, HookAction, HookContext, Outcome, Registry, Runtime, RuntimeError, Stream, Value,
};

/// `Start -> "A" Item*` with `Item` a `uint8` appended to `items`.
const ITEMS: &str = indoc! {r#"
    {
        "name": "Start",
        "variables": [{ "name": "items", "type": { "list": "uint" }, "default": [] }],
        "productions": {
            "start": { "kind": "sequence", "members": ["a", "items"] },
            "a": { "kind": "literal", "value": "A", "id": 1 },
            "items": { "kind": "boolean", "condition": { "not": "at_eod" }, "then": "more" },
            "more": { "kind": "sequence", "members": ["item", "items"] },
            "item": {
                "kind": "variable",
                "unpack": "uint8",
                "name": "item",
                "hooks": [{ "name": "append", "args": ["items"] }]
            }
        }
    }
"#};

/// `S -> ("x" | "y") "z"`.
const CHOICE: &str = indoc! {r#"
    {
        "name": "S",
        "productions": {
            "s": { "kind": "sequence", "members": ["choice", "z"] },
            "choice": { "kind": "lookahead", "alternatives": ["x", "y"], "lookahead": [[1], [2]] },
            "x": { "kind": "literal", "value": "x", "id": 1, "name": "x" },
            "y": { "kind": "literal", "value": "y", "id": 2, "name": "y" },
            "z": { "kind": "literal", "value": "z", "id": 3 }
        }
    }
"#};

/// `<` len:u8 Inner(len) check:u16 `>` with Inner a child of Middle, itself
/// a child of Outer.
const NESTED: &str = indoc! {r#"
    [
        {
            "name": "Outer",
            "productions": {
                "outer": { "kind": "sequence", "members": ["head", "middle", "end"] },
                "head": { "kind": "literal", "value": "<", "id": 1 },
                "middle": { "kind": "child", "grammar": "Middle", "name": "middle" },
                "end": { "kind": "literal", "value": ">", "id": 2 }
            }
        },
        {
            "name": "Middle",
            "productions": {
                "middle": { "kind": "sequence", "members": ["len", "inner", "check"] },
                "len": { "kind": "variable", "unpack": "uint8", "name": "len" },
                "inner": {
                    "kind": "child",
                    "grammar": "Inner",
                    "args": [{ "field": "len" }],
                    "name": "inner"
                },
                "check": { "kind": "variable", "unpack": "uint16", "name": "check" }
            }
        },
        {
            "name": "Inner",
            "params": [{ "name": "n", "type": "uint" }],
            "productions": {
                "inner": { "kind": "sequence", "members": ["body", "pad"] },
                "body": {
                    "kind": "variable",
                    "unpack": { "bytes": { "param": "n" } },
                    "name": "body",
                    "filter": "utf8"
                },
                "pad": { "kind": "literal", "value": ".", "id": 1 }
            }
        }
    ]
"#};

/// Tag-dispatched message with an optional trailer.
const MSG: &str = indoc! {r#"
    {
        "name": "Msg",
        "productions": {
            "msg": { "kind": "sequence", "members": ["tag", "body", "tail"] },
            "tag": { "kind": "variable", "unpack": "uint8", "name": "tag" },
            "body": {
                "kind": "switch",
                "discriminant": { "field": "tag" },
                "cases": [
                    { "value": 1, "production": "short" },
                    { "value": 2, "production": "long" }
                ],
                "default_case": "rest"
            },
            "short": { "kind": "variable", "unpack": "uint8", "name": "n" },
            "long": { "kind": "variable", "unpack": "uint16le", "name": "n" },
            "rest": { "kind": "variable", "unpack": "bytes_eod", "name": "raw" },
            "tail": {
                "kind": "boolean",
                "condition": { "not": "at_eod" },
                "then": "trailer",
                "else": "none"
            },
            "trailer": { "kind": "variable", "unpack": "uint8", "name": "trailer", "default": 0 },
            "none": { "kind": "epsilon" }
        }
    }
"#};

#[test]
fn item_list_fed_whole() {
    let program = program(ITEMS);

    let object = run(&program, "Start", b"A\x01\x02\x03").unwrap();

    assert_eq!(json(&program, &object), r#"{"item":3,"items":[1,2,3]}"#);
}

#[test]
fn item_list_fed_in_resume_steps() {
    let program = program(ITEMS);

    let whole = run(&program, "Start", b"A\x01\x02\x03").unwrap();
    let chunked = run_chunks(&program, "Start", &[b"A\x01", b"\x02", b"\x03"]).unwrap();

    assert_eq!(chunked, whole);
    assert_eq!(
        chunked.get(&program, "items"),
        Some(&Value::List(vec![
            Value::UInt(1),
            Value::UInt(2),
            Value::UInt(3)
        ]))
    );
}

#[test]
fn empty_item_list() {
    let program = program(ITEMS);

    let object = run(&program, "Start", b"A").unwrap();

    assert_eq!(json(&program, &object), r#"{"item":null,"items":[]}"#);
}

#[test]
fn chunking_invariance() {
    let items = program(ITEMS);
    let choice = program(CHOICE);
    let nested = program(NESTED);
    let msg = program(MSG);

    insta::assert_snapshot!(
        assert_chunking_invariant(&items, "Start", b"A\x01\x02\x03\x04"),
        @r#"{"item":4,"items":[1,2,3,4]}"#
    );
    insta::assert_snapshot!(
        assert_chunking_invariant(&choice, "S", b"xz"),
        @r#"{"x":"x","y":null}"#
    );
    insta::assert_snapshot!(
        assert_chunking_invariant(&nested, "Outer", b"<\x03abc.\x01\x02>"),
        @r#"{"middle":{"len":3,"inner":{"body":"abc"},"check":258}}"#
    );
    insta::assert_snapshot!(
        assert_chunking_invariant(&msg, "Msg", b"\x02\x34\x12\x07"),
        @r#"{"tag":2,"n":4660,"raw":null,"trailer":7}"#
    );
    insta::assert_snapshot!(
        assert_chunking_invariant(&msg, "Msg", b"\x09rest"),
        @r#"{"tag":9,"n":null,"raw":"rest","trailer":null}"#
    );
}

#[test]
fn resume_without_new_bytes_retries_same_point() {
    let program = program(ITEMS);
    let runtime = Runtime::builder(&program).build().unwrap();
    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let mut stream = Stream::new();
    stream.append(b"A\x01");

    let vm = runtime.parse(registry.require("Start").unwrap(), vec![]).unwrap();
    let Outcome::Suspended(vm) = vm.resume(&stream).unwrap() else {
        panic!("expected suspension");
    };
    let first = vm.resume_point();
    let Outcome::Suspended(vm) = vm.resume(&stream).unwrap() else {
        panic!("expected suspension");
    };

    assert_eq!(vm.resume_point(), first);
    assert_eq!(first.state.position, 2);

    stream.append(b"\x02\x03");
    stream.freeze();
    let Outcome::Done(object) = vm.resume(&stream).unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(object, run(&program, "Start", b"A\x01\x02\x03").unwrap());
}

#[test]
fn partial_literal_consumes_nothing() {
    let program = program(indoc! {r#"
        {
            "name": "Http",
            "productions": {
                "line": { "kind": "sequence", "members": ["verb", "code"] },
                "verb": { "kind": "literal", "value": "HTTP", "id": 1, "name": "verb" },
                "code": { "kind": "variable", "unpack": "uint16", "name": "code" }
            }
        }
    "#});
    let runtime = Runtime::builder(&program).build().unwrap();
    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let mut stream = Stream::new();
    stream.append(b"HT");

    let vm = runtime.parse(registry.require("Http").unwrap(), vec![]).unwrap();
    let Outcome::Suspended(vm) = vm.resume(&stream).unwrap() else {
        panic!("expected suspension");
    };
    let point = vm.resume_point();
    assert_eq!(point.state.position, 0);
    assert_eq!(point.state.lookahead, None);

    stream.append(b"TP\x00\xc8");
    let Outcome::Done(object) = vm.resume(&stream).unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(json(&program, &object), r#"{"verb":"HTTP","code":200}"#);
}

#[test]
fn lookahead_selects_second_alternative() {
    let program = program(CHOICE);
    let runtime = Runtime::builder(&program).build().unwrap();
    let mut registry = Registry::new();
    runtime.init(&mut registry);

    let vm = runtime.parse(registry.require("S").unwrap(), vec![]).unwrap();
    let Outcome::Done(object) = vm.resume(&Stream::complete(*b"yz")).unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(json(&program, &object), r#"{"x":null,"y":"y"}"#);
}

#[test]
fn lookahead_rejects_unknown_token() {
    let program = program(CHOICE);

    let err = run(&program, "S", b"q").unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"parse error at offset 0: expected "x" | "y", found byte 0x71"#
    );
    let parse = err.as_parse_error().unwrap();
    assert_eq!(parse.position, 0);
}

#[test]
fn literal_after_choice_rejects_wrong_byte() {
    let program = program(CHOICE);

    let err = run(&program, "S", b"xx").unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"parse error at offset 1: expected "z", found byte 0x78"#
    );
}

#[test]
fn truncated_input_is_a_parse_error_once_frozen() {
    let program = program(CHOICE);

    let err = run(&program, "S", b"x").unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"parse error at offset 1: expected "z", found end of data"#
    );
}

#[test]
fn doubly_nested_child_suspends_and_resumes() {
    let program = program(NESTED);
    let runtime = Runtime::builder(&program).build().unwrap();
    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let mut stream = Stream::new();
    stream.append(b"<\x03ab");

    let vm = runtime.parse(registry.require("Outer").unwrap(), vec![]).unwrap();
    let Outcome::Suspended(vm) = vm.resume(&stream).unwrap() else {
        panic!("expected suspension");
    };
    let point = vm.resume_point();
    assert_eq!(program.routine(point.routine).name, "inner_parse_inner");
    assert_eq!(point.depth, 4);
    assert_eq!(point.state.position, 2);

    stream.append(b"c.");
    let Outcome::Suspended(vm) = vm.resume(&stream).unwrap() else {
        panic!("expected suspension");
    };
    assert_eq!(program.routine(vm.resume_point().routine).name, "middle_parse_middle");

    stream.append(b"\x01\x02>");
    let Outcome::Done(object) = vm.resume(&stream).unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(
        json(&program, &object),
        r#"{"middle":{"len":3,"inner":{"body":"abc"},"check":258}}"#
    );
}

#[test]
fn nested_parse_error_reports_absolute_offset() {
    let program = program(NESTED);

    let err = run(&program, "Outer", b"<\x02ab!").unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"parse error at offset 4: expected ".", found byte 0x21"#
    );
}

#[test]
fn switch_dispatches_cases_and_default() {
    let program = program(MSG);

    let short = run(&program, "Msg", b"\x01\x05").unwrap();
    let trailer = run(&program, "Msg", b"\x01\x05\x07").unwrap();
    let fallback = run(&program, "Msg", b"\x09abc").unwrap();

    assert_eq!(
        json(&program, &short),
        r#"{"tag":1,"n":5,"raw":null,"trailer":null}"#
    );
    assert_eq!(
        json(&program, &trailer),
        r#"{"tag":1,"n":5,"raw":null,"trailer":7}"#
    );
    assert_eq!(
        json(&program, &fallback),
        r#"{"tag":9,"n":null,"raw":"abc","trailer":null}"#
    );
}

#[test]
fn switch_without_default_rejects_unknown_case() {
    let program = program(indoc! {r#"
        {
            "name": "Tagged",
            "productions": {
                "msg": { "kind": "sequence", "members": ["tag", "body"] },
                "tag": { "kind": "variable", "unpack": "uint8", "name": "tag" },
                "body": {
                    "kind": "switch",
                    "discriminant": { "field": "tag" },
                    "cases": [{ "value": 1, "production": "one" }]
                },
                "one": { "kind": "variable", "unpack": "uint8", "name": "one" }
            }
        }
    "#});

    let err = run(&program, "Tagged", b"\x09").unwrap_err();

    assert_eq!(
        err.to_string(),
        "parse error at offset 1: unexpected case 9 in `body`"
    );
}

#[test]
fn parameters_bind_entry_arguments() {
    let program = program(NESTED);
    let runtime = Runtime::builder(&program).build().unwrap();

    let object = run_with(runtime, "Inner", vec![Value::UInt(2)], &[b"hi."]).unwrap();

    assert_eq!(json(&program, &object), r#"{"body":"hi"}"#);
    assert_eq!(object.slots.last(), Some(&Value::UInt(2)));
}

#[test]
fn argument_count_is_checked() {
    let program = program(NESTED);
    let runtime = Runtime::builder(&program).build().unwrap();

    let err = run_with(runtime, "Inner", vec![], &[b"hi."]).unwrap_err();

    assert_eq!(err.to_string(), "parser `Inner` takes 1 arguments, 0 given");
}

#[test]
fn eod_lookahead_ends_repetition() {
    let program = program(indoc! {r#"
        {
            "name": "List",
            "variables": [{ "name": "items", "type": { "list": "uint" }, "default": [] }],
            "productions": {
                "start": { "kind": "sequence", "members": ["a", "items"] },
                "a": { "kind": "literal", "value": "A", "id": 1 },
                "items": {
                    "kind": "lookahead",
                    "alternatives": ["more", "done"],
                    "lookahead": [[2], ["eod"]]
                },
                "more": { "kind": "sequence", "members": ["item", "items"] },
                "item": { "kind": "sequence", "members": ["marker", "value"] },
                "marker": { "kind": "literal", "value": "I", "id": 2 },
                "value": {
                    "kind": "variable",
                    "unpack": "uint8",
                    "name": "value",
                    "hooks": [{ "name": "append", "args": ["items"] }]
                },
                "done": { "kind": "epsilon" }
            }
        }
    "#});

    insta::assert_snapshot!(
        assert_chunking_invariant(&program, "List", b"AI\x01I\x02"),
        @r#"{"value":2,"items":[1,2]}"#
    );
    let err = run(&program, "List", b"AX").unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"parse error at offset 1: expected "I" | end of data, found byte 0x58"#
    );
}

#[test]
fn control_hook_stops_repetition() {
    let program = program(indoc! {r#"
        {
            "name": "Terminated",
            "variables": [{ "name": "items", "type": { "list": "uint" }, "default": [] }],
            "productions": {
                "start": { "kind": "sequence", "members": ["list", "tail"] },
                "list": { "kind": "sequence", "members": ["item", "rest"] },
                "rest": { "kind": "boolean", "condition": "stop", "then": "done", "else": "list" },
                "done": { "kind": "epsilon" },
                "item": {
                    "kind": "variable",
                    "unpack": "uint8",
                    "name": "item",
                    "hooks": [
                        { "name": "append", "args": ["items"] },
                        { "name": "stop_if", "args": ["0"], "kind": "control" }
                    ]
                },
                "tail": { "kind": "variable", "unpack": "uint8", "name": "tail" }
            }
        }
    "#});

    insta::assert_snapshot!(
        assert_chunking_invariant(&program, "Terminated", b"\x05\x06\x00\x07"),
        @r#"{"item":0,"tail":7,"items":[5,6,0]}"#
    );
}

#[test]
fn hooks_run_by_descending_priority() {
    let program = program(indoc! {r#"
        {
            "name": "H",
            "productions": {
                "s": { "kind": "sequence", "members": ["v", "w"] },
                "v": {
                    "kind": "variable",
                    "unpack": "uint8",
                    "name": "v",
                    "hooks": [
                        { "name": "low", "priority": -1 },
                        { "name": "first" },
                        { "name": "high", "priority": 5 },
                        { "name": "second" }
                    ]
                },
                "w": {
                    "kind": "variable",
                    "unpack": "uint8",
                    "name": "w",
                    "hooks": [{ "name": "first" }]
                }
            }
        }
    "#});
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut callbacks = Callbacks::new();
    for name in ["low", "first", "high", "second"] {
        let log = Rc::clone(&log);
        callbacks = callbacks.hook(
            name,
            move |ctx: &mut HookContext<'_>| -> Result<HookAction, String> {
                let w = ctx.field("w").cloned().unwrap_or_default();
                log.borrow_mut()
                    .push(format!("{name} value={:?} w={w:?} @{}", ctx.value(), ctx.position()));
                Ok(HookAction::Continue)
            },
        );
    }
    let runtime = Runtime::builder(&program).callbacks(callbacks).build().unwrap();

    run_with(runtime, "H", vec![], &[b"\x01\x02"]).unwrap();

    insta::assert_debug_snapshot!(log.borrow(), @r#"
    [
        "high value=UInt(1) w=Null @1",
        "first value=UInt(1) w=Null @1",
        "second value=UInt(1) w=Null @1",
        "low value=UInt(1) w=Null @1",
        "first value=UInt(2) w=UInt(2) @2",
    ]
    "#);
}

#[test]
fn field_hook_cannot_stop() {
    let program = program(indoc! {r#"
        {
            "name": "F",
            "productions": {
                "v": { "kind": "variable", "unpack": "uint8", "name": "v", "hooks": [{ "name": "halt" }] }
            }
        }
    "#});
    let callbacks = Callbacks::new().hook(
        "halt",
        |_: &mut HookContext<'_>| -> Result<HookAction, String> { Ok(HookAction::Stop) },
    );
    let runtime = Runtime::builder(&program).callbacks(callbacks).build().unwrap();

    let err = run_with(runtime, "F", vec![], &[b"\x01"]).unwrap_err();

    assert_eq!(err.to_string(), "hook `halt` failed: only control hooks may stop");
}

#[test]
fn hook_errors_abort_the_parse() {
    let program = program(indoc! {r#"
        {
            "name": "F",
            "productions": {
                "v": { "kind": "variable", "unpack": "uint8", "name": "v", "hooks": [{ "name": "append", "args": ["v"] }] }
            }
        }
    "#});

    let err = run(&program, "F", b"\x01").unwrap_err();

    assert_eq!(err.to_string(), "hook `append` failed: field `v` holds uint");
}

#[test]
fn unregistered_callbacks_are_rejected_at_build() {
    let hooked = program(indoc! {r#"
        {
            "name": "F",
            "productions": {
                "v": { "kind": "variable", "unpack": "uint8", "name": "v", "hooks": [{ "name": "missing" }] }
            }
        }
    "#});
    let filtered = program(indoc! {r#"
        {
            "name": "F",
            "productions": {
                "v": { "kind": "variable", "unpack": "uint8", "name": "v", "filter": "missing" }
            }
        }
    "#});

    let hook_err = Runtime::builder(&hooked).build().err().unwrap();
    let filter_err = Runtime::builder(&filtered).build().err().unwrap();

    assert_eq!(hook_err.to_string(), "program calls unregistered hook `missing`");
    assert_eq!(
        filter_err.to_string(),
        "program calls unregistered filter `missing`"
    );
}

#[test]
fn filters_convert_unpacked_values() {
    let program = program(indoc! {r#"
        {
            "name": "Num",
            "productions": {
                "s": { "kind": "sequence", "members": ["digits", "scaled"] },
                "digits": { "kind": "variable", "unpack": { "bytes": { "const": 2 } }, "name": "digits", "filter": "ascii_uint" },
                "scaled": { "kind": "variable", "unpack": "uint8", "name": "scaled", "filter": "double" }
            }
        }
    "#});
    let callbacks = Callbacks::new().filter("double", |value: Value| -> Result<Value, String> {
        match value {
            Value::UInt(n) => Ok(Value::UInt(n * 2)),
            other => Err(format!("cannot double {}", other.type_name())),
        }
    });
    let runtime = Runtime::builder(&program).callbacks(callbacks).build().unwrap();

    let object = run_with(runtime, "Num", vec![], &[b"42\x05"]).unwrap();

    assert_eq!(json(&program, &object), r#"{"digits":42,"scaled":10}"#);
}

#[test]
fn filter_failure_is_reported() {
    let program = program(NESTED);
    let runtime = Runtime::builder(&program).build().unwrap();

    let err = run_with(runtime, "Inner", vec![Value::UInt(1)], &[b"\xff."]).unwrap_err();

    assert!(matches!(err, RuntimeError::Filter { ref name, .. } if name == "utf8"));
}

#[test]
fn tail_calls_keep_depth_constant() {
    let program = program(ITEMS);
    let runtime = Runtime::builder(&program).recursion_limit(8).build().unwrap();
    let mut input = b"A".to_vec();
    input.extend((0..5000u32).map(|i| (i % 251) as u8));

    let object = run_with(runtime, "Start", vec![], &[&input]).unwrap();

    let Some(Value::List(items)) = object.get(&program, "items") else {
        panic!("items should be a list");
    };
    assert_eq!(items.len(), 5000);
}

#[test]
fn left_recursion_hits_recursion_limit() {
    let program = program(indoc! {r#"
        {
            "name": "Left",
            "productions": {
                "list": { "kind": "lookahead", "alternatives": ["more", "done"], "lookahead": [[1], ["eod"]] },
                "more": { "kind": "sequence", "members": ["list", "item"] },
                "item": { "kind": "literal", "value": "i", "id": 1 },
                "done": { "kind": "epsilon" }
            }
        }
    "#});
    let routines: Vec<&str> = program.routines.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(routines, ["left_parse", "left_parse_list", "left_parse_more"]);

    let runtime = Runtime::builder(&program).recursion_limit(64).build().unwrap();
    let err = run_with(runtime, "Left", vec![], &[b"ii"]).unwrap_err();

    assert!(matches!(err, RuntimeError::RecursionLimitExceeded));
}

#[test]
fn fuel_is_counted_per_resume() {
    let program = program(ITEMS);
    let mut input = b"A".to_vec();
    input.extend(1..=30u8);

    let whole = Runtime::builder(&program).exec_fuel(40).build().unwrap();
    let err = run_with(whole, "Start", vec![], &[&input]).unwrap_err();
    assert!(matches!(err, RuntimeError::ExecFuelExhausted));

    let chunked = Runtime::builder(&program).exec_fuel(40).build().unwrap();
    let bytes: Vec<&[u8]> = input.chunks(1).collect();
    let object = run_with(chunked, "Start", vec![], &bytes).unwrap();
    let Some(Value::List(items)) = object.get(&program, "items") else {
        panic!("items should be a list");
    };
    assert_eq!(items.len(), 30);
}

#[test]
fn registry_holds_every_parser() {
    let program = program(NESTED);
    let runtime = Runtime::builder(&program).build().unwrap();
    let mut registry = Registry::new();

    runtime.init(&mut registry);

    let entries: Vec<(&str, &str, usize)> = registry
        .iter()
        .map(|p| (p.name.as_str(), p.init.as_str(), p.params.len()))
        .collect();
    assert_eq!(
        entries,
        [
            ("Outer", "outer_init", 0),
            ("Middle", "middle_init", 0),
            ("Inner", "inner_init", 1),
        ]
    );
    assert_eq!(
        registry.require("Nope").unwrap_err().to_string(),
        "unknown parser `Nope`"
    );
}
