use super::*;

#[test]
fn parse_minimal_grammar() {
    let json = r#"{
        "name": "Ping",
        "productions": {
            "start": { "kind": "literal", "value": "PING", "id": 1 }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.name(), "Ping");
    assert_eq!(grammar.start_symbol(), "start");
    assert_eq!(
        grammar.start_production().kind,
        ProductionKind::Literal {
            value: b"PING".to_vec(),
            id: TokenId(1)
        }
    );
}

#[test]
fn start_defaults_to_first_production() {
    let json = r#"{
        "name": "Pair",
        "productions": {
            "pair": { "kind": "sequence", "members": ["a", "b"] },
            "a": { "kind": "variable", "unpack": "uint8", "name": "a" },
            "b": { "kind": "variable", "unpack": "uint16le", "name": "b" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.start_symbol(), "pair");
    let b = grammar.production("b").unwrap();
    assert_eq!(b.name.as_deref(), Some("b"));
    assert_eq!(
        b.kind,
        ProductionKind::Variable {
            unpack: VarType::UInt {
                width: 2,
                order: ByteOrder::Little
            },
            filter: None
        }
    );
}

#[test]
fn parse_lookahead_with_eod() {
    let json = r#"{
        "name": "List",
        "start": "list",
        "productions": {
            "list": {
                "kind": "lookahead",
                "alternatives": ["more", "done"],
                "lookahead": [[1], ["eod"]]
            },
            "more": { "kind": "sequence", "members": ["item", "list"] },
            "item": { "kind": "literal", "value": [255], "id": 1 },
            "done": { "kind": "epsilon" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let ProductionKind::LookAhead { lookahead, .. } = &grammar.start_production().kind else {
        panic!("expected lookahead");
    };
    assert_eq!(lookahead[0], vec![TokenId(1)]);
    assert_eq!(lookahead[1], vec![TokenId::EOD]);
    assert_eq!(
        grammar.production("item").unwrap().kind,
        ProductionKind::Literal {
            value: vec![0xff],
            id: TokenId(1)
        }
    );
}

#[test]
fn parse_boolean_with_expression_and_hooks() {
    let json = r#"{
        "name": "Items",
        "productions": {
            "items": {
                "kind": "boolean",
                "name": "items",
                "type": { "list": "uint" },
                "default": [],
                "condition": { "not": { "or": ["stop", "at_eod"] } },
                "then": "next"
            },
            "next": { "kind": "sequence", "members": ["item", "items"] },
            "item": {
                "kind": "variable",
                "unpack": "uint8",
                "hooks": [
                    { "name": "append", "args": ["items"], "priority": 5 },
                    { "name": "stop_if", "args": ["0"], "kind": "control" }
                ]
            }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let items = grammar.start_production();
    assert_eq!(items.ty, Some(ValueType::List(Box::new(ValueType::UInt))));
    assert_eq!(items.default, Some(Constant::List(vec![])));
    let ProductionKind::Boolean {
        condition,
        otherwise,
        ..
    } = &items.kind
    else {
        panic!("expected boolean");
    };
    assert_eq!(condition, &!Expr::Stop.or(Expr::AtEod));
    assert_eq!(otherwise, &None);

    let hooks = &grammar.production("item").unwrap().hooks;
    assert_eq!(hooks[0], HookRef::field("append").arg("items").priority(5));
    assert_eq!(hooks[1], HookRef::control("stop_if").arg("0"));
}

#[test]
fn parse_switch_and_bytes_length() {
    let json = r#"{
        "name": "Tlv",
        "productions": {
            "tlv": { "kind": "sequence", "members": ["tag", "body"] },
            "tag": { "kind": "variable", "unpack": "uint8", "name": "tag" },
            "body": {
                "kind": "switch",
                "discriminant": { "field": "tag" },
                "cases": [{ "value": 1, "production": "blob" }],
                "default_case": "rest"
            },
            "blob": { "kind": "variable", "unpack": { "bytes": { "const": 4 } }, "name": "blob" },
            "rest": { "kind": "variable", "unpack": "bytes_eod", "name": "rest" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let ProductionKind::Switch {
        discriminant,
        cases,
        default,
    } = &grammar.production("body").unwrap().kind
    else {
        panic!("expected switch");
    };
    assert_eq!(discriminant, &Expr::field("tag"));
    assert_eq!(cases[0].value, Constant::UInt(1));
    assert_eq!(default.as_deref(), Some("rest"));
    assert_eq!(
        grammar.production("blob").unwrap().kind,
        ProductionKind::Variable {
            unpack: VarType::bytes(Expr::uint(4)),
            filter: None
        }
    );
}

#[test]
fn parse_grammar_set() {
    let json = r#"[
        {
            "name": "Outer",
            "productions": {
                "outer": { "kind": "child", "grammar": "Inner", "name": "inner", "args": [{ "const": 2 }] }
            }
        },
        {
            "name": "Inner",
            "params": [{ "name": "n", "type": "uint" }],
            "productions": {
                "inner": { "kind": "variable", "unpack": { "bytes": { "param": "n" } }, "name": "data" }
            }
        }
    ]"#;

    let set = GrammarSet::from_json(json).unwrap();
    assert_eq!(set.names().collect::<Vec<_>>(), ["Outer", "Inner"]);
    let inner = set.get("Inner").unwrap();
    assert_eq!(inner.params()[0].ty, ValueType::UInt);
}

#[test]
fn unknown_symbol_is_rejected() {
    let json = r#"{
        "name": "Broken",
        "productions": {
            "start": { "kind": "sequence", "members": ["missing"] }
        }
    }"#;

    let err = Grammar::from_json(json).unwrap_err();
    assert_eq!(
        err.to_string(),
        "grammar `Broken`: `start` refers to unknown symbol `missing`"
    );
}

#[test]
fn invalid_unpack_is_rejected() {
    let json = r#"{
        "name": "Broken",
        "productions": {
            "start": { "kind": "variable", "unpack": "uint12" }
        }
    }"#;

    let err = Grammar::from_json(json).unwrap_err();
    assert_eq!(err.to_string(), "`start`: unsupported integer width in `uint12`");
}

#[test]
fn invalid_token_name_is_rejected() {
    let json = r#"{
        "name": "Broken",
        "productions": {
            "start": {
                "kind": "lookahead",
                "alternatives": ["a", "a"],
                "lookahead": [[1], ["eof"]]
            },
            "a": { "kind": "literal", "value": "a", "id": 1 }
        }
    }"#;

    let err = Grammar::from_json(json).unwrap_err();
    assert!(matches!(err, GrammarError::InvalidToken { .. }));
}

#[test]
fn duplicate_grammar_is_rejected() {
    let json = r#"[
        { "name": "A", "productions": { "s": { "kind": "epsilon" } } },
        { "name": "A", "productions": { "s": { "kind": "epsilon" } } }
    ]"#;

    let err = GrammarSet::from_json(json).unwrap_err();
    assert_eq!(err.to_string(), "grammar `A` defined twice");
}
