use indoc::indoc;
use pacgen_bytecode::{LookaheadState, Program, TokenSetId};
use pacgen_core::TokenId;

use super::test_utils::program;
use super::{MatchResult, Stream, TokenMatcher};

fn methods() -> Program {
    program(indoc! {r#"
        {
            "name": "M",
            "productions": {
                "method": { "kind": "lookahead", "alternatives": ["get", "rest"], "lookahead": [[1], [2, "eod"]] },
                "get": { "kind": "literal", "value": "GET", "id": 1 },
                "rest": { "kind": "sequence", "members": ["put"] },
                "put": { "kind": "literal", "value": "PUT", "id": 2 }
            }
        }
    "#})
}

fn set_id(program: &Program, name: &str) -> TokenSetId {
    let Some(index) = program.token_sets.iter().position(|set| set.name == name) else {
        panic!("no token set `{name}`");
    };
    TokenSetId(index as u16)
}

fn unfrozen(bytes: &[u8]) -> Stream {
    let mut stream = Stream::new();
    stream.append(bytes);
    stream
}

#[test]
fn finds_each_literal_of_a_set() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let methods = set_id(&program, "m_tokens_1_2_eod");
    let state = LookaheadState::default();

    let get = matcher.resolve(methods, &unfrozen(b"GET /"), &state);
    let put = matcher.resolve(methods, &unfrozen(b"PUT"), &state);

    assert_eq!(get, MatchResult::Found { id: TokenId(1), end: 3 });
    assert_eq!(put, MatchResult::Found { id: TokenId(2), end: 3 });
}

#[test]
fn matches_from_current_position() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let put = set_id(&program, "m_tokens_2");

    let result = matcher.resolve(put, &unfrozen(b"xxPUTyy"), &LookaheadState::at(2));

    assert_eq!(result, MatchResult::Found { id: TokenId(2), end: 5 });
}

#[test]
fn proper_prefix_waits_for_input_until_frozen() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let get = set_id(&program, "m_tokens_1");
    let state = LookaheadState::default();

    let open = matcher.resolve(get, &unfrozen(b"GE"), &state);
    let frozen = matcher.resolve(get, &Stream::complete(*b"GE"), &state);

    assert_eq!(open, MatchResult::InsufficientInput);
    assert_eq!(frozen, MatchResult::NotFound);
}

#[test]
fn mismatching_byte_is_not_found() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let methods = set_id(&program, "m_tokens_1_2_eod");

    let result = matcher.resolve(methods, &unfrozen(b"GX"), &LookaheadState::default());

    assert_eq!(result, MatchResult::NotFound);
}

#[test]
fn end_of_data_is_a_token_only_when_frozen() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let with_eod = set_id(&program, "m_tokens_1_2_eod");
    let without_eod = set_id(&program, "m_tokens_1");
    let state = LookaheadState::at(3);
    let frozen = Stream::complete(*b"GET");

    assert_eq!(
        matcher.resolve(with_eod, &unfrozen(b"GET"), &state),
        MatchResult::InsufficientInput
    );
    assert_eq!(
        matcher.resolve(with_eod, &frozen, &state),
        MatchResult::Found { id: TokenId::EOD, end: 3 }
    );
    assert_eq!(
        matcher.resolve(without_eod, &frozen, &state),
        MatchResult::NotFound
    );
}

#[test]
fn pending_token_is_checked_without_reading() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();
    let get = set_id(&program, "m_tokens_1");
    let put = set_id(&program, "m_tokens_2");
    let state = LookaheadState {
        position: 3,
        lookahead: Some(TokenId(1)),
        lookahead_start: 0,
        ..LookaheadState::default()
    };
    let stream = Stream::new();

    assert_eq!(
        matcher.resolve(get, &stream, &state),
        MatchResult::Found { id: TokenId(1), end: 3 }
    );
    assert_eq!(
        matcher.resolve(put, &stream, &state),
        MatchResult::UnexpectedId(TokenId(1))
    );
}

#[test]
fn results_display() {
    let results = [
        MatchResult::Found { id: TokenId(1), end: 3 },
        MatchResult::Found { id: TokenId::EOD, end: 3 },
        MatchResult::NotFound,
        MatchResult::InsufficientInput,
        MatchResult::UnexpectedId(TokenId(2)),
    ];

    let shown: Vec<String> = results.iter().map(ToString::to_string).collect();

    insta::assert_debug_snapshot!(shown, @r#"
    [
        "found #1 ending at 3",
        "found eod ending at 3",
        "not found",
        "insufficient input",
        "unexpected pending #2",
    ]
    "#);
}

#[test]
fn describes_sets_for_errors() {
    let program = methods();
    let matcher = TokenMatcher::new(&program).unwrap();

    let methods = matcher.set(set_id(&program, "m_tokens_1_2_eod"));

    assert_eq!(methods.describe(), r#""GET" | "PUT" | end of data"#);
}
