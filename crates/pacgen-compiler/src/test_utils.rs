//! Test utilities.

use pacgen_bytecode::{Program, dump};
use pacgen_core::{Colors, Grammar, GrammarSet, Production, TokenId};

/// Parse a JSON grammar document.
pub fn grammars(json: &str) -> GrammarSet {
    GrammarSet::from_json(json).expect("test grammar should parse")
}

pub fn single(grammar: Grammar) -> GrammarSet {
    GrammarSet::from_grammars([grammar]).expect("test grammar set should build")
}

/// Compile every grammar of a JSON document.
pub fn compile_json(json: &str) -> Program {
    crate::compile_all(&grammars(json)).expect("test grammar should compile")
}

/// Uncolored dump of every grammar of a JSON document.
pub fn dump_json(json: &str) -> String {
    dump(&compile_json(json), Colors::OFF)
}

/// `S -> choice "z"`, `choice -> "x" | "y"`, with `x` and `y` named.
pub fn choice_grammar() -> Grammar {
    Grammar::builder("S")
        .production(Production::sequence("s", ["choice", "z"]))
        .production(Production::lookahead(
            "choice",
            ["x", "y"],
            [vec![TokenId(1)], vec![TokenId(2)]],
        ))
        .production(Production::literal("x", *b"x", 1).named("x"))
        .production(Production::literal("y", *b"y", 2).named("y"))
        .production(Production::literal("z", *b"z", 3))
        .build()
        .expect("choice grammar is well-formed")
}
