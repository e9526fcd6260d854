//! Test utilities.

use pacgen_bytecode::Program;
use pacgen_core::GrammarSet;

use super::{Outcome, ParseObject, Registry, Runtime, RuntimeError, Stream, Value};

/// Compile every grammar of a JSON document.
pub fn program(json: &str) -> Program {
    let grammars = GrammarSet::from_json(json).expect("test grammar should parse");
    pacgen_compiler::compile_all(&grammars).expect("test grammar should compile")
}

/// Parse `input` fed as one frozen stream.
pub fn run(program: &Program, parser: &str, input: &[u8]) -> Result<ParseObject, RuntimeError> {
    run_with(Runtime::builder(program).build()?, parser, Vec::new(), &[input])
}

/// Parse `chunks` fed one resume step at a time, then freeze.
pub fn run_chunks(
    program: &Program,
    parser: &str,
    chunks: &[&[u8]],
) -> Result<ParseObject, RuntimeError> {
    run_with(Runtime::builder(program).build()?, parser, Vec::new(), chunks)
}

pub fn run_with(
    runtime: Runtime<'_>,
    parser: &str,
    args: Vec<Value>,
    chunks: &[&[u8]],
) -> Result<ParseObject, RuntimeError> {
    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let info = registry.require(parser)?;

    let mut vm = runtime.parse(info, args)?;
    let mut stream = Stream::new();
    for chunk in chunks {
        stream.append(chunk);
        match vm.resume(&stream)? {
            Outcome::Done(object) => return Ok(object),
            Outcome::Suspended(next) => vm = next,
        }
    }
    stream.freeze();
    match vm.resume(&stream)? {
        Outcome::Done(object) => Ok(object),
        Outcome::Suspended(vm) => panic!("suspended on a frozen stream at {:?}", vm.resume_point()),
    }
}

/// Compact JSON of a parse object.
pub fn json(program: &Program, object: &ParseObject) -> String {
    serde_json::to_string(&object.view(program)).expect("parse objects serialize")
}

/// JSON of the object parsed from every two-chunk split and from
/// byte-at-a-time feeding, checked equal to the whole-input result.
pub fn assert_chunking_invariant(program: &Program, parser: &str, input: &[u8]) -> String {
    let whole = json(program, &run(program, parser, input).expect("whole input parses"));
    for split in 0..=input.len() {
        let (head, tail) = input.split_at(split);
        let object = run_chunks(program, parser, &[head, tail]).expect("split input parses");
        assert_eq!(json(program, &object), whole, "split at {split}");
    }
    let bytes: Vec<&[u8]> = input.chunks(1).collect();
    let object = run_chunks(program, parser, &bytes).expect("bytewise input parses");
    assert_eq!(json(program, &object), whole, "byte at a time");
    whole
}
