//! Shared logic for exec and trace commands.

use std::path::PathBuf;

use pacgen_bytecode::Program;
use pacgen_vm::{
    Outcome, ParseObject, ParserInfo, Registry, Runtime, RuntimeError, Stream, Tracer, VM, Value,
};

use super::loader::{self, read_bytes};

pub struct RunArgs {
    pub grammar_path: PathBuf,
    pub input_path: Option<PathBuf>,
    pub input_text: Option<String>,
    pub parser: Option<String>,
    pub args: Vec<String>,
    pub chunk_size: Option<usize>,
    pub fuel: u32,
    pub recursion_limit: u32,
}

/// Load the program and the input, or exit with a diagnostic.
pub fn prepare(args: &RunArgs) -> (Program, Vec<u8>) {
    if let Some(path) = &args.input_path
        && path.as_os_str() == "-"
        && args.grammar_path.as_os_str() == "-"
    {
        fail("grammar and input cannot both be from stdin");
    }

    let program = loader::load_program(&args.grammar_path).unwrap_or_else(|e| fail(&e));
    let input = match (&args.input_text, &args.input_path) {
        (Some(text), _) => text.clone().into_bytes(),
        (None, Some(path)) => read_bytes(path).unwrap_or_else(|e| fail(&e)),
        (None, None) => fail("input is required: use positional argument or -s/--input"),
    };
    (program, input)
}

pub fn build_runtime<'p>(program: &'p Program, args: &RunArgs) -> Runtime<'p> {
    Runtime::builder(program)
        .exec_fuel(args.fuel)
        .recursion_limit(args.recursion_limit)
        .build()
        .unwrap_or_else(|e| fail(&e))
}

/// Parser by name, or the first one registered.
pub fn resolve_parser<'r>(registry: &'r Registry, name: Option<&str>) -> &'r ParserInfo {
    match name {
        Some(name) => registry.require(name).unwrap_or_else(|e| {
            let known: Vec<&str> = registry.iter().map(|p| p.name.as_str()).collect();
            eprintln!("error: {e}");
            eprintln!();
            eprintln!("Available parsers: {}", known.join(", "));
            std::process::exit(1);
        }),
        None => match registry.iter().next() {
            Some(parser) => parser,
            None => fail("program holds no parsers"),
        },
    }
}

/// Command-line argument as a parser argument: integers, booleans, or the
/// raw bytes of the text.
pub fn parse_arg(text: &str) -> Value {
    if let Ok(n) = text.parse::<u64>() {
        return Value::UInt(n);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Bytes(text.as_bytes().to_vec()),
    }
}

/// Feed `input` to `vm` in chunks of `chunk_size` bytes, resuming after
/// each, then freeze the stream and finish.
pub fn feed<T: Tracer>(
    mut vm: VM<'_>,
    input: &[u8],
    chunk_size: Option<usize>,
    tracer: &mut T,
) -> Result<ParseObject, RuntimeError> {
    let chunk_size = chunk_size.unwrap_or(input.len()).max(1);
    let mut stream = Stream::new();
    for chunk in input.chunks(chunk_size) {
        stream.append(chunk);
        match vm.resume_with(&stream, tracer)? {
            Outcome::Done(object) => return Ok(object),
            Outcome::Suspended(next) => vm = next,
        }
    }
    stream.freeze();
    match vm.resume_with(&stream, tracer)? {
        Outcome::Done(object) => Ok(object),
        Outcome::Suspended(vm) => {
            panic!("parse suspended on a frozen stream at {:?}", vm.resume_point())
        }
    }
}

pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1)
}
