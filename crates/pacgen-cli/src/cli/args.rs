//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands.
//! The same definition is reused across commands, hidden with `.hide(true)`
//! where a command accepts but ignores it.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Grammar file or compiled program (positional).
pub fn grammar_path_arg() -> Arg {
    Arg::new("grammar_path")
        .value_name("GRAMMAR")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Grammar file (JSON or binary) or compiled program")
}

/// Input file to parse (positional).
pub fn input_path_arg() -> Arg {
    Arg::new("input_path")
        .value_name("INPUT")
        .value_parser(value_parser!(PathBuf))
        .help("Input file to parse (\"-\" for stdin)")
}

/// Inline input text (-s/--input).
pub fn input_text_arg() -> Arg {
    Arg::new("input_text")
        .short('s')
        .long("input")
        .value_name("TEXT")
        .conflicts_with("input_path")
        .help("Inline input text")
}

/// Parser to run (-p/--parser).
pub fn parser_arg() -> Arg {
    Arg::new("parser")
        .short('p')
        .long("parser")
        .value_name("NAME")
        .help("Parser to run (default: the first grammar)")
}

/// Parser arguments (--arg, repeatable).
pub fn param_arg() -> Arg {
    Arg::new("args")
        .long("arg")
        .value_name("VALUE")
        .action(ArgAction::Append)
        .help("Argument bound to the next grammar parameter")
}

/// Feed input in chunks (--chunk-size).
pub fn chunk_size_arg() -> Arg {
    Arg::new("chunk_size")
        .long("chunk-size")
        .value_name("N")
        .value_parser(value_parser!(u32).range(1..))
        .help("Feed the input N bytes per resume (default: all at once)")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Write output to file (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write output to file")
}

/// Output compact JSON (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON (default: pretty when stdout is a TTY)")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Verbosity level (-v for verbose, -vv for very verbose)")
}

/// Skip the parse object (--no-result).
pub fn no_result_arg() -> Arg {
    Arg::new("no_result")
        .long("no-result")
        .action(ArgAction::SetTrue)
        .help("Skip printing the parse object, show the trace only")
}

/// Execution fuel limit (--fuel).
pub fn fuel_arg() -> Arg {
    Arg::new("fuel")
        .long("fuel")
        .value_name("N")
        .default_value("1000000")
        .value_parser(value_parser!(u32))
        .help("Instructions allowed per resume")
}

/// Call depth limit (--recursion-limit).
pub fn recursion_limit_arg() -> Arg {
    Arg::new("recursion_limit")
        .long("recursion-limit")
        .value_name("N")
        .default_value("1024")
        .value_parser(value_parser!(u32))
        .help("Maximum call depth")
}
