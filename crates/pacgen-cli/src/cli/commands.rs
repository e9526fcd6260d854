//! Command builders for the CLI.
//!
//! Each command is built from the shared arg builders in `args.rs`. Every
//! command accepts every flag: the ones it ignores are hidden from `--help`,
//! so switching a command line from `exec` to `trace` or `dump` never fails
//! on a leftover flag.

use clap::Command;

use super::args::*;

/// Add hidden input args (for commands that don't parse input).
fn with_hidden_input_args(cmd: Command) -> Command {
    cmd.arg(input_path_arg().hide(true))
        .arg(input_text_arg().hide(true))
        .arg(parser_arg().hide(true))
        .arg(param_arg().hide(true))
        .arg(chunk_size_arg().hide(true))
}

/// Add hidden runtime args (for commands that don't run a parser).
fn with_hidden_runtime_args(cmd: Command) -> Command {
    cmd.arg(fuel_arg().hide(true))
        .arg(recursion_limit_arg().hide(true))
}

/// Add hidden trace args (for commands that don't trace).
fn with_hidden_trace_args(cmd: Command) -> Command {
    cmd.arg(verbose_arg().hide(true))
        .arg(no_result_arg().hide(true))
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("pacgen")
        .about("Incremental parser generator for binary protocols")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(dump_command())
        .subcommand(compile_command())
        .subcommand(exec_command())
        .subcommand(trace_command())
}

/// Validate grammars.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Validate grammars")
        .override_usage("  pacgen check <GRAMMAR>")
        .after_help(
            r#"EXAMPLES:
  pacgen check demos/tlv.json       # silent when every grammar compiles
  pacgen check demos/tlv.pgen       # compiled programs load or fail"#,
        )
        .arg(grammar_path_arg())
        .arg(color_arg());

    with_hidden_trace_args(with_hidden_runtime_args(with_hidden_input_args(
        cmd.arg(output_file_arg().hide(true))
            .arg(compact_arg().hide(true)),
    )))
}

/// Show generated routines.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Show generated routines, token sets and parse object types")
        .override_usage("  pacgen dump <GRAMMAR>")
        .after_help(
            r#"EXAMPLES:
  pacgen dump demos/tlv.json
  pacgen dump demos/tlv.pgen --color never"#,
        )
        .arg(grammar_path_arg())
        .arg(color_arg());

    with_hidden_trace_args(with_hidden_runtime_args(with_hidden_input_args(
        cmd.arg(output_file_arg().hide(true))
            .arg(compact_arg().hide(true)),
    )))
}

/// Compile grammars into a program file.
pub fn compile_command() -> Command {
    let cmd = Command::new("compile")
        .about("Compile grammars into a program file")
        .override_usage("  pacgen compile <GRAMMAR> -o <FILE>")
        .after_help(
            r#"EXAMPLES:
  pacgen compile demos/tlv.json -o tlv.pgen"#,
        )
        .arg(grammar_path_arg())
        .arg(output_file_arg().required(true))
        .arg(color_arg());

    with_hidden_trace_args(with_hidden_runtime_args(with_hidden_input_args(
        cmd.arg(compact_arg().hide(true)),
    )))
}

/// Parse input and print the parse object as JSON.
pub fn exec_command() -> Command {
    let cmd = Command::new("exec")
        .about("Parse input and print the parse object as JSON")
        .override_usage(
            "\
  pacgen exec <GRAMMAR> <INPUT>
  pacgen exec <GRAMMAR> -s <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  pacgen exec demos/tlv.json packet.bin
  pacgen exec demos/tlv.json packet.bin --chunk-size 1   # one byte per resume
  pacgen exec demos/http.json -s 'HTTP/1.1 200 OK'
  cat packet.bin | pacgen exec demos/tlv.json -"#,
        )
        .arg(grammar_path_arg())
        .arg(input_path_arg())
        .arg(input_text_arg())
        .arg(parser_arg())
        .arg(param_arg())
        .arg(chunk_size_arg())
        .arg(compact_arg())
        .arg(fuel_arg())
        .arg(recursion_limit_arg())
        .arg(color_arg());

    with_hidden_trace_args(cmd.arg(output_file_arg().hide(true)))
}

/// Trace parser execution for debugging.
pub fn trace_command() -> Command {
    let cmd = Command::new("trace")
        .about("Trace parser execution for debugging")
        .override_usage(
            "\
  pacgen trace <GRAMMAR> <INPUT>
  pacgen trace <GRAMMAR> -s <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  pacgen trace demos/tlv.json packet.bin
  pacgen trace demos/tlv.json packet.bin --chunk-size 2 -v
  pacgen trace demos/http.json -s 'HTTP/1.1 200 OK' -vv"#,
        )
        .arg(grammar_path_arg())
        .arg(input_path_arg())
        .arg(input_text_arg())
        .arg(parser_arg())
        .arg(param_arg())
        .arg(chunk_size_arg())
        .arg(verbose_arg())
        .arg(no_result_arg())
        .arg(fuel_arg())
        .arg(recursion_limit_arg())
        .arg(color_arg());

    cmd.arg(output_file_arg().hide(true))
        .arg(compact_arg().hide(true))
}
