//! Compile grammars into a program file.

use std::fs;
use std::path::PathBuf;

use pacgen_core::Colors;

use super::loader;
use super::run_common::fail;

pub struct CompileArgs {
    pub grammar_path: PathBuf,
    pub output: PathBuf,
    pub color: bool,
}

pub fn run(args: CompileArgs) {
    let program = loader::load_program(&args.grammar_path).unwrap_or_else(|e| fail(&e));
    let bytes = program.save();

    if let Err(e) = fs::write(&args.output, &bytes) {
        fail(&format!("failed to write '{}': {e}", args.output.display()));
    }

    let c = Colors::new(args.color);
    eprintln!(
        "{}wrote{} {} ({} bytes, {} parsers, {} routines)",
        c.dim,
        c.reset,
        args.output.display(),
        bytes.len(),
        program.parsers.len(),
        program.routines.len()
    );
}
