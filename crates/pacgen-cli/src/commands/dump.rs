//! Show the generated program.

use std::path::PathBuf;

use pacgen_core::Colors;

use super::loader;
use super::run_common::fail;

pub struct DumpArgs {
    pub grammar_path: PathBuf,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let program = loader::load_program(&args.grammar_path).unwrap_or_else(|e| fail(&e));
    print!("{}", pacgen_bytecode::dump(&program, Colors::new(args.color)));
}
