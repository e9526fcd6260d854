//! Validate grammars without producing output.

use std::path::PathBuf;

use pacgen_core::Colors;

use super::loader::{self, LoadError};

pub struct CheckArgs {
    pub grammar_path: PathBuf,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let result = loader::load_program(&args.grammar_path);
    let Err(err) = result else {
        return;
    };

    let c = Colors::new(args.color);
    eprintln!("{}error{}: {err}", c.error, c.reset);
    if let LoadError::Compile(pacgen_compiler::Error::InvalidGrammar { issues, .. }) = &err {
        for issue in issues {
            eprintln!("  {}-{} {issue}", c.dim, c.reset);
        }
    }
    std::process::exit(1);
}
