//! Loading grammar files and compiled programs.
//!
//! The file kind is detected from its content: compiled programs start with
//! the `PGEN` magic, JSON grammars with `{` or `[`, anything else is read as
//! a binary grammar set.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use pacgen_bytecode::{MAGIC, Program, ProgramError};
use pacgen_core::{GrammarError, GrammarSet};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("{0}")]
    Grammar(#[from] GrammarError),

    #[error("{0}")]
    Program(#[from] ProgramError),

    #[error("{0}")]
    Compile(#[from] pacgen_compiler::Error),

    #[error("no grammars in '{0}'")]
    Empty(String),
}

/// Content of a grammar path.
#[derive(Debug)]
pub enum Loaded {
    Grammars(GrammarSet),
    Program(Program),
}

/// Read `path`, or stdin when it is `-`.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    let read_error = |source| LoadError::Read {
        path: path.display().to_string(),
        source,
    };
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).map_err(read_error)?;
        return Ok(buf);
    }
    fs::read(path).map_err(read_error)
}

pub fn load(path: &Path) -> Result<Loaded, LoadError> {
    let bytes = read_bytes(path)?;
    let loaded = detect(&bytes)?;
    if let Loaded::Grammars(set) = &loaded
        && set.is_empty()
    {
        return Err(LoadError::Empty(path.display().to_string()));
    }
    Ok(loaded)
}

/// Load `path` and compile it unless it already is a program.
pub fn load_program(path: &Path) -> Result<Program, LoadError> {
    match load(path)? {
        Loaded::Program(program) => Ok(program),
        Loaded::Grammars(set) => Ok(pacgen_compiler::compile_all(&set)?),
    }
}

pub fn detect(bytes: &[u8]) -> Result<Loaded, LoadError> {
    if bytes.starts_with(&MAGIC) {
        return Ok(Loaded::Program(Program::load(bytes)?));
    }
    if let Ok(text) = std::str::from_utf8(bytes)
        && text.trim_start().starts_with(['{', '['])
    {
        return Ok(Loaded::Grammars(GrammarSet::from_json(text)?));
    }
    Ok(Loaded::Grammars(GrammarSet::from_binary(bytes)?))
}
