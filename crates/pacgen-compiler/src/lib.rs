//! pacgen compiler: grammar checking and parser generation.
//!
//! This crate provides the compilation pipeline from grammars to programs:
//! - `analyze` - grammar-check pass and parse-object type derivation
//! - `emit` - routine arena, token tables, label layout
//! - `pgen` - the parser generator lowering productions to routines

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod emit;
pub mod pgen;

#[cfg(test)]
pub mod test_utils;

use pacgen_bytecode::Program;
use pacgen_core::GrammarSet;

pub use analyze::Issue;
pub use pgen::Pgen;

/// Errors that can occur while generating parsers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("unknown grammar `{0}`")]
    UnknownGrammar(String),

    #[error("grammar `{grammar}` failed validation with {} issues", issues.len())]
    InvalidGrammar { grammar: String, issues: Vec<Issue> },

    #[error("grammar `{grammar}`: unknown field `{field}`")]
    UnknownField { grammar: String, field: String },

    #[error("grammar `{grammar}`: unknown parameter `{param}`")]
    UnknownParam { grammar: String, param: String },

    #[error("failed to build token set `{name}`: {message}")]
    TokenBuild { name: String, message: String },

    #[error("too many {0}")]
    Overflow(&'static str),
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;

/// Compile the named grammars of `grammars` into one program.
pub fn compile(grammars: &GrammarSet, names: &[&str]) -> Result<Program> {
    let mut pgen = Pgen::new(grammars);
    for name in names {
        pgen.compile(name)?;
    }
    Ok(pgen.finish())
}

/// Compile every grammar of `grammars`, each as a registered parser.
pub fn compile_all(grammars: &GrammarSet) -> Result<Program> {
    let names: Vec<&str> = grammars.names().collect();
    compile(grammars, &names)
}
