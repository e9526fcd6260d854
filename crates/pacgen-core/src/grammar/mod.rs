//! Grammar model.
//!
//! A [`Grammar`] owns an arena of [`Production`]s keyed by symbol plus a
//! start symbol, parameters and auxiliary variables. Grammars load from JSON
//! and round-trip through a compact binary format.

mod binary;
mod error;
mod json;
mod set;
mod types;

#[cfg(test)]
mod json_tests;

pub use error::GrammarError;
pub use set::GrammarSet;
pub use types::{
    ByteOrder, Case, CmpOp, Constant, Expr, Grammar, GrammarBuilder, HookKind, HookRef,
    Parameter, Production, ProductionKind, TokenId, ValueType, VarType, Variable,
};
