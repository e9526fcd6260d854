#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Grammar model for pacgen.
//!
//! A grammar describes a binary wire format as a tree of productions:
//! literals, unpacked variables, sequences, two-way lookahead branches,
//! semantic conditionals, switches and embedded child grammars.
//!
//! - [`grammar`]: productions, grammars, JSON and binary formats
//! - [`naming`]: generated symbol names
//! - [`colors`]: ANSI palette shared by dumps and traces

pub mod colors;
pub mod grammar;
pub mod naming;


pub use colors::Colors;
pub use grammar::{
    ByteOrder, Case, CmpOp, Constant, Expr, Grammar, GrammarBuilder, GrammarError, GrammarSet,
    HookKind, HookRef, Parameter, Production, ProductionKind, TokenId, ValueType, VarType,
    Variable,
};
