//! Program assembly.
//!
//! - `ir` - labeled instructions produced while generating
//! - `routines` - the routine arena with forward-declared handles
//! - `token_table` - combined literal patterns compiled to sparse DFAs
//! - `layout` - address assignment, label resolution and tail calls

pub mod ir;
pub mod layout;
pub mod routines;
pub mod token_table;

#[cfg(test)]
mod layout_tests;

pub use ir::{InstructionIR, Label, Node};
pub use layout::layout;
pub use routines::{RoutineKey, RoutineTable};
pub use token_table::TokenTableBuilder;
