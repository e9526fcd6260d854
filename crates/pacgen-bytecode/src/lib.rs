//! Program format and instruction set for pacgen.
//!
//! This crate contains:
//! - The instruction set generated routines are lowered to
//! - The [`Program`] container (routines, token sets, object types, parsers)
//!   and its binary file format
//! - The four-tuple [`LookaheadState`] threaded through every routine
//! - Dump formatting and DFA deserialization for the runtime

pub mod dfa;
pub mod dump;
pub mod expr;
pub mod format;
pub mod ids;
pub mod instructions;
pub mod program;
pub mod state;


pub use dump::dump;
pub use expr::SlotExpr;
pub use ids::{Addr, ExprId, RoutineId, SlotId, TokenSetId, TypeId};
pub use instructions::{Instruction, Unpack};
pub use program::{
    MAGIC, ObjectType, ParserDef, Program, ProgramError, Routine, Slot, TokenPattern, TokenSet,
    VERSION,
};
pub use state::{Flags, LookaheadState};
