//! Instruction set of generated routines.
//!
//! Every instruction that can observe insufficient input (`Literal`,
//! `LookAhead`, `Unpack`, `Branch`, `Switch`, `BeginChild`) has no side
//! effect before it decides to suspend. The runtime suspends by leaving the
//! instruction pointer on the instruction, so a resume retries it verbatim.

use pacgen_core::{ByteOrder, Constant, HookRef, TokenId};
use serde::{Deserialize, Serialize};

use crate::ids::{Addr, ExprId, RoutineId, SlotId, TokenSetId, TypeId};

/// One instruction. `A` is the jump target type: labels while generating,
/// [`Addr`] once laid out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Instruction<A = Addr> {
    /// Allocate the parse object and bind the entry arguments to its
    /// parameter slots.
    Enter { ty: TypeId },
    Call { routine: RoutineId },
    /// Call in tail position: transfer without pushing a return frame.
    TailCall { routine: RoutineId },
    /// Return to the caller, or finish the parse when no frame is left.
    Return,
    Jump { target: A },
    /// Match one literal, or claim the pending lookahead token.
    Literal { tokens: TokenSetId, id: TokenId },
    /// Resolve the next token against the union of both alternatives and
    /// dispatch on its id. A pending token is dispatched without matching.
    LookAhead {
        tokens: TokenSetId,
        dispatch: Vec<(TokenId, A)>,
    },
    Unpack {
        unpack: Unpack,
        filter: Option<String>,
    },
    /// Evaluate a condition, clear the stop flag, branch.
    Branch {
        condition: ExprId,
        then: A,
        otherwise: A,
    },
    /// First case equal to the discriminant wins.
    Switch {
        discriminant: ExprId,
        cases: Vec<(Constant, A)>,
        default: Option<A>,
        symbol: String,
    },
    /// Store the declared default into an unset slot.
    Starting { slot: SlotId, default: Constant },
    /// Store the last matched value (when `valued`) and run hooks, which are
    /// sorted by descending priority.
    Finished {
        slot: Option<SlotId>,
        valued: bool,
        hooks: Vec<HookRef>,
    },
    /// Evaluate arguments and push a nested parse object.
    BeginChild { ty: TypeId, args: Vec<ExprId> },
    /// Pop the nested parse object; it becomes the last matched value.
    EndChild,
}

impl<A> Instruction<A> {
    /// Convert jump targets, leaving everything else untouched.
    pub fn map_targets<B>(self, mut f: impl FnMut(A) -> B) -> Instruction<B> {
        match self {
            Self::Enter { ty } => Instruction::Enter { ty },
            Self::Call { routine } => Instruction::Call { routine },
            Self::TailCall { routine } => Instruction::TailCall { routine },
            Self::Return => Instruction::Return,
            Self::Jump { target } => Instruction::Jump { target: f(target) },
            Self::Literal { tokens, id } => Instruction::Literal { tokens, id },
            Self::LookAhead { tokens, dispatch } => Instruction::LookAhead {
                tokens,
                dispatch: dispatch.into_iter().map(|(id, a)| (id, f(a))).collect(),
            },
            Self::Unpack { unpack, filter } => Instruction::Unpack { unpack, filter },
            Self::Branch {
                condition,
                then,
                otherwise,
            } => Instruction::Branch {
                condition,
                then: f(then),
                otherwise: f(otherwise),
            },
            Self::Switch {
                discriminant,
                cases,
                default,
                symbol,
            } => Instruction::Switch {
                discriminant,
                cases: cases.into_iter().map(|(c, a)| (c, f(a))).collect(),
                default: default.map(f),
                symbol,
            },
            Self::Starting { slot, default } => Instruction::Starting { slot, default },
            Self::Finished {
                slot,
                valued,
                hooks,
            } => Instruction::Finished {
                slot,
                valued,
                hooks,
            },
            Self::BeginChild { ty, args } => Instruction::BeginChild { ty, args },
            Self::EndChild => Instruction::EndChild,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Enter { .. } => "enter",
            Self::Call { .. } => "call",
            Self::TailCall { .. } => "tail_call",
            Self::Return => "return",
            Self::Jump { .. } => "jump",
            Self::Literal { .. } => "literal",
            Self::LookAhead { .. } => "lookahead",
            Self::Unpack { .. } => "unpack",
            Self::Branch { .. } => "branch",
            Self::Switch { .. } => "switch",
            Self::Starting { .. } => "starting",
            Self::Finished { .. } => "finished",
            Self::BeginChild { .. } => "begin_child",
            Self::EndChild => "end_child",
        }
    }
}

/// Incremental unpack of a `Variable` value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Unpack {
    UInt { width: u8, order: ByteOrder },
    Int { width: u8, order: ByteOrder },
    Bytes { length: ExprId },
    BytesToEod,
}
