//! Expressions with names resolved to parse-object slots.

use pacgen_core::{CmpOp, Constant};
use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// Expression over the slots of the current parse object.
///
/// Grammar parameters live in hidden slots, so field and parameter
/// references both lower to `Slot`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SlotExpr {
    Const(Constant),
    Slot(SlotId),
    AtEod,
    Stop,
    Not(Box<SlotExpr>),
    And(Box<SlotExpr>, Box<SlotExpr>),
    Or(Box<SlotExpr>, Box<SlotExpr>),
    Compare(CmpOp, Box<SlotExpr>, Box<SlotExpr>),
    Len(Box<SlotExpr>),
}
