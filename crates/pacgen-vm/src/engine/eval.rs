//! Expression evaluation against already parsed state.

use std::cmp::Ordering;

use pacgen_bytecode::{Flags, LookaheadState, SlotExpr};
use pacgen_core::CmpOp;

use super::error::RuntimeError;
use super::stream::Stream;
use super::value::{ParseObject, Value};

/// Result of evaluating an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Eval {
    Value(Value),
    /// `at_eod` cannot be decided before more bytes arrive or the stream
    /// is frozen.
    Insufficient,
}

/// Evaluation environment: the innermost parse object and the cursor.
pub struct Env<'a> {
    pub object: &'a ParseObject,
    pub stream: &'a Stream,
    pub state: &'a LookaheadState,
}

macro_rules! value {
    ($e:expr) => {
        match $e {
            Eval::Value(value) => value,
            Eval::Insufficient => return Ok(Eval::Insufficient),
        }
    };
}

pub fn eval(expr: &SlotExpr, env: &Env<'_>) -> Result<Eval, RuntimeError> {
    let value = match expr {
        SlotExpr::Const(c) => Value::from(c),
        SlotExpr::Slot(slot) => env.object.slot(*slot).clone(),
        SlotExpr::AtEod => {
            if env.state.position < env.stream.len() {
                Value::Bool(false)
            } else if env.stream.is_frozen() {
                Value::Bool(true)
            } else {
                return Ok(Eval::Insufficient);
            }
        }
        SlotExpr::Stop => Value::Bool(env.state.flags.contains(Flags::STOP)),
        SlotExpr::Not(e) => Value::Bool(!value!(eval(e, env)?).is_truthy()),
        SlotExpr::And(a, b) => {
            let lhs = value!(eval(a, env)?);
            if lhs.is_truthy() {
                Value::Bool(value!(eval(b, env)?).is_truthy())
            } else {
                Value::Bool(false)
            }
        }
        SlotExpr::Or(a, b) => {
            let lhs = value!(eval(a, env)?);
            if lhs.is_truthy() {
                Value::Bool(true)
            } else {
                Value::Bool(value!(eval(b, env)?).is_truthy())
            }
        }
        SlotExpr::Compare(op, a, b) => {
            let lhs = value!(eval(a, env)?);
            let rhs = value!(eval(b, env)?);
            Value::Bool(compare(*op, &lhs, &rhs)?)
        }
        SlotExpr::Len(e) => {
            let len = match value!(eval(e, env)?) {
                Value::Bytes(b) => b.len(),
                Value::Text(s) => s.len(),
                Value::List(items) => items.len(),
                other => {
                    return Err(RuntimeError::Type(format!(
                        "len() of {}",
                        other.type_name()
                    )));
                }
            };
            Value::UInt(len as u64)
        }
    };
    Ok(Eval::Value(value))
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => return Ok(lhs.loosely_eq(rhs)),
        CmpOp::Ne => return Ok(!lhs.loosely_eq(rhs)),
        _ => {}
    }
    let Some(ordering) = lhs.compare(rhs) else {
        return Err(RuntimeError::Type(format!(
            "cannot compare {} {} {}",
            lhs.type_name(),
            op.as_str(),
            rhs.type_name()
        )));
    };
    Ok(match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Eq | CmpOp::Ne => unreachable!(),
    })
}
