//! Text rendering shared by the dump and the runtime tracer.

use std::fmt::Write as _;

use crate::expr::SlotExpr;
use crate::ids::{Addr, SlotId};
use crate::instructions::{Instruction, Unpack};
use crate::program::{ObjectType, Program};

/// Digits needed to print indices `0..count`.
pub fn width_for_count(count: usize) -> usize {
    count.saturating_sub(1).to_string().len()
}

/// Bytes as printable ASCII with `\xHH` escapes.
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

/// Render an expression, naming slots after the fields of `ty`.
pub fn format_expr(expr: &SlotExpr, ty: &ObjectType) -> String {
    match expr {
        SlotExpr::Const(c) => c.to_string(),
        SlotExpr::Slot(slot) => match ty.slots.get(slot.index()) {
            Some(s) => format!("self.{}", s.name),
            None => slot.to_string(),
        },
        SlotExpr::AtEod => "at_eod".to_owned(),
        SlotExpr::Stop => "stop".to_owned(),
        SlotExpr::Not(e) => format!("!{}", format_expr(e, ty)),
        SlotExpr::And(a, b) => format!("({} && {})", format_expr(a, ty), format_expr(b, ty)),
        SlotExpr::Or(a, b) => format!("({} || {})", format_expr(a, ty), format_expr(b, ty)),
        SlotExpr::Compare(op, a, b) => format!(
            "({} {} {})",
            format_expr(a, ty),
            op.as_str(),
            format_expr(b, ty)
        ),
        SlotExpr::Len(e) => format!("len({})", format_expr(e, ty)),
    }
}

/// Render one instruction's operands after its mnemonic.
///
/// `ty` is the parse object active in the enclosing routine; `w` the
/// address width.
pub fn format_instruction(
    program: &Program,
    ty: &ObjectType,
    instr: &Instruction,
    w: usize,
) -> String {
    let addr = |a: &Addr| format!("{:0w$}", a.0);
    let slot_name = |slot: SlotId| match ty.slots.get(slot.index()) {
        Some(s) => s.name.clone(),
        None => slot.to_string(),
    };

    let mut out = instr.mnemonic().to_owned();
    match instr {
        Instruction::Enter { ty: id } | Instruction::BeginChild { ty: id, .. } => {
            write!(out, " {id} {}", program.ty(*id).name).unwrap();
            if let Instruction::BeginChild { args, .. } = instr
                && !args.is_empty()
            {
                let args: Vec<_> = args
                    .iter()
                    .map(|e| format_expr(program.expr(*e), ty))
                    .collect();
                write!(out, " ({})", args.join(", ")).unwrap();
            }
        }
        Instruction::Call { routine } | Instruction::TailCall { routine } => {
            write!(out, " {}", program.routine(*routine).name).unwrap();
        }
        Instruction::Return | Instruction::EndChild => {}
        Instruction::Jump { target } => write!(out, " {}", addr(target)).unwrap(),
        Instruction::Literal { tokens, id } => {
            let set = program.token_set(*tokens);
            let literal = set.literal(*id).map(escape_bytes).unwrap_or_default();
            write!(out, " {tokens} {id} \"{literal}\"").unwrap();
        }
        Instruction::LookAhead { tokens, dispatch } => {
            let arms: Vec<_> = dispatch
                .iter()
                .map(|(id, a)| format!("{id} → {}", addr(a)))
                .collect();
            write!(out, " {tokens} [{}]", arms.join(", ")).unwrap();
        }
        Instruction::Unpack { unpack, filter } => {
            match unpack {
                Unpack::UInt { width, order } => write!(
                    out,
                    " {}",
                    pacgen_core::VarType::UInt {
                        width: *width,
                        order: *order
                    }
                ),
                Unpack::Int { width, order } => write!(
                    out,
                    " {}",
                    pacgen_core::VarType::Int {
                        width: *width,
                        order: *order
                    }
                ),
                Unpack::Bytes { length } => {
                    write!(out, " bytes[{}]", format_expr(program.expr(*length), ty))
                }
                Unpack::BytesToEod => write!(out, " bytes_eod"),
            }
            .unwrap();
            if let Some(filter) = filter {
                write!(out, " |> {filter}").unwrap();
            }
        }
        Instruction::Branch {
            condition,
            then,
            otherwise,
        } => {
            write!(
                out,
                " {} ? {} : {}",
                format_expr(program.expr(*condition), ty),
                addr(then),
                addr(otherwise)
            )
            .unwrap();
        }
        Instruction::Switch {
            discriminant,
            cases,
            default,
            ..
        } => {
            let arms: Vec<_> = cases
                .iter()
                .map(|(c, a)| format!("{c} → {}", addr(a)))
                .collect();
            let fallback = default.as_ref().map_or("error".to_owned(), addr);
            write!(
                out,
                " {} [{}] else {fallback}",
                format_expr(program.expr(*discriminant), ty),
                arms.join(", ")
            )
            .unwrap();
        }
        Instruction::Starting { slot, default } => {
            write!(out, " self.{} ?= {default}", slot_name(*slot)).unwrap();
        }
        Instruction::Finished {
            slot,
            valued: _,
            hooks,
        } => {
            match slot {
                Some(slot) => write!(out, " self.{}", slot_name(*slot)).unwrap(),
                None => out.push_str(" -"),
            }
            for hook in hooks {
                write!(out, " +{}({})", hook.name, hook.args.join(", ")).unwrap();
                if hook.priority != 0 {
                    write!(out, "@{}", hook.priority).unwrap();
                }
                if hook.kind == pacgen_core::HookKind::Control {
                    out.push('!');
                }
            }
        }
    }
    out
}
