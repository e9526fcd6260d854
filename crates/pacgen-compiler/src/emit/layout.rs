//! Instruction layout.
//!
//! Routines are placed contiguously in handle order, labels resolve to the
//! address of the instruction they precede, and every call whose
//! continuation is an immediate return becomes a tail call.

use std::collections::{HashMap, HashSet};

use pacgen_bytecode::{Addr, Instruction, Routine};

use super::ir::{Label, Node};
use super::routines::RoutineBody;

/// Laid-out code and the routine table pointing into it.
#[derive(Debug)]
pub struct LayoutResult {
    pub code: Vec<Instruction>,
    pub routines: Vec<Routine>,
}

pub fn layout(bodies: Vec<RoutineBody>) -> LayoutResult {
    let mut labels: HashMap<Label, Addr> = HashMap::new();
    let mut code_ir = Vec::new();
    let mut routines = Vec::with_capacity(bodies.len());

    for routine in bodies {
        let entry = Addr(code_ir.len() as u32);
        for node in routine.body {
            match node {
                Node::Label(label) => {
                    labels.insert(label, Addr(code_ir.len() as u32));
                }
                Node::Op(instr) => code_ir.push(instr),
            }
        }
        routines.push(Routine {
            name: routine.name,
            grammar: routine.key.grammar().to_owned(),
            symbol: routine.key.symbol().map(str::to_owned),
            ty: routine.ty,
            entry,
        });
    }

    let mut code: Vec<Instruction> = code_ir
        .into_iter()
        .map(|instr| {
            instr.map_targets(|label| match labels.get(&label) {
                Some(&addr) => addr,
                None => panic!("label {} was never bound", label.0),
            })
        })
        .collect();

    mark_tail_calls(&mut code);

    LayoutResult { code, routines }
}

/// Rewrite `call` into `tail_call` wherever control reaches `return` next.
fn mark_tail_calls(code: &mut [Instruction]) {
    for i in 0..code.len() {
        let Instruction::Call { routine } = code[i] else {
            continue;
        };
        if returns_from(code, Addr(i as u32 + 1)) {
            code[i] = Instruction::TailCall { routine };
        }
    }
}

/// Whether execution from `addr` reaches `return` through jumps alone.
fn returns_from(code: &[Instruction], mut addr: Addr) -> bool {
    let mut seen = HashSet::new();
    while seen.insert(addr) {
        match code.get(addr.index()) {
            Some(Instruction::Return) => return true,
            Some(Instruction::Jump { target }) => addr = *target,
            _ => return false,
        }
    }
    false
}
