use pacgen_bytecode::{Addr, ExprId, Instruction, RoutineId, TypeId};

use super::ir::{InstructionIR, Label, Node};
use super::layout::layout;
use super::routines::{RoutineBody, RoutineKey};

fn routine(name: &str, body: Vec<Node>) -> RoutineBody {
    RoutineBody {
        name: name.to_owned(),
        key: RoutineKey::production("G", name),
        ty: TypeId(0),
        body,
    }
}

fn op(instr: InstructionIR) -> Node {
    Node::Op(instr)
}

#[test]
fn labels_resolve_across_routines() {
    let result = layout(vec![
        routine("a", vec![op(Instruction::Return)]),
        routine(
            "b",
            vec![
                op(Instruction::Branch {
                    condition: ExprId(0),
                    then: Label(0),
                    otherwise: Label(1),
                }),
                Node::Label(Label(0)),
                op(Instruction::EndChild),
                Node::Label(Label(1)),
                op(Instruction::Return),
            ],
        ),
    ]);

    assert_eq!(result.routines[0].entry, Addr(0));
    assert_eq!(result.routines[1].entry, Addr(1));
    assert_eq!(result.routines[1].symbol.as_deref(), Some("b"));
    assert_eq!(
        result.code[1],
        Instruction::Branch {
            condition: ExprId(0),
            then: Addr(2),
            otherwise: Addr(3),
        }
    );
}

#[test]
fn calls_before_return_become_tail_calls() {
    let call = |n| op(Instruction::Call {
        routine: RoutineId(n),
    });
    let result = layout(vec![routine(
        "r",
        vec![
            call(1),
            call(2),
            op(Instruction::Jump { target: Label(0) }),
            call(3),
            op(Instruction::EndChild),
            Node::Label(Label(0)),
            op(Instruction::Return),
        ],
    )]);

    let mnemonics: Vec<&str> = result.code.iter().map(|i| i.mnemonic()).collect();
    assert_eq!(
        mnemonics,
        ["call", "tail_call", "jump", "call", "end_child", "return"]
    );
}

#[test]
fn jump_cycles_are_not_tail_positions() {
    let result = layout(vec![routine(
        "r",
        vec![
            op(Instruction::Call {
                routine: RoutineId(0),
            }),
            Node::Label(Label(0)),
            op(Instruction::Jump { target: Label(0) }),
        ],
    )]);

    assert_eq!(result.code[0].mnemonic(), "call");
}
