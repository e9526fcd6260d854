//! Labeled instructions.

use pacgen_bytecode::Instruction;

/// Symbolic jump target, resolved to an address by layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

pub type InstructionIR = Instruction<Label>;

/// One element of a routine body: an instruction or the label bound to the
/// instruction that follows it.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Label(Label),
    Op(InstructionIR),
}
