//! Call frames of the routine stack.

use pacgen_bytecode::{Addr, RoutineId};

/// Call frame pushed by a non-tail call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Where to continue on Return.
    pub return_addr: Addr,
    /// Routine the caller was running.
    pub caller: RoutineId,
}

/// Stack of active calls.
///
/// The whole stack lives in the suspended VM, so a parse suspended deep
/// inside nested routines resumes with every caller intact.
#[derive(Clone, Debug, Default)]
pub struct FrameArena {
    frames: Vec<Frame>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, return_addr: Addr, caller: RoutineId) {
        self.frames.push(Frame {
            return_addr,
            caller,
        });
    }

    /// Pop the innermost frame; `None` when returning from the entry routine.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
