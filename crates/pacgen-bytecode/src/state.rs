//! The four-tuple threaded through every generated routine.

use std::fmt;

use pacgen_core::TokenId;
use serde::{Deserialize, Serialize};

/// Control bits of [`LookaheadState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags(pub u8);

impl Flags {
    /// Raised by a control hook, consumed by the next `Branch`.
    pub const STOP: u8 = 0b0000_0001;

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u8) {
        self.0 |= bit;
    }

    pub fn clear(&mut self, bit: u8) {
        self.0 &= !bit;
    }
}

/// Cursor state of an in-flight parse.
///
/// Together with the instruction pointer and call stack this is the whole
/// continuation of a suspended parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookaheadState {
    /// Stream offset of the next unconsumed byte.
    pub position: usize,
    /// Token recognized by a lookahead but not yet claimed by a literal.
    pub lookahead: Option<TokenId>,
    /// Where the pending lookahead token starts; its bytes end at `position`.
    pub lookahead_start: usize,
    pub flags: Flags,
}

impl LookaheadState {
    pub fn at(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl fmt::Display for LookaheadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos={}", self.position)?;
        match self.lookahead {
            Some(id) => write!(f, " la={id}@{}", self.lookahead_start)?,
            None => f.write_str(" la=-")?,
        }
        if self.flags.contains(Flags::STOP) {
            f.write_str(" stop")?;
        }
        Ok(())
    }
}
