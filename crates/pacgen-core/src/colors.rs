//! ANSI color codes for terminal output.
//!
//! - Symbol: routine, grammar and type names
//! - Literal: token bytes and values
//! - Error: parse failures in traces
//! - Dim: addresses, registers and structure

/// ANSI palette for dumps and traces.
///
/// Only standard 16-color codes, so output reads on light and dark themes.
#[derive(Clone, Copy, Debug)]
pub struct Colors {
    pub symbol: &'static str,
    pub literal: &'static str,
    pub error: &'static str,
    pub dim: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        symbol: "\x1b[34m",
        literal: "\x1b[32m",
        error: "\x1b[31m",
        dim: "\x1b[2m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        symbol: "",
        literal: "",
        error: "",
        dim: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.reset.is_empty()
    }
}
