//! Runtime engine for executing compiled pacgen programs.
//!
//! The VM runs generated routines against a [`Stream`], threading the
//! four-tuple lookahead state through every instruction and suspending
//! whenever a match needs bytes that have not arrived yet.

mod error;
mod eval;
mod frame;
mod hooks;
mod registry;
mod resolver;
mod stream;
mod trace;
mod unpack;
mod value;
mod vm;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod hooks_tests;
#[cfg(test)]
mod resolver_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod trace_tests;
#[cfg(test)]
mod value_tests;

pub use error::{ParseError, RuntimeError};
pub use hooks::{Callbacks, Filter, Hook, HookAction, HookContext};
pub use registry::{ParserInfo, Registry};
pub use resolver::{MatchResult, TokenMatcher};
pub use stream::Stream;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::{ParseObject, Value};
pub use vm::{FuelLimits, Outcome, ResumePoint, Runtime, RuntimeBuilder, VM};
