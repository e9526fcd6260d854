//! Runtime for pacgen parsers.
//!
//! This crate executes compiled programs against incrementally supplied
//! input. A parse that runs out of bytes suspends and is resumed later with
//! the same stream extended by more data.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod engine;

pub use engine::{
    Callbacks, Filter, FuelLimits, Hook, HookAction, HookContext, MatchResult, NoopTracer,
    Outcome, ParseError, ParseObject, ParserInfo, PrintTracer, Registry, ResumePoint, Runtime,
    RuntimeBuilder, RuntimeError, Stream, TokenMatcher, Tracer, VM, Value, Verbosity,
};
