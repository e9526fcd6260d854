//! Tracing infrastructure for debugging parses.
//!
//! The tracer is a zero-cost abstraction: with [`NoopTracer`] every method
//! is an `#[inline(always)]` empty function and the calls disappear.
//!
//! Tracing-only state (which routine is running, which parse object names
//! the slots) is kept by the tracer itself and never stored in the VM.

use pacgen_bytecode::format::{format_instruction, width_for_count};
use pacgen_bytecode::{Addr, Instruction, LookaheadState, Program, RoutineId, TokenSetId, TypeId};
use pacgen_core::Colors;

use super::error::ParseError;
use super::hooks::HookAction;
use super::resolver::MatchResult;
use super::value::Value;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Default: instructions, routine changes, suspends and errors.
    #[default]
    Default,
    /// Verbose (-v): adds token matches, values and hooks.
    Verbose,
    /// Very verbose (-vv): adds the four-tuple state on every instruction.
    VeryVerbose,
}

/// Tracer trait for VM execution instrumentation.
///
/// Each method is called at a specific point during execution:
/// - `trace_instruction` - before executing an instruction
/// - `trace_match` - after resolving a token set
/// - `trace_value` - after a literal or variable produced its value
/// - `trace_hook` - after a hook returned
/// - `trace_call` - when entering a routine (`tail` for tail calls)
/// - `trace_return` - when returning from a routine
/// - `trace_suspend` - when the parse suspends for more input
/// - `trace_resume` - when a suspended parse continues
/// - `trace_error` - when the input is rejected
pub trait Tracer {
    fn trace_instruction(&mut self, ip: Addr, instr: &Instruction, state: &LookaheadState);

    fn trace_match(&mut self, tokens: TokenSetId, result: &MatchResult);

    fn trace_value(&mut self, value: &Value);

    fn trace_hook(&mut self, name: &str, action: HookAction);

    fn trace_call(&mut self, routine: RoutineId, tail: bool);

    fn trace_return(&mut self);

    fn trace_suspend(&mut self, ip: Addr, state: &LookaheadState);

    fn trace_resume(&mut self, ip: Addr, state: &LookaheadState);

    fn trace_error(&mut self, error: &ParseError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_instruction(&mut self, _ip: Addr, _instr: &Instruction, _state: &LookaheadState) {}

    #[inline(always)]
    fn trace_match(&mut self, _tokens: TokenSetId, _result: &MatchResult) {}

    #[inline(always)]
    fn trace_value(&mut self, _value: &Value) {}

    #[inline(always)]
    fn trace_hook(&mut self, _name: &str, _action: HookAction) {}

    #[inline(always)]
    fn trace_call(&mut self, _routine: RoutineId, _tail: bool) {}

    #[inline(always)]
    fn trace_return(&mut self) {}

    #[inline(always)]
    fn trace_suspend(&mut self, _ip: Addr, _state: &LookaheadState) {}

    #[inline(always)]
    fn trace_resume(&mut self, _ip: Addr, _state: &LookaheadState) {}

    #[inline(always)]
    fn trace_error(&mut self, _error: &ParseError) {}
}

/// Tracer that collects execution trace lines for debugging.
pub struct PrintTracer<'p> {
    program: &'p Program,
    verbosity: Verbosity,
    lines: Vec<String>,
    /// Routines with a live frame; innermost last.
    routines: Vec<RoutineId>,
    /// Parse objects in scope, for slot names; innermost last.
    scopes: Vec<TypeId>,
    /// Address width for formatting.
    width: usize,
    colors: Colors,
}

impl<'p> PrintTracer<'p> {
    pub fn new(program: &'p Program, verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            program,
            verbosity,
            lines: Vec::new(),
            routines: Vec::new(),
            scopes: Vec::new(),
            width: width_for_count(program.code.len()),
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn push_label(&mut self) {
        let Some(&routine) = self.routines.last() else {
            return;
        };
        let c = self.colors;
        let name = &self.program.routine(routine).name;
        self.lines.push(format!("{}{name}{}:", c.symbol, c.reset));
    }

    fn add_subline(&mut self, content: &str) {
        self.lines.push(format!("    {content}"));
    }

    fn verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_instruction(&mut self, ip: Addr, instr: &Instruction, state: &LookaheadState) {
        let c = self.colors;
        let ty = match (instr, self.scopes.last()) {
            (_, Some(&ty)) => ty,
            (Instruction::Enter { ty }, None) => *ty,
            (_, None) => TypeId(0),
        };
        let content = format_instruction(self.program, self.program.ty(ty), instr, self.width);
        let mut line = format!("  {}{:0w$}{}  {content}", c.dim, ip.0, c.reset, w = self.width);
        if self.verbosity == Verbosity::VeryVerbose {
            line.push_str(&format!("  {}[{state}]{}", c.dim, c.reset));
        }
        self.lines.push(line);

        match instr {
            Instruction::Enter { ty } | Instruction::BeginChild { ty, .. } => self.scopes.push(*ty),
            Instruction::EndChild => {
                self.scopes.pop();
            }
            _ => {}
        }
    }

    fn trace_match(&mut self, _tokens: TokenSetId, result: &MatchResult) {
        if !self.verbose() {
            return;
        }
        let c = self.colors;
        let mark = match result {
            MatchResult::Found { .. } => format!("{}●{}", c.literal, c.reset),
            MatchResult::InsufficientInput => format!("{}…{}", c.dim, c.reset),
            MatchResult::NotFound | MatchResult::UnexpectedId(_) => {
                format!("{}○{}", c.error, c.reset)
            }
        };
        self.add_subline(&format!("{mark} {result}"));
    }

    fn trace_value(&mut self, value: &Value) {
        if !self.verbose() {
            return;
        }
        let formatted = value.format(self.program, false, self.colors);
        self.add_subline(&format!("= {formatted}"));
    }

    fn trace_hook(&mut self, name: &str, action: HookAction) {
        if !self.verbose() {
            return;
        }
        match action {
            HookAction::Continue => self.add_subline(&format!("+ {name}")),
            HookAction::Stop => self.add_subline(&format!("+ {name} → stop")),
        }
    }

    fn trace_call(&mut self, routine: RoutineId, tail: bool) {
        if tail {
            self.routines.pop();
        }
        self.routines.push(routine);
        self.push_label();
    }

    fn trace_return(&mut self) {
        self.routines.pop();
        self.push_label();
    }

    fn trace_suspend(&mut self, ip: Addr, state: &LookaheadState) {
        let c = self.colors;
        self.lines.push(format!(
            "  {}‖ suspended at {:0w$} {state}{}",
            c.dim,
            ip.0,
            c.reset,
            w = self.width
        ));
    }

    fn trace_resume(&mut self, ip: Addr, state: &LookaheadState) {
        let c = self.colors;
        self.lines.push(format!(
            "  {}▶ resumed at {:0w$} {state}{}",
            c.dim,
            ip.0,
            c.reset,
            w = self.width
        ));
    }

    fn trace_error(&mut self, error: &ParseError) {
        let c = self.colors;
        self.lines.push(format!("  {}✗ {error}{}", c.error, c.reset));
    }
}
