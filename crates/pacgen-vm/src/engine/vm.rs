//! Virtual machine running generated routines.
//!
//! A parse is a [`VM`] value: instruction pointer, call frames, the stack of
//! parse objects being filled and the four-tuple lookahead state. Running
//! out of input leaves the instruction pointer on the instruction that
//! needed more bytes and hands the whole VM back as
//! [`Outcome::Suspended`]; resuming retries that instruction.

use std::mem;

use pacgen_bytecode::{
    Addr, ExprId, Flags, Instruction, LookaheadState, Program, RoutineId, SlotId, TokenSetId,
    TypeId, Unpack,
};
use pacgen_core::{Colors, Constant, HookKind, HookRef, TokenId};

use super::error::{ParseError, RuntimeError};
use super::eval::{Env, Eval, eval};
use super::frame::FrameArena;
use super::hooks::{Callbacks, HookAction, HookContext};
use super::registry::{ParserInfo, Registry};
use super::resolver::{MatchResult, TokenMatcher};
use super::stream::Stream;
use super::trace::{NoopTracer, Tracer};
use super::unpack::{Unpacked, unpack};
use super::value::{ParseObject, Value};

/// Runtime limits for parse execution.
#[derive(Clone, Copy, Debug)]
pub struct FuelLimits {
    /// Maximum instructions per resume (default: 1,000,000).
    pub(crate) exec_fuel: u32,
    /// Maximum call depth (default: 1,024).
    pub(crate) recursion_limit: u32,
}

impl Default for FuelLimits {
    fn default() -> Self {
        Self {
            exec_fuel: 1_000_000,
            recursion_limit: 1024,
        }
    }
}

impl FuelLimits {
    /// Create new fuel limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution fuel limit.
    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }

    /// Set the recursion limit.
    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn get_exec_fuel(&self) -> u32 {
        self.exec_fuel
    }
    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
}

/// A program ready to parse: token tables deserialized, callbacks resolved.
pub struct Runtime<'p> {
    program: &'p Program,
    matcher: TokenMatcher<'p>,
    callbacks: Callbacks,
    limits: FuelLimits,
}

/// Builder for [`Runtime`] instances.
pub struct RuntimeBuilder<'p> {
    program: &'p Program,
    callbacks: Callbacks,
    limits: FuelLimits,
}

impl<'p> RuntimeBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            callbacks: Callbacks::new(),
            limits: FuelLimits::default(),
        }
    }

    /// Set the hooks and filters. Defaults to the built-ins.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Set the fuel limits.
    pub fn limits(mut self, limits: FuelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the execution fuel limit.
    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.limits = self.limits.exec_fuel(fuel);
        self
    }

    /// Set the recursion limit.
    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.limits = self.limits.recursion_limit(limit);
        self
    }

    /// Deserialize the token tables and check that every hook and filter
    /// the program calls is registered.
    pub fn build(self) -> Result<Runtime<'p>, RuntimeError> {
        let (hooks, filters) = self.program.callback_names();
        if let Some(name) = hooks
            .into_iter()
            .find(|name| self.callbacks.get_hook(name).is_none())
        {
            return Err(RuntimeError::UnknownHook(name.to_owned()));
        }
        if let Some(name) = filters
            .into_iter()
            .find(|name| self.callbacks.get_filter(name).is_none())
        {
            return Err(RuntimeError::UnknownFilter(name.to_owned()));
        }

        Ok(Runtime {
            program: self.program,
            matcher: TokenMatcher::new(self.program)?,
            callbacks: self.callbacks,
            limits: self.limits,
        })
    }
}

impl<'p> Runtime<'p> {
    /// Create a runtime builder.
    pub fn builder(program: &'p Program) -> RuntimeBuilder<'p> {
        RuntimeBuilder::new(program)
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn limits(&self) -> FuelLimits {
        self.limits
    }

    /// Run the registration step of every parser in the program.
    pub fn init(&self, registry: &mut Registry) {
        for def in &self.program.parsers {
            registry.register(ParserInfo::from(def));
        }
    }

    /// Start a parse with `parser`, binding `args` to its parameters.
    ///
    /// Nothing runs until the returned VM is resumed.
    pub fn parse(&self, parser: &ParserInfo, args: Vec<Value>) -> Result<VM<'_>, RuntimeError> {
        if self.program.parser(&parser.name).is_none() {
            return Err(RuntimeError::UnknownParser(parser.name.clone()));
        }
        if args.len() != parser.params.len() {
            return Err(RuntimeError::ArgumentCount {
                parser: parser.name.clone(),
                expected: parser.params.len(),
                given: args.len(),
            });
        }
        Ok(VM {
            runtime: self,
            ip: self.program.routine(parser.parse).entry,
            routine: parser.parse,
            state: LookaheadState::default(),
            frames: FrameArena::new(),
            objects: Vec::new(),
            value: Value::Null,
            args,
            started: false,
        })
    }
}

/// Result of running a parse until it finishes or needs more input.
#[derive(Debug)]
pub enum Outcome<'r> {
    Done(ParseObject),
    /// Resume with the same stream once more bytes are appended or the
    /// stream is frozen.
    Suspended(VM<'r>),
}

/// Where a suspended parse continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    pub routine: RoutineId,
    pub ip: Addr,
    pub state: LookaheadState,
    /// Number of live call frames.
    pub depth: usize,
}

/// Virtual machine state of one parse.
pub struct VM<'r> {
    runtime: &'r Runtime<'r>,
    ip: Addr,
    /// Routine containing `ip`.
    routine: RoutineId,
    state: LookaheadState,
    frames: FrameArena,
    /// Parse objects being filled; the entry object first, nested children
    /// after it.
    objects: Vec<ParseObject>,
    /// Value of the last matched literal, variable or child grammar.
    value: Value,
    /// Entry arguments, bound by `Enter`.
    args: Vec<Value>,
    started: bool,
}

impl std::fmt::Debug for VM<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("ip", &self.ip)
            .field("routine", &self.routine)
            .field("state", &self.state)
            .field("depth", &self.frames.depth())
            .finish_non_exhaustive()
    }
}

enum Step {
    Next,
    Suspend,
    Done(ParseObject),
}

impl<'r> VM<'r> {
    pub fn resume_point(&self) -> ResumePoint {
        ResumePoint {
            routine: self.routine,
            ip: self.ip,
            state: self.state,
            depth: self.frames.depth(),
        }
    }

    /// Run until the parse finishes or needs more input than `stream` holds.
    pub fn resume(self, stream: &Stream) -> Result<Outcome<'r>, RuntimeError> {
        self.resume_with(stream, &mut NoopTracer)
    }

    /// Like [`resume`](Self::resume), reporting every step to `tracer`.
    pub fn resume_with<T: Tracer>(
        mut self,
        stream: &Stream,
        tracer: &mut T,
    ) -> Result<Outcome<'r>, RuntimeError> {
        if self.started {
            tracer.trace_resume(self.ip, &self.state);
        } else {
            self.started = true;
            tracer.trace_call(self.routine, false);
        }

        let program = self.runtime.program;
        let mut fuel = self.runtime.limits.exec_fuel;
        loop {
            if fuel == 0 {
                return Err(RuntimeError::ExecFuelExhausted);
            }
            fuel -= 1;

            let instr = program.instruction(self.ip);
            tracer.trace_instruction(self.ip, instr, &self.state);
            match self.step(instr, stream, tracer) {
                Ok(Step::Next) => {}
                Ok(Step::Suspend) => {
                    tracer.trace_suspend(self.ip, &self.state);
                    return Ok(Outcome::Suspended(self));
                }
                Ok(Step::Done(object)) => return Ok(Outcome::Done(object)),
                Err(RuntimeError::Parse(err)) => {
                    tracer.trace_error(&err);
                    return Err(RuntimeError::Parse(err));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn step<T: Tracer>(
        &mut self,
        instr: &Instruction,
        stream: &Stream,
        tracer: &mut T,
    ) -> Result<Step, RuntimeError> {
        match instr {
            Instruction::Enter { ty } => {
                let args = mem::take(&mut self.args);
                let object = self.new_object(*ty, args);
                self.objects.push(object);
            }
            Instruction::Call { routine } => {
                if self.frames.depth() >= self.runtime.limits.recursion_limit as usize {
                    return Err(RuntimeError::RecursionLimitExceeded);
                }
                self.frames.push(self.ip.next(), self.routine);
                self.enter_routine(*routine);
                tracer.trace_call(*routine, false);
                return Ok(Step::Next);
            }
            Instruction::TailCall { routine } => {
                self.enter_routine(*routine);
                tracer.trace_call(*routine, true);
                return Ok(Step::Next);
            }
            Instruction::Return => {
                tracer.trace_return();
                let Some(frame) = self.frames.pop() else {
                    return Ok(Step::Done(self.finish()));
                };
                self.ip = frame.return_addr;
                self.routine = frame.caller;
                return Ok(Step::Next);
            }
            Instruction::Jump { target } => {
                self.ip = *target;
                return Ok(Step::Next);
            }
            Instruction::Literal { tokens, id } => {
                if !self.exec_literal(*tokens, *id, stream, tracer)? {
                    return Ok(Step::Suspend);
                }
            }
            Instruction::LookAhead { tokens, dispatch } => {
                return self.exec_lookahead(*tokens, dispatch, stream, tracer);
            }
            Instruction::Unpack { unpack, filter } => {
                if !self.exec_unpack(unpack, filter.as_deref(), stream, tracer)? {
                    return Ok(Step::Suspend);
                }
            }
            Instruction::Branch {
                condition,
                then,
                otherwise,
            } => {
                let Eval::Value(value) = self.eval(*condition, stream)? else {
                    return Ok(Step::Suspend);
                };
                self.state.flags.clear(Flags::STOP);
                self.ip = if value.is_truthy() { *then } else { *otherwise };
                return Ok(Step::Next);
            }
            Instruction::Switch {
                discriminant,
                cases,
                default,
                symbol,
            } => {
                let Eval::Value(value) = self.eval(*discriminant, stream)? else {
                    return Ok(Step::Suspend);
                };
                self.ip = self.switch_target(&value, cases, *default, symbol)?;
                return Ok(Step::Next);
            }
            Instruction::Starting { slot, default } => {
                let slot = self.top_mut().slot_mut(*slot);
                if *slot == Value::Null {
                    *slot = Value::from(default);
                }
            }
            Instruction::Finished {
                slot,
                valued,
                hooks,
            } => self.exec_finished(*slot, *valued, hooks, tracer)?,
            Instruction::BeginChild { ty, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    match self.eval(*arg, stream)? {
                        Eval::Value(value) => values.push(value),
                        Eval::Insufficient => return Ok(Step::Suspend),
                    }
                }
                let object = self.new_object(*ty, values);
                self.objects.push(object);
            }
            Instruction::EndChild => {
                let Some(child) = self.objects.pop() else {
                    panic!("end_child with no parse object open");
                };
                self.value = Value::Object(child);
            }
        }
        self.ip = self.ip.next();
        Ok(Step::Next)
    }

    fn enter_routine(&mut self, routine: RoutineId) {
        self.routine = routine;
        self.ip = self.runtime.program.routine(routine).entry;
    }

    /// Match a literal, or claim the pending lookahead token.
    ///
    /// Returns `false` when more input is needed.
    fn exec_literal<T: Tracer>(
        &mut self,
        tokens: TokenSetId,
        id: TokenId,
        stream: &Stream,
        tracer: &mut T,
    ) -> Result<bool, RuntimeError> {
        let result = self.runtime.matcher.resolve(tokens, stream, &self.state);
        tracer.trace_match(tokens, &result);
        match result {
            MatchResult::Found { id: found, end } => {
                if found != id {
                    panic!("token set {tokens} resolved {found} for literal {id}");
                }
                let start = match self.state.lookahead.take() {
                    Some(_) => self.state.lookahead_start,
                    None => self.state.position,
                };
                self.state.position = end;
                self.value = Value::Bytes(stream.slice(start, end).to_vec());
                tracer.trace_value(&self.value);
                Ok(true)
            }
            MatchResult::InsufficientInput => Ok(false),
            MatchResult::NotFound | MatchResult::UnexpectedId(_) => {
                Err(self.expected(tokens, result, stream).into())
            }
        }
    }

    fn exec_lookahead<T: Tracer>(
        &mut self,
        tokens: TokenSetId,
        dispatch: &[(TokenId, Addr)],
        stream: &Stream,
        tracer: &mut T,
    ) -> Result<Step, RuntimeError> {
        let result = self.runtime.matcher.resolve(tokens, stream, &self.state);
        tracer.trace_match(tokens, &result);
        match result {
            MatchResult::Found { id, end } => {
                let Some(&(_, target)) = dispatch.iter().find(|(token, _)| *token == id) else {
                    panic!("token {id} of set {tokens} selects no alternative");
                };
                if self.state.lookahead.is_none() {
                    self.state.lookahead = Some(id);
                    self.state.lookahead_start = self.state.position;
                    self.state.position = end;
                }
                self.ip = target;
                Ok(Step::Next)
            }
            MatchResult::InsufficientInput => Ok(Step::Suspend),
            MatchResult::NotFound | MatchResult::UnexpectedId(_) => {
                Err(self.expected(tokens, result, stream).into())
            }
        }
    }

    /// Returns `false` when more input is needed.
    fn exec_unpack<T: Tracer>(
        &mut self,
        spec: &Unpack,
        filter: Option<&str>,
        stream: &Stream,
        tracer: &mut T,
    ) -> Result<bool, RuntimeError> {
        match self.state.lookahead {
            Some(id) if !id.is_eod() => {
                panic!("variable unpacked while token {id} is pending")
            }
            _ => {}
        }

        let length = match spec {
            Unpack::Bytes { length } => match self.eval(*length, stream)? {
                Eval::Value(value) => match value.as_usize() {
                    Some(length) => Some(length),
                    None => {
                        return Err(RuntimeError::Type(format!(
                            "byte run length must be a non-negative integer, got {}",
                            value.type_name()
                        )));
                    }
                },
                Eval::Insufficient => return Ok(false),
            },
            _ => None,
        };

        let (mut value, end) = match unpack(spec, length, stream, self.state.position)? {
            Unpacked::Value(value, end) => (value, end),
            Unpacked::Insufficient => return Ok(false),
        };
        if let Some(name) = filter {
            let Some(callback) = self.runtime.callbacks.get_filter(name) else {
                return Err(RuntimeError::UnknownFilter(name.to_owned()));
            };
            value = callback
                .apply(value)
                .map_err(|message| RuntimeError::Filter {
                    name: name.to_owned(),
                    message,
                })?;
        }

        // End of data is a zero-width token, so a pending one is simply dropped.
        self.state.lookahead = None;
        self.state.position = end;
        self.value = value;
        tracer.trace_value(&self.value);
        Ok(true)
    }

    fn switch_target(
        &self,
        value: &Value,
        cases: &[(Constant, Addr)],
        default: Option<Addr>,
        symbol: &str,
    ) -> Result<Addr, RuntimeError> {
        let matched = cases
            .iter()
            .find(|(case, _)| value.loosely_eq(&Value::from(case)))
            .map(|(_, target)| *target);
        match matched.or(default) {
            Some(target) => Ok(target),
            None => {
                let shown = value.format(self.runtime.program, false, Colors::OFF);
                Err(ParseError::new(
                    self.state.position,
                    format!("unexpected case {shown} in `{symbol}`"),
                )
                .into())
            }
        }
    }

    /// Store the finished production's value and run its hooks in order.
    fn exec_finished<T: Tracer>(
        &mut self,
        slot: Option<SlotId>,
        valued: bool,
        hooks: &[HookRef],
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let runtime = self.runtime;
        let value = if valued {
            mem::take(&mut self.value)
        } else {
            Value::Null
        };
        let Some(object) = self.objects.last_mut() else {
            panic!("finished with no parse object open");
        };
        if let Some(slot) = slot {
            *object.slot_mut(slot) = value.clone();
        }

        for hook in hooks {
            let Some(callback) = runtime.callbacks.get_hook(&hook.name) else {
                return Err(RuntimeError::UnknownHook(hook.name.clone()));
            };
            let mut ctx = HookContext {
                ty: runtime.program.ty(object.ty),
                object: &mut *object,
                value: &value,
                args: &hook.args,
                position: self.state.position,
            };
            let action = callback
                .call(&mut ctx)
                .map_err(|message| RuntimeError::Hook {
                    name: hook.name.clone(),
                    message,
                })?;
            tracer.trace_hook(&hook.name, action);
            if action == HookAction::Stop {
                if hook.kind != HookKind::Control {
                    return Err(RuntimeError::Hook {
                        name: hook.name.clone(),
                        message: "only control hooks may stop".to_owned(),
                    });
                }
                self.state.flags.set(Flags::STOP);
            }
        }
        Ok(())
    }

    /// Parse error for a token set that did not resolve.
    fn expected(&self, tokens: TokenSetId, result: MatchResult, stream: &Stream) -> ParseError {
        let set = self.runtime.matcher.set(tokens);
        match result {
            MatchResult::UnexpectedId(pending) => {
                let found = if pending.is_eod() {
                    "end of data".to_owned()
                } else {
                    let bytes = stream.slice(self.state.lookahead_start, self.state.position);
                    format!("\"{}\"", bytes.escape_ascii())
                };
                ParseError::new(
                    self.state.lookahead_start,
                    format!("expected {}, found {found}", set.describe()),
                )
            }
            _ => {
                let found = match stream.remaining(self.state.position).first() {
                    Some(byte) => format!("byte 0x{byte:02x}"),
                    None => "end of data".to_owned(),
                };
                ParseError::new(
                    self.state.position,
                    format!("expected {}, found {found}", set.describe()),
                )
            }
        }
    }

    fn eval(&self, expr: ExprId, stream: &Stream) -> Result<Eval, RuntimeError> {
        let env = Env {
            object: self.top(),
            stream,
            state: &self.state,
        };
        eval(self.runtime.program.expr(expr), &env)
    }

    /// Allocate a parse object and bind `args` to its parameter slots.
    fn new_object(&self, ty: TypeId, args: Vec<Value>) -> ParseObject {
        let object_ty = self.runtime.program.ty(ty);
        let mut object = ParseObject::new(ty, object_ty);
        if args.len() != object_ty.params.len() {
            panic!(
                "`{}` takes {} arguments, {} bound",
                object_ty.name,
                object_ty.params.len(),
                args.len()
            );
        }
        for (slot, arg) in object_ty.params.iter().zip(args) {
            *object.slot_mut(*slot) = arg;
        }
        object
    }

    fn finish(&mut self) -> ParseObject {
        let Some(object) = self.objects.pop() else {
            panic!("parse finished without a parse object");
        };
        if !self.objects.is_empty() {
            panic!("parse finished with {} nested objects open", self.objects.len());
        }
        object
    }

    fn top(&self) -> &ParseObject {
        match self.objects.last() {
            Some(object) => object,
            None => panic!("no parse object is open"),
        }
    }

    fn top_mut(&mut self) -> &mut ParseObject {
        match self.objects.last_mut() {
            Some(object) => object,
            None => panic!("no parse object is open"),
        }
    }
}

