//! User callbacks: hooks run after a production finishes, filters convert
//! unpacked values.
//!
//! Both are registered by name in [`Callbacks`] and resolved when the
//! runtime is built, so a program never calls a missing callback.

use std::collections::HashMap;

use pacgen_bytecode::ObjectType;

use super::value::{ParseObject, Value};

/// What a hook asks of the parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    /// Raise the stop flag read by the next condition. Only control hooks
    /// may stop.
    Stop,
}

/// State visible to a running hook.
pub struct HookContext<'a> {
    pub(crate) ty: &'a ObjectType,
    pub(crate) object: &'a mut ParseObject,
    pub(crate) value: &'a Value,
    pub(crate) args: &'a [String],
    pub(crate) position: usize,
}

impl HookContext<'_> {
    /// Value of the production that just finished; null when it has none.
    pub fn value(&self) -> &Value {
        self.value
    }

    pub fn args(&self) -> &[String] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Stream offset just past the finished production.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn object(&self) -> &ParseObject {
        self.object
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        let slot = self.ty.slot_by_name(name)?;
        Some(self.object.slot(slot))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        let slot = self.ty.slot_by_name(name)?;
        Some(self.object.slot_mut(slot))
    }
}

/// A named hook. Closures taking a [`HookContext`] implement it.
pub trait Hook {
    fn call(&self, ctx: &mut HookContext<'_>) -> Result<HookAction, String>;
}

impl<F> Hook for F
where
    F: Fn(&mut HookContext<'_>) -> Result<HookAction, String>,
{
    fn call(&self, ctx: &mut HookContext<'_>) -> Result<HookAction, String> {
        self(ctx)
    }
}

/// A named value conversion applied after an unpack. Closures over
/// [`Value`] implement it.
pub trait Filter {
    fn apply(&self, value: Value) -> Result<Value, String>;
}

impl<F> Filter for F
where
    F: Fn(Value) -> Result<Value, String>,
{
    fn apply(&self, value: Value) -> Result<Value, String> {
        self(value)
    }
}

/// Hooks and filters by name.
pub struct Callbacks {
    hooks: HashMap<String, Box<dyn Hook>>,
    filters: HashMap<String, Box<dyn Filter>>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl Callbacks {
    /// Callbacks with the built-ins registered: hooks `append` and
    /// `stop_if`, filters `utf8` and `ascii_uint`.
    pub fn new() -> Self {
        Self::empty()
            .hook("append", Append)
            .hook("stop_if", StopIf)
            .filter("utf8", Utf8)
            .filter("ascii_uint", AsciiUInt)
    }

    pub fn empty() -> Self {
        Self {
            hooks: HashMap::new(),
            filters: HashMap::new(),
        }
    }

    /// Register `hook` as `name`, replacing any previous one.
    pub fn hook(mut self, name: impl Into<String>, hook: impl Hook + 'static) -> Self {
        self.hooks.insert(name.into(), Box::new(hook));
        self
    }

    /// Register `filter` as `name`, replacing any previous one.
    pub fn filter(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.filters.insert(name.into(), Box::new(filter));
        self
    }

    pub fn get_hook(&self, name: &str) -> Option<&dyn Hook> {
        self.hooks.get(name).map(|h| h.as_ref())
    }

    pub fn get_filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|f| f.as_ref())
    }
}

/// `append(list)`: push the value onto list field `list`.
struct Append;

impl Hook for Append {
    fn call(&self, ctx: &mut HookContext<'_>) -> Result<HookAction, String> {
        let Some(name) = ctx.arg(0) else {
            return Err("expects the name of a list field".to_owned());
        };
        let name = name.to_owned();
        let value = ctx.value.clone();
        match ctx.field_mut(&name) {
            Some(Value::List(items)) => items.push(value),
            Some(slot @ Value::Null) => *slot = Value::List(vec![value]),
            Some(other) => return Err(format!("field `{name}` holds {}", other.type_name())),
            None => return Err(format!("no field `{name}`")),
        }
        Ok(HookAction::Continue)
    }
}

/// `stop_if(sentinel)`: stop once the value equals `sentinel`, read as a
/// number when it parses as one and as bytes otherwise.
struct StopIf;

impl Hook for StopIf {
    fn call(&self, ctx: &mut HookContext<'_>) -> Result<HookAction, String> {
        let Some(arg) = ctx.arg(0) else {
            return Err("expects a sentinel argument".to_owned());
        };
        let sentinel = match arg.parse::<u64>() {
            Ok(n) => Value::UInt(n),
            Err(_) => Value::Bytes(arg.as_bytes().to_vec()),
        };
        if ctx.value.loosely_eq(&sentinel) {
            Ok(HookAction::Stop)
        } else {
            Ok(HookAction::Continue)
        }
    }
}

/// `utf8`: bytes to text.
struct Utf8;

impl Filter for Utf8 {
    fn apply(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::Bytes(bytes) => String::from_utf8(bytes)
                .map(Value::Text)
                .map_err(|e| e.to_string()),
            Value::Text(_) => Ok(value),
            other => Err(format!("expected bytes, got {}", other.type_name())),
        }
    }
}

/// `ascii_uint`: decimal digits to an unsigned integer.
struct AsciiUInt;

impl Filter for AsciiUInt {
    fn apply(&self, value: Value) -> Result<Value, String> {
        let Some(bytes) = value.as_bytes() else {
            return Err(format!("expected bytes, got {}", value.type_name()));
        };
        if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(format!("\"{}\" is not a decimal number", bytes.escape_ascii()));
        }
        bytes
            .iter()
            .try_fold(0u64, |acc, b| {
                acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
            })
            .map(Value::UInt)
            .ok_or_else(|| format!("\"{}\" overflows uint", bytes.escape_ascii()))
    }
}
