//! Parse objects and the values they hold.

use std::cmp::Ordering;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use pacgen_bytecode::{ObjectType, Program, SlotId, TypeId};
use pacgen_core::{Colors, Constant};

/// A parsed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    Object(ParseObject),
}

/// Instance of a grammar's parse-object record.
///
/// Slots follow the field order of the record type; hidden parameter slots
/// come last.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseObject {
    pub ty: TypeId,
    pub slots: Vec<Value>,
}

impl ParseObject {
    /// A fresh object with every slot at its initial value.
    pub fn new(id: TypeId, ty: &ObjectType) -> Self {
        let slots = ty
            .slots
            .iter()
            .map(|slot| slot.init.as_ref().map(Value::from).unwrap_or_default())
            .collect();
        Self { ty: id, slots }
    }

    pub fn slot(&self, id: SlotId) -> &Value {
        &self.slots[id.index()]
    }

    pub fn slot_mut(&mut self, id: SlotId) -> &mut Value {
        &mut self.slots[id.index()]
    }

    /// Field `name`, looked up through the program's record type.
    pub fn get<'a>(&'a self, program: &Program, name: &str) -> Option<&'a Value> {
        let slot = program.ty(self.ty).slot_by_name(name)?;
        Some(self.slot(slot))
    }

    /// Serializable view with field names, hidden slots omitted.
    pub fn view<'a>(&'a self, program: &'a Program) -> ObjectView<'a> {
        ObjectView {
            program,
            object: self,
        }
    }

    /// Format as colored JSON, hidden slots omitted.
    pub fn format(&self, program: &Program, pretty: bool, colors: Colors) -> String {
        let mut out = String::new();
        format_object(&mut out, program, self, &colors, pretty, 0);
        out
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::UInt(n) => Value::UInt(*n),
            Constant::Int(n) => Value::Int(*n),
            Constant::Bytes(b) => Value::Bytes(b.clone()),
            Constant::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::UInt(_) => "uint",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Truth value for conditions: null, false, zero and empty are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::UInt(n) => *n != 0,
            Value::Int(n) => *n != 0,
            Value::Bytes(b) => !b.is_empty(),
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Non-negative integer value, for lengths.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::UInt(n) => usize::try_from(*n).ok(),
            Value::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Raw bytes of a bytes or text value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Ordering between comparable values. Integers compare across
    /// signedness; bytes and text compare bytewise.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::UInt(a), Value::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::Int(a), Value::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            _ => match (self.as_bytes(), other.as_bytes()) {
                (Some(a), Some(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    /// Equality as used by switch cases and comparisons.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match self.compare(other) {
            Some(ordering) => ordering == Ordering::Equal,
            None => self == other,
        }
    }

    /// Serializable view resolving nested objects through `program`.
    pub fn view<'a>(&'a self, program: &'a Program) -> ValueView<'a> {
        ValueView {
            program,
            value: self,
        }
    }

    /// Format value as colored JSON.
    ///
    /// Color scheme (jq-inspired):
    /// - Keys: symbol color
    /// - Bytes and text: literal color
    /// - Numbers, booleans: Normal
    /// - null: Dim
    /// - Structure `{}[]:,`: Dim
    pub fn format(&self, program: &Program, pretty: bool, colors: Colors) -> String {
        let mut out = String::new();
        format_value(&mut out, program, self, &colors, pretty, 0);
        out
    }
}

/// [`Value`] with field names for serialization.
pub struct ValueView<'a> {
    program: &'a Program,
    value: &'a Value,
}

/// [`ParseObject`] with field names for serialization.
pub struct ObjectView<'a> {
    program: &'a Program,
    object: &'a ParseObject,
}

impl Serialize for ValueView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Bytes(b) => serializer.serialize_str(&b.escape_ascii().to_string()),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&item.view(self.program))?;
                }
                seq.end()
            }
            Value::Object(object) => object.view(self.program).serialize(serializer),
        }
    }
}

impl Serialize for ObjectView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = visible_fields(self.program, self.object);
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, &value.view(self.program))?;
        }
        map.end()
    }
}

fn visible_fields<'a>(program: &'a Program, object: &'a ParseObject) -> Vec<(&'a str, &'a Value)> {
    program
        .ty(object.ty)
        .slots
        .iter()
        .zip(&object.slots)
        .filter(|(slot, _)| !slot.is_hidden())
        .map(|(slot, value)| (slot.name.as_str(), value))
        .collect()
}

fn format_value(
    out: &mut String,
    program: &Program,
    value: &Value,
    c: &Colors,
    pretty: bool,
    indent: usize,
) {
    match value {
        Value::Null => {
            out.push_str(c.dim);
            out.push_str("null");
            out.push_str(c.reset);
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::UInt(n) => out.push_str(&n.to_string()),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Bytes(b) => format_string(out, &b.escape_ascii().to_string(), c),
        Value::Text(s) => format_string(out, s, c),
        Value::List(items) => format_list(out, program, items, c, pretty, indent),
        Value::Object(object) => format_object(out, program, object, c, pretty, indent),
    }
}

fn format_string(out: &mut String, s: &str, c: &Colors) {
    out.push_str(c.literal);
    out.push('"');
    out.push_str(&escape_json_string(s));
    out.push('"');
    out.push_str(c.reset);
}

fn format_list(
    out: &mut String,
    program: &Program,
    items: &[Value],
    c: &Colors,
    pretty: bool,
    indent: usize,
) {
    out.push_str(c.dim);
    out.push('[');
    out.push_str(c.reset);

    if items.is_empty() {
        out.push_str(c.dim);
        out.push(']');
        out.push_str(c.reset);
        return;
    }

    let elem_indent = if pretty { indent + 2 } else { 0 };
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(c.dim);
            out.push(',');
            out.push_str(c.reset);
        }
        if pretty {
            out.push('\n');
            out.push_str(&" ".repeat(elem_indent));
        }
        format_value(out, program, item, c, pretty, elem_indent);
    }

    if pretty {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
    }
    out.push_str(c.dim);
    out.push(']');
    out.push_str(c.reset);
}

fn format_object(
    out: &mut String,
    program: &Program,
    object: &ParseObject,
    c: &Colors,
    pretty: bool,
    indent: usize,
) {
    out.push_str(c.dim);
    out.push('{');
    out.push_str(c.reset);

    let fields = visible_fields(program, object);
    if fields.is_empty() {
        out.push_str(c.dim);
        out.push('}');
        out.push_str(c.reset);
        return;
    }

    let field_indent = if pretty { indent + 2 } else { 0 };
    for (i, (key, value)) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push_str(c.dim);
            out.push(',');
            out.push_str(c.reset);
        }
        if pretty {
            out.push('\n');
            out.push_str(&" ".repeat(field_indent));
        }
        out.push_str(c.symbol);
        out.push('"');
        out.push_str(&escape_json_string(key));
        out.push('"');
        out.push_str(c.reset);
        out.push_str(c.dim);
        out.push(':');
        out.push_str(c.reset);
        if pretty {
            out.push(' ');
        }
        format_value(out, program, value, c, pretty, field_indent);
    }

    if pretty {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
    }
    out.push_str(c.dim);
    out.push('}');
    out.push_str(c.reset);
}

fn escape_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
