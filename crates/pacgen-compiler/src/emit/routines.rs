//! Routine arena.
//!
//! A routine's handle is reserved before its body is generated, so a
//! production that reaches itself again while being generated calls the
//! reserved handle instead of recursing in the generator.

use std::collections::HashMap;

use pacgen_bytecode::{RoutineId, TypeId};

use super::ir::Node;
use crate::{Error, Result};

/// What a routine realizes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoutineKey {
    /// Public entry of the named grammar.
    Entry(String),
    Production { grammar: String, symbol: String },
}

impl RoutineKey {
    pub fn production(grammar: &str, symbol: &str) -> Self {
        Self::Production {
            grammar: grammar.to_owned(),
            symbol: symbol.to_owned(),
        }
    }

    pub fn grammar(&self) -> &str {
        match self {
            Self::Entry(grammar) | Self::Production { grammar, .. } => grammar,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Entry(_) => None,
            Self::Production { symbol, .. } => Some(symbol),
        }
    }
}

/// A routine with its generated body.
#[derive(Clone, Debug)]
pub struct RoutineBody {
    pub name: String,
    pub key: RoutineKey,
    pub ty: TypeId,
    pub body: Vec<Node>,
}

#[derive(Debug)]
struct Slot {
    name: String,
    key: RoutineKey,
    ty: TypeId,
    /// `None` while the body is being generated.
    body: Option<Vec<Node>>,
}

/// Routines by key, in reservation order.
#[derive(Debug, Default)]
pub struct RoutineTable {
    lookup: HashMap<RoutineKey, RoutineId>,
    slots: Vec<Slot>,
}

impl RoutineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &RoutineKey) -> Option<RoutineId> {
        self.lookup.get(key).copied()
    }

    /// Register a handle for `key` whose body is defined later.
    pub fn reserve(&mut self, key: RoutineKey, name: String, ty: TypeId) -> Result<RoutineId> {
        if let Some(id) = self.lookup(&key) {
            return Ok(id);
        }
        let id = u32::try_from(self.slots.len()).map_err(|_| Error::Overflow("routines"))?;
        let id = RoutineId(id);
        self.lookup.insert(key.clone(), id);
        self.slots.push(Slot {
            name,
            key,
            ty,
            body: None,
        });
        Ok(id)
    }

    pub fn define(&mut self, id: RoutineId, body: Vec<Node>) {
        let slot = &mut self.slots[id.index()];
        assert!(slot.body.is_none(), "routine `{}` defined twice", slot.name);
        slot.body = Some(body);
    }

    pub fn is_defined(&self, id: RoutineId) -> bool {
        self.slots[id.index()].body.is_some()
    }

    pub fn name(&self, id: RoutineId) -> &str {
        &self.slots[id.index()].name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every routine reserved at or after `mark`.
    pub fn rollback(&mut self, mark: usize) {
        self.slots.truncate(mark);
        self.lookup.retain(|_, id| id.index() < mark);
    }

    /// All routines in handle order.
    ///
    /// # Panics
    /// If a reserved routine never received a body.
    pub fn into_bodies(self) -> Vec<RoutineBody> {
        self.slots
            .into_iter()
            .map(|slot| {
                let Some(body) = slot.body else {
                    panic!("routine `{}` reserved but never defined", slot.name);
                };
                RoutineBody {
                    name: slot.name,
                    key: slot.key,
                    ty: slot.ty,
                    body,
                }
            })
            .collect()
    }
}
