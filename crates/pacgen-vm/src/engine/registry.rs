//! Parser registry.
//!
//! The host builds a [`Registry`] at startup and each compiled grammar's
//! registration step inserts its metadata into it.

use indexmap::IndexMap;

use pacgen_bytecode::{ParserDef, RoutineId, TypeId};
use pacgen_core::Parameter;

use super::error::RuntimeError;

/// Registration record of one parser.
#[derive(Clone, Debug, PartialEq)]
pub struct ParserInfo {
    pub name: String,
    pub description: String,
    /// Entry routine.
    pub parse: RoutineId,
    /// Generated name of the registration routine that produced this record.
    pub init: String,
    pub ty: TypeId,
    pub params: Vec<Parameter>,
}

impl From<&ParserDef> for ParserInfo {
    fn from(def: &ParserDef) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            parse: def.parse,
            init: def.init.clone(),
            ty: def.ty,
            params: def.params.clone(),
        }
    }
}

/// Parsers by name, in registration order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    parsers: IndexMap<String, ParserInfo>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `info`, returning the record it replaces.
    pub fn register(&mut self, info: ParserInfo) -> Option<ParserInfo> {
        self.parsers.insert(info.name.clone(), info)
    }

    pub fn get(&self, name: &str) -> Option<&ParserInfo> {
        self.parsers.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ParserInfo, RuntimeError> {
        self.get(name)
            .ok_or_else(|| RuntimeError::UnknownParser(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserInfo> {
        self.parsers.values()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
