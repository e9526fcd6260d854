//! The compiled program and its file format.
//!
//! File layout: 4-byte magic, little-endian `u16` version, postcard body.

use pacgen_core::naming::is_param_slot;
use pacgen_core::{Constant, Parameter, TokenId, ValueType};
use serde::{Deserialize, Serialize};

use crate::expr::SlotExpr;
use crate::ids::{Addr, ExprId, RoutineId, SlotId, TokenSetId, TypeId};
use crate::instructions::{Instruction, Unpack};

pub const MAGIC: [u8; 4] = *b"PGEN";
pub const VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("not a pacgen program (bad magic)")]
    BadMagic,
    #[error("unsupported program version {0} (expected {VERSION})")]
    UnsupportedVersion(u16),
    #[error("program decode error: {0}")]
    Decode(#[from] postcard::Error),
    #[error("malformed program: {0}")]
    Malformed(String),
}

/// Everything generated for a set of grammars.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instruction>,
    pub routines: Vec<Routine>,
    pub token_sets: Vec<TokenSet>,
    pub types: Vec<ObjectType>,
    pub exprs: Vec<SlotExpr>,
    pub parsers: Vec<ParserDef>,
}

impl Program {
    pub fn save(&self) -> Vec<u8> {
        let body = postcard::to_allocvec(self).expect("serialization should not fail");
        let mut out = Vec::with_capacity(MAGIC.len() + 2 + body.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    pub fn load(bytes: &[u8]) -> Result<Self, ProgramError> {
        let Some(rest) = bytes.strip_prefix(&MAGIC) else {
            return Err(ProgramError::BadMagic);
        };
        let [lo, hi, body @ ..] = rest else {
            return Err(ProgramError::BadMagic);
        };
        let version = u16::from_le_bytes([*lo, *hi]);
        if version != VERSION {
            return Err(ProgramError::UnsupportedVersion(version));
        }
        let program: Self = postcard::from_bytes(body)?;
        program.verify()?;
        Ok(program)
    }

    /// Check that every index the runtime follows without bounds checks
    /// stays inside the program.
    fn verify(&self) -> Result<(), ProgramError> {
        let malformed = |what: String| Err(ProgramError::Malformed(what));
        let addr_ok = |addr: Addr| addr.index() < self.code.len();
        let routine_ok = |id: RoutineId| id.index() < self.routines.len();
        let type_ok = |id: TypeId| id.index() < self.types.len();
        let expr_ok = |id: ExprId| id.index() < self.exprs.len();
        let tokens_ok = |id: TokenSetId| id.index() < self.token_sets.len();

        for (i, routine) in self.routines.iter().enumerate() {
            if !addr_ok(routine.entry) || !type_ok(routine.ty) {
                return malformed(format!(
                    "routine {i} `{}` points outside the program",
                    routine.name
                ));
            }
        }
        for parser in &self.parsers {
            if !routine_ok(parser.parse) || !type_ok(parser.ty) {
                return malformed(format!(
                    "parser `{}` points outside the program",
                    parser.name
                ));
            }
        }
        for ty in &self.types {
            if ty.params.iter().any(|slot| slot.index() >= ty.slots.len()) {
                return malformed(format!(
                    "type `{}` has a parameter outside its slots",
                    ty.name
                ));
            }
        }

        for (i, instr) in self.code.iter().enumerate() {
            let ok = match instr {
                Instruction::Enter { ty } => type_ok(*ty),
                Instruction::Call { routine } | Instruction::TailCall { routine } => {
                    routine_ok(*routine)
                }
                Instruction::Jump { target } => addr_ok(*target),
                Instruction::Literal { tokens, .. } => tokens_ok(*tokens),
                Instruction::LookAhead { tokens, dispatch } => {
                    tokens_ok(*tokens) && dispatch.iter().all(|(_, target)| addr_ok(*target))
                }
                Instruction::Unpack {
                    unpack: Unpack::Bytes { length },
                    ..
                } => expr_ok(*length),
                Instruction::Branch {
                    condition,
                    then,
                    otherwise,
                } => expr_ok(*condition) && addr_ok(*then) && addr_ok(*otherwise),
                Instruction::Switch {
                    discriminant,
                    cases,
                    default,
                    ..
                } => {
                    expr_ok(*discriminant)
                        && cases.iter().all(|(_, target)| addr_ok(*target))
                        && default.is_none_or(addr_ok)
                }
                Instruction::BeginChild { ty, args } => {
                    type_ok(*ty) && args.iter().copied().all(expr_ok)
                }
                _ => true,
            };
            if !ok {
                return malformed(format!(
                    "instruction {i} ({}) points outside the program",
                    instr.mnemonic()
                ));
            }
        }

        match self.code.last() {
            None
            | Some(
                Instruction::Return | Instruction::TailCall { .. } | Instruction::Jump { .. },
            ) => Ok(()),
            Some(_) => malformed("code runs past its last instruction".to_owned()),
        }
    }

    pub fn instruction(&self, addr: Addr) -> &Instruction {
        &self.code[addr.index()]
    }

    pub fn routine(&self, id: RoutineId) -> &Routine {
        &self.routines[id.index()]
    }

    pub fn token_set(&self, id: TokenSetId) -> &TokenSet {
        &self.token_sets[id.index()]
    }

    pub fn ty(&self, id: TypeId) -> &ObjectType {
        &self.types[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &SlotExpr {
        &self.exprs[id.index()]
    }

    pub fn parser(&self, name: &str) -> Option<&ParserDef> {
        self.parsers.iter().find(|p| p.name == name)
    }

    pub fn routine_by_name(&self, name: &str) -> Option<RoutineId> {
        self.routines
            .iter()
            .position(|r| r.name == name)
            .map(|i| RoutineId(i as u32))
    }

    /// Routine whose body starts at `addr`.
    pub fn routine_at(&self, addr: Addr) -> Option<&Routine> {
        self.routines.iter().find(|r| r.entry == addr)
    }

    /// Routine whose body contains `addr`.
    pub fn routine_containing(&self, addr: Addr) -> Option<&Routine> {
        self.routines
            .iter()
            .filter(|r| r.entry <= addr)
            .max_by_key(|r| r.entry)
    }

    /// Names of all hooks and filters the program calls.
    pub fn callback_names(&self) -> (Vec<&str>, Vec<&str>) {
        let mut hooks = Vec::new();
        let mut filters = Vec::new();
        for instr in &self.code {
            match instr {
                Instruction::Finished { hooks: sites, .. } => {
                    hooks.extend(sites.iter().map(|h| h.name.as_str()));
                }
                Instruction::Unpack {
                    filter: Some(name), ..
                } => filters.push(name.as_str()),
                _ => {}
            }
        }
        hooks.sort_unstable();
        hooks.dedup();
        filters.sort_unstable();
        filters.dedup();
        (hooks, filters)
    }
}

/// A generated routine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// Generated symbol name.
    pub name: String,
    pub grammar: String,
    /// Production realized by the routine; `None` for entry routines.
    pub symbol: Option<String>,
    /// Parse object the routine's expressions read.
    pub ty: TypeId,
    pub entry: Addr,
}

/// One literal of a combined token pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPattern {
    pub id: TokenId,
    pub literal: Vec<u8>,
}

/// Combined pattern over a set of literals. Pattern `i` of the DFA
/// recognizes `patterns[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub name: String,
    pub patterns: Vec<TokenPattern>,
    /// Whether end of data is one of the expected tokens.
    pub accepts_eod: bool,
    /// Serialized sparse DFA; empty when there are no literal patterns.
    pub dfa: Vec<u8>,
}

impl TokenSet {
    pub fn contains(&self, id: TokenId) -> bool {
        (id.is_eod() && self.accepts_eod) || self.patterns.iter().any(|p| p.id == id)
    }

    pub fn literal(&self, id: TokenId) -> Option<&[u8]> {
        self.patterns
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.literal.as_slice())
    }

    /// Expected tokens for diagnostics: `"x" | "y" | end of data`.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .patterns
            .iter()
            .map(|p| format!("\"{}\"", p.literal.escape_ascii()))
            .collect();
        if self.accepts_eod {
            parts.push("end of data".to_owned());
        }
        parts.join(" | ")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub ty: ValueType,
    /// Value the slot holds when the object is allocated.
    pub init: Option<Constant>,
}

impl Slot {
    pub fn is_hidden(&self) -> bool {
        is_param_slot(&self.name)
    }
}

/// Record type of a grammar's parse object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub slots: Vec<Slot>,
    /// Hidden slots bound to the grammar parameters, in parameter order.
    pub params: Vec<SlotId>,
}

impl ObjectType {
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub fn slot_by_name(&self, name: &str) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.name == name)
            .map(|i| SlotId(i as u16))
    }
}

/// Registration metadata of a compiled grammar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParserDef {
    pub name: String,
    pub description: String,
    /// Entry routine.
    pub parse: RoutineId,
    /// Generated name of the registration routine.
    pub init: String,
    pub ty: TypeId,
    pub params: Vec<Parameter>,
}
