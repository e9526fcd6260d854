//! The parser generator.
//!
//! [`Pgen`] lowers grammars into suspendable routines. Leaf productions
//! (`Literal`, `Variable`, `Epsilon`) are emitted inline at their use site.
//! Every other production becomes exactly one routine per symbol, created on
//! first use: its handle is reserved before the body is generated, so
//! recursive grammars terminate and refer back to the reserved handle.
//!
//! Each production is bracketed by its `starting` step (store the declared
//! default) and its `finished` step (store the value, run hooks by
//! descending priority).

use std::collections::HashMap;
use std::mem;

use indexmap::IndexMap;

use pacgen_bytecode::{
    ExprId, ObjectType, ParserDef, Program, RoutineId, SlotExpr, SlotId, TokenSetId, TypeId,
    Unpack,
};
use pacgen_core::naming::{mangle, param_slot};
use pacgen_core::{Expr, Grammar, GrammarSet, Production, ProductionKind, TokenId, VarType};

use crate::analyze::{check, object_type};
use crate::emit::{
    InstructionIR, Label, Node, RoutineKey, RoutineTable, TokenTableBuilder, layout,
};
use crate::{Error, Result};

/// Per-grammar generation context.
#[derive(Debug)]
struct Scope<'g> {
    grammar: &'g Grammar,
    ty: TypeId,
    /// Literal bytes by token id.
    literals: HashMap<TokenId, &'g [u8]>,
}

/// Parser generator over a set of grammars.
///
/// Compilation is idempotent: compiling a grammar twice returns the entry
/// routine of the first compilation, and routines of productions shared
/// through child grammars are generated once.
pub struct Pgen<'g> {
    grammars: &'g GrammarSet,
    scopes: IndexMap<&'g str, Scope<'g>>,
    /// Grammars whose productions are being generated; innermost last.
    active: Vec<&'g str>,
    routines: RoutineTable,
    tokens: TokenTableBuilder,
    types: Vec<ObjectType>,
    exprs: Vec<SlotExpr>,
    parsers: Vec<ParserDef>,
    /// Body of the routine being generated.
    code: Vec<Node>,
    next_label: u32,
}

impl<'g> Pgen<'g> {
    pub fn new(grammars: &'g GrammarSet) -> Self {
        Self {
            grammars,
            scopes: IndexMap::new(),
            active: Vec::new(),
            routines: RoutineTable::new(),
            tokens: TokenTableBuilder::new(),
            types: Vec::new(),
            exprs: Vec::new(),
            parsers: Vec::new(),
            code: Vec::new(),
            next_label: 0,
        }
    }

    /// Generate the entry routine of grammar `name` and register it as a
    /// parser. Returns the grammar's parse-object type.
    pub fn compile(&mut self, name: &str) -> Result<TypeId> {
        if self.routines.lookup(&RoutineKey::Entry(name.to_owned())).is_some() {
            return Ok(self.scopes[name].ty);
        }

        let mark = (
            self.routines.len(),
            self.scopes.len(),
            self.types.len(),
            self.exprs.len(),
        );
        let result = self.compile_entry(name);
        if result.is_err() {
            // A grammar is prepared before the grammars it embeds, so a
            // failing child leaves its parents' scopes behind as well.
            let (routines, scopes, types, exprs) = mark;
            self.routines.rollback(routines);
            self.scopes.truncate(scopes);
            self.types.truncate(types);
            self.exprs.truncate(exprs);
            self.active.clear();
            self.code.clear();
        }
        result
    }

    fn compile_entry(&mut self, name: &str) -> Result<TypeId> {
        self.prepare(name)?;
        let scope = &self.scopes[name];
        let grammar = scope.grammar;
        let ty = scope.ty;

        let id = self.routines.reserve(
            RoutineKey::Entry(grammar.name().to_owned()),
            mangle(grammar.name(), "parse", None),
            ty,
        )?;

        self.active.push(grammar.name());
        let outer = mem::take(&mut self.code);
        self.push(InstructionIR::Enter { ty });
        let emitted = self.emit_production(grammar.start_production());
        self.push(InstructionIR::Return);
        let body = mem::replace(&mut self.code, outer);
        self.active.pop();
        emitted?;

        self.routines.define(id, body);
        self.parsers.push(ParserDef {
            name: grammar.name().to_owned(),
            description: grammar.description().to_owned(),
            parse: id,
            init: mangle(grammar.name(), "init", None),
            ty,
            params: grammar.params().to_vec(),
        });
        Ok(ty)
    }

    /// Check `name` and every grammar it embeds, and derive their types.
    fn prepare(&mut self, name: &str) -> Result<()> {
        if self.scopes.contains_key(name) {
            return Ok(());
        }
        let grammars = self.grammars;
        let Some(grammar) = grammars.get(name) else {
            return Err(Error::UnknownGrammar(name.to_owned()));
        };

        let issues = check(grammar, grammars);
        if !issues.is_empty() {
            return Err(Error::InvalidGrammar {
                grammar: name.to_owned(),
                issues,
            });
        }

        let ty = u16::try_from(self.types.len()).map_err(|_| Error::Overflow("object types"))?;
        let ty = TypeId(ty);
        self.types.push(object_type(grammar)?);

        let literals = grammar
            .productions()
            .filter_map(|p| match &p.kind {
                ProductionKind::Literal { value, id } => Some((*id, value.as_slice())),
                _ => None,
            })
            .collect();
        self.scopes.insert(
            grammar.name(),
            Scope {
                grammar,
                ty,
                literals,
            },
        );

        for production in grammar.productions() {
            if let ProductionKind::ChildGrammar { grammar: child, .. } = &production.kind {
                self.prepare(child)?;
            }
        }
        Ok(())
    }

    /// Emit `production` at the current position of the routine being
    /// generated: its starting step, its body, its finished step.
    pub fn emit_production(&mut self, production: &'g Production) -> Result<()> {
        self.emit_starting(production)?;
        self.emit_kind(production)?;
        self.emit_finished(production)
    }

    fn emit_starting(&mut self, production: &'g Production) -> Result<()> {
        let (Some(name), Some(default)) = (&production.name, &production.default) else {
            return Ok(());
        };
        let slot = self.field_slot(name)?;
        self.push(InstructionIR::Starting {
            slot,
            default: default.clone(),
        });
        Ok(())
    }

    fn emit_finished(&mut self, production: &'g Production) -> Result<()> {
        let valued = production.is_valued();
        let slot = match &production.name {
            Some(name) if valued => Some(self.field_slot(name)?),
            _ => None,
        };
        if slot.is_none() && production.hooks.is_empty() {
            return Ok(());
        }

        let mut hooks = production.hooks.clone();
        hooks.sort_by_key(|h| std::cmp::Reverse(h.priority));
        self.push(InstructionIR::Finished {
            slot,
            valued,
            hooks,
        });
        Ok(())
    }

    fn emit_kind(&mut self, production: &'g Production) -> Result<()> {
        match &production.kind {
            ProductionKind::Literal { id, .. } => {
                let tokens = self.token_set(&[*id])?;
                self.push(InstructionIR::Literal { tokens, id: *id });
            }
            ProductionKind::Variable { unpack, filter } => {
                let unpack = match unpack {
                    VarType::UInt { width, order } => Unpack::UInt {
                        width: *width,
                        order: *order,
                    },
                    VarType::Int { width, order } => Unpack::Int {
                        width: *width,
                        order: *order,
                    },
                    VarType::Bytes { length } => Unpack::Bytes {
                        length: self.lower_expr(length)?,
                    },
                    VarType::BytesToEod => Unpack::BytesToEod,
                };
                self.push(InstructionIR::Unpack {
                    unpack,
                    filter: filter.clone(),
                });
            }
            ProductionKind::Epsilon => {}
            ProductionKind::Sequence(_)
            | ProductionKind::LookAhead { .. }
            | ProductionKind::Boolean { .. }
            | ProductionKind::Switch { .. }
            | ProductionKind::ChildGrammar { .. } => {
                let routine = self.routine_for(production)?;
                self.push(InstructionIR::Call { routine });
            }
        }
        Ok(())
    }

    /// The routine realizing a composite production, generating it on
    /// first use.
    fn routine_for(&mut self, production: &'g Production) -> Result<RoutineId> {
        let (grammar, ty) = self.current();
        let key = RoutineKey::production(grammar.name(), &production.symbol);
        if let Some(id) = self.routines.lookup(&key) {
            return Ok(id);
        }

        let name = mangle(grammar.name(), "parse", Some(&production.symbol));
        let id = self.routines.reserve(key, name, ty)?;

        let outer = mem::take(&mut self.code);
        let emitted = self.emit_body(production);
        self.push(InstructionIR::Return);
        let body = mem::replace(&mut self.code, outer);
        emitted?;

        self.routines.define(id, body);
        Ok(id)
    }

    fn emit_body(&mut self, production: &'g Production) -> Result<()> {
        match &production.kind {
            ProductionKind::Sequence(members) => {
                for member in members {
                    let member = self.production(member);
                    self.emit_production(member)?;
                }
            }
            ProductionKind::LookAhead {
                alternatives,
                lookahead,
            } => {
                let labels = [self.label(), self.label()];
                let end = self.label();

                let ids: Vec<TokenId> = lookahead.iter().flatten().copied().collect();
                let tokens = self.token_set(&ids)?;
                let dispatch = lookahead
                    .iter()
                    .zip(labels)
                    .flat_map(|(set, label)| set.iter().map(move |id| (*id, label)))
                    .collect();
                self.push(InstructionIR::LookAhead { tokens, dispatch });

                for (i, (alternative, label)) in alternatives.iter().zip(labels).enumerate() {
                    self.bind(label);
                    let alternative = self.production(alternative);
                    self.emit_production(alternative)?;
                    if i == 0 {
                        self.push(InstructionIR::Jump { target: end });
                    }
                }
                self.bind(end);
            }
            ProductionKind::Boolean {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.lower_expr(condition)?;
                let then_label = self.label();
                let else_label = self.label();
                self.push(InstructionIR::Branch {
                    condition,
                    then: then_label,
                    otherwise: else_label,
                });

                self.bind(then_label);
                let then = self.production(then);
                self.emit_production(then)?;
                match otherwise {
                    Some(otherwise) => {
                        let end = self.label();
                        self.push(InstructionIR::Jump { target: end });
                        self.bind(else_label);
                        let otherwise = self.production(otherwise);
                        self.emit_production(otherwise)?;
                        self.bind(end);
                    }
                    None => self.bind(else_label),
                }
            }
            ProductionKind::Switch {
                discriminant,
                cases,
                default,
            } => {
                let discriminant = self.lower_expr(discriminant)?;
                let case_labels: Vec<Label> = cases.iter().map(|_| self.label()).collect();
                let default_label = default.as_ref().map(|_| self.label());
                let end = self.label();

                self.push(InstructionIR::Switch {
                    discriminant,
                    cases: cases
                        .iter()
                        .zip(&case_labels)
                        .map(|(case, label)| (case.value.clone(), *label))
                        .collect(),
                    default: default_label,
                    symbol: production.symbol.clone(),
                });

                let arms = cases
                    .iter()
                    .map(|c| c.production.as_str())
                    .zip(case_labels)
                    .chain(default.as_deref().zip(default_label));
                let arms: Vec<(&str, Label)> = arms.collect();
                let last = arms.len().saturating_sub(1);
                for (i, (symbol, label)) in arms.into_iter().enumerate() {
                    self.bind(label);
                    let arm = self.production(symbol);
                    self.emit_production(arm)?;
                    if i != last {
                        self.push(InstructionIR::Jump { target: end });
                    }
                }
                self.bind(end);
            }
            ProductionKind::ChildGrammar { grammar, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.lower_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                let (name, child, ty): (&'g str, &'g Grammar, TypeId) =
                    match self.scopes.get_key_value(grammar.as_str()) {
                        Some((name, scope)) => (*name, scope.grammar, scope.ty),
                        None => panic!("grammar `{grammar}` was not prepared"),
                    };
                let start = child.start_production();

                self.push(InstructionIR::BeginChild { ty, args });
                self.active.push(name);
                let emitted = self.emit_production(start);
                self.active.pop();
                emitted?;
                self.push(InstructionIR::EndChild);
            }
            ProductionKind::Literal { .. }
            | ProductionKind::Variable { .. }
            | ProductionKind::Epsilon => self.emit_kind(production)?,
        }
        Ok(())
    }

    /// Resolve names against the parse object of the current grammar.
    fn lower_expr(&mut self, expr: &Expr) -> Result<ExprId> {
        let lowered = self.lower(expr)?;
        let id = u32::try_from(self.exprs.len()).map_err(|_| Error::Overflow("expressions"))?;
        self.exprs.push(lowered);
        Ok(ExprId(id))
    }

    fn lower(&self, expr: &Expr) -> Result<SlotExpr> {
        Ok(match expr {
            Expr::Const(c) => SlotExpr::Const(c.clone()),
            Expr::Field(name) => SlotExpr::Slot(self.field_slot(name)?),
            Expr::Param(name) => {
                let (grammar, ty) = self.current();
                match self.types[ty.index()].slot_by_name(&param_slot(name)) {
                    Some(slot) => SlotExpr::Slot(slot),
                    None => {
                        return Err(Error::UnknownParam {
                            grammar: grammar.name().to_owned(),
                            param: name.clone(),
                        });
                    }
                }
            }
            Expr::AtEod => SlotExpr::AtEod,
            Expr::Stop => SlotExpr::Stop,
            Expr::Not(e) => SlotExpr::Not(self.boxed(e)?),
            Expr::And(a, b) => SlotExpr::And(self.boxed(a)?, self.boxed(b)?),
            Expr::Or(a, b) => SlotExpr::Or(self.boxed(a)?, self.boxed(b)?),
            Expr::Compare(op, a, b) => SlotExpr::Compare(*op, self.boxed(a)?, self.boxed(b)?),
            Expr::Len(e) => SlotExpr::Len(self.boxed(e)?),
        })
    }

    fn boxed(&self, expr: &Expr) -> Result<Box<SlotExpr>> {
        self.lower(expr).map(Box::new)
    }

    fn field_slot(&self, name: &str) -> Result<SlotId> {
        let (grammar, ty) = self.current();
        self.types[ty.index()]
            .slot_by_name(name)
            .ok_or_else(|| Error::UnknownField {
                grammar: grammar.name().to_owned(),
                field: name.to_owned(),
            })
    }

    /// Token set over `ids` in the current grammar.
    fn token_set(&mut self, ids: &[TokenId]) -> Result<TokenSetId> {
        let (grammar, _) = self.current();
        let grammar = grammar.name();
        let scope = self.scope();
        let mut literals: Vec<(TokenId, &'g [u8])> = Vec::with_capacity(ids.len());
        let mut accepts_eod = false;
        for id in ids {
            if id.is_eod() {
                accepts_eod = true;
                continue;
            }
            match scope.literals.get(id) {
                Some(literal) => literals.push((*id, *literal)),
                None => panic!("token {id} is not a literal of `{grammar}`"),
            }
        }
        self.tokens.intern(grammar, &literals, accepts_eod)
    }

    fn scope(&self) -> &Scope<'g> {
        let Some(&name) = self.active.last() else {
            panic!("no grammar is being generated");
        };
        &self.scopes[name]
    }

    /// Grammar being generated and its parse-object type.
    fn current(&self) -> (&'g Grammar, TypeId) {
        let scope = self.scope();
        (scope.grammar, scope.ty)
    }

    fn production(&self, symbol: &str) -> &'g Production {
        let (grammar, _) = self.current();
        match grammar.production(symbol) {
            Some(production) => production,
            None => panic!("unknown symbol `{symbol}` in grammar `{}`", grammar.name()),
        }
    }

    fn label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn bind(&mut self, label: Label) {
        self.code.push(Node::Label(label));
    }

    fn push(&mut self, instr: InstructionIR) {
        self.code.push(Node::Op(instr));
    }

    /// Lay out every generated routine into a program.
    pub fn finish(self) -> Program {
        let laid_out = layout(self.routines.into_bodies());
        Program {
            code: laid_out.code,
            routines: laid_out.routines,
            token_sets: self.tokens.finish(),
            types: self.types,
            exprs: self.exprs,
            parsers: self.parsers,
        }
    }
}
