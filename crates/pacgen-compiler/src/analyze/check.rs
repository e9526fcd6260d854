//! Grammar-check pass.
//!
//! Code generation trusts what this pass establishes: literal ids are
//! well-formed and bound to one value, the two lookahead sets of every
//! `LookAhead` are disjoint and resolvable, the union of those sets is
//! prefix-free, every token a lookahead leaves pending is consumed by a
//! literal before any variable or child grammar reads past it, child
//! grammars exist and receive one argument per parameter, and expressions
//! only name fields and parameters in scope.

use std::collections::{HashMap, HashSet};
use std::fmt;

use pacgen_core::{Expr, Grammar, GrammarSet, Production, ProductionKind, TokenId};

/// A problem found in a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Production the issue is attached to.
    pub symbol: Option<String>,
    pub message: String,
}

impl Issue {
    fn at(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.to_owned()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "`{symbol}`: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Run every check over `grammar`; child references resolve in `grammars`.
pub fn check(grammar: &Grammar, grammars: &GrammarSet) -> Vec<Issue> {
    let mut checker = Checker {
        grammar,
        grammars,
        literals: HashMap::new(),
        users: HashMap::new(),
        issues: Vec::new(),
    };
    for production in grammar.productions() {
        for child in production.children() {
            checker.users.entry(child).or_default().push(production);
        }
    }
    checker.check_params();
    checker.collect_literals();
    for production in grammar.productions() {
        checker.check_production(production);
    }
    checker.issues
}

struct Checker<'a> {
    grammar: &'a Grammar,
    grammars: &'a GrammarSet,
    /// First value bound to each literal id.
    literals: HashMap<TokenId, &'a [u8]>,
    /// Productions referring to each symbol.
    users: HashMap<&'a str, Vec<&'a Production>>,
    issues: Vec<Issue>,
}

/// What running a production does to a token a lookahead left pending.
#[derive(Clone, Copy)]
enum Claim<'a> {
    /// Every path consumes the token or fails on it.
    Handled,
    /// Some path finishes without touching it.
    Passes,
    /// Some path reaches this production, which reads past the token.
    Skipped(&'a Production),
}

impl Claim<'_> {
    fn either(self, other: Self) -> Self {
        match (self, other) {
            (Self::Skipped(p), _) | (_, Self::Skipped(p)) => Self::Skipped(p),
            (Self::Handled, Self::Handled) => Self::Handled,
            _ => Self::Passes,
        }
    }
}

/// Where a pending token that outlives its lookahead ends up.
enum Leak<'a> {
    Skipped(&'a Production),
    End,
}

impl<'a> Checker<'a> {
    fn check_params(&mut self) {
        let mut seen = HashSet::new();
        for param in self.grammar.params() {
            if !seen.insert(param.name.as_str()) {
                self.issues.push(Issue {
                    symbol: None,
                    message: format!("parameter `{}` declared twice", param.name),
                });
            }
        }
    }

    fn collect_literals(&mut self) {
        let grammar = self.grammar;
        for production in grammar.productions() {
            let ProductionKind::Literal { value, id } = &production.kind else {
                continue;
            };
            let symbol = &production.symbol;

            if value.is_empty() {
                self.issues.push(Issue::at(symbol, "literal is empty"));
            }
            if id.get() == 0 || id.is_eod() {
                self.issues.push(Issue::at(
                    symbol,
                    format!("literal id {} is reserved", id.get()),
                ));
                continue;
            }

            match self.literals.get(id) {
                Some(existing) if *existing != value.as_slice() => {
                    self.issues.push(Issue::at(
                        symbol,
                        format!(
                            "literal id {} is bound to both \"{}\" and \"{}\"",
                            id.get(),
                            existing.escape_ascii(),
                            value.escape_ascii()
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    self.literals.insert(*id, value);
                }
            }
        }
    }

    fn check_production(&mut self, production: &'a Production) {
        let symbol = production.symbol.as_str();

        match &production.kind {
            ProductionKind::LookAhead {
                alternatives,
                lookahead,
            } => {
                self.check_lookahead(symbol, lookahead);
                self.check_pending(symbol, alternatives, lookahead);
            }
            ProductionKind::ChildGrammar { grammar, args } => {
                match self.grammars.get(grammar) {
                    None => self
                        .issues
                        .push(Issue::at(symbol, format!("unknown grammar `{grammar}`"))),
                    Some(child) if child.params().len() != args.len() => {
                        self.issues.push(Issue::at(
                            symbol,
                            format!(
                                "grammar `{grammar}` takes {} arguments, {} given",
                                child.params().len(),
                                args.len()
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
            _ => {}
        }

        for expr in production.exprs() {
            self.check_expr(symbol, expr);
        }
    }

    fn check_lookahead(&mut self, symbol: &str, sets: &[Vec<TokenId>; 2]) {
        for (i, set) in sets.iter().enumerate() {
            if set.is_empty() {
                self.issues
                    .push(Issue::at(symbol, format!("lookahead set {i} is empty")));
            }
            let mut seen = HashSet::new();
            for id in set {
                if !seen.insert(id) {
                    self.issues.push(Issue::at(
                        symbol,
                        format!("token {id} listed twice in lookahead set {i}"),
                    ));
                }
                if !id.is_eod() && !self.literals.contains_key(id) {
                    self.issues.push(Issue::at(
                        symbol,
                        format!("lookahead token {id} is not a literal of this grammar"),
                    ));
                }
            }
        }

        let [first, second] = sets;
        for id in first {
            if second.contains(id) {
                self.issues.push(Issue::at(
                    symbol,
                    format!("token {id} selects both alternatives"),
                ));
            }
        }

        let union: Vec<&[u8]> = first
            .iter()
            .chain(second)
            .filter_map(|id| self.literals.get(id).copied())
            .collect();
        for (i, a) in union.iter().enumerate() {
            for b in &union[i + 1..] {
                let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
                if short != long && long.starts_with(short) {
                    self.issues.push(Issue::at(
                        symbol,
                        format!(
                            "literal \"{}\" is a prefix of \"{}\"",
                            short.escape_ascii(),
                            long.escape_ascii()
                        ),
                    ));
                }
            }
        }
    }

    /// Every non-eod token that selects an alternative must be consumed by
    /// a literal, inside the alternative or after the lookahead.
    fn check_pending(
        &mut self,
        symbol: &'a str,
        alternatives: &'a [String; 2],
        sets: &[Vec<TokenId>; 2],
    ) {
        for (alternative, set) in alternatives.iter().zip(sets) {
            for &token in set {
                if token.is_eod() || !self.literals.contains_key(&token) {
                    continue;
                }
                let leak = match self.claim(alternative, token, &mut Vec::new()) {
                    Claim::Handled => None,
                    Claim::Skipped(p) => Some(Leak::Skipped(p)),
                    Claim::Passes => self.follow(symbol, token, &mut HashSet::new()),
                };
                let message = match leak {
                    None => continue,
                    Some(Leak::Skipped(p)) => format!(
                        "token {token} is still pending when {} `{}` runs",
                        p.kind.name(),
                        p.symbol
                    ),
                    Some(Leak::End) => {
                        format!("token {token} is never consumed before the grammar ends")
                    }
                };
                self.issues.push(Issue::at(symbol, message));
            }
        }
    }

    fn claim(&self, symbol: &'a str, token: TokenId, active: &mut Vec<&'a str>) -> Claim<'a> {
        // Unknown symbols are rejected when the grammar is built; cycles
        // that consume nothing never terminate, so there is nothing to claim.
        let Some(production) = self.grammar.production(symbol) else {
            return Claim::Handled;
        };
        if active.contains(&symbol) {
            return Claim::Handled;
        }
        active.push(symbol);

        let claim = match &production.kind {
            ProductionKind::Literal { .. } => Claim::Handled,
            ProductionKind::Variable { .. } | ProductionKind::ChildGrammar { .. } => {
                Claim::Skipped(production)
            }
            ProductionKind::Epsilon => Claim::Passes,
            ProductionKind::Sequence(members) => self.claim_sequence(members, token, active),
            ProductionKind::LookAhead {
                alternatives,
                lookahead,
            } => match lookahead.iter().position(|set| set.contains(&token)) {
                Some(i) => self.claim(&alternatives[i], token, active),
                // Fails on the pending token.
                None => Claim::Handled,
            },
            ProductionKind::Boolean {
                then, otherwise, ..
            } => {
                let then = self.claim(then, token, active);
                match otherwise {
                    Some(otherwise) => then.either(self.claim(otherwise, token, active)),
                    None => then.either(Claim::Passes),
                }
            }
            ProductionKind::Switch { cases, default, .. } => cases
                .iter()
                .map(|case| case.production.as_str())
                .chain(default.as_deref())
                .map(|branch| self.claim(branch, token, active))
                .reduce(Claim::either)
                .unwrap_or(Claim::Handled),
        };

        active.pop();
        claim
    }

    fn claim_sequence(
        &self,
        members: &'a [String],
        token: TokenId,
        active: &mut Vec<&'a str>,
    ) -> Claim<'a> {
        for member in members {
            match self.claim(member, token, active) {
                Claim::Passes => {}
                claim => return claim,
            }
        }
        Claim::Passes
    }

    /// Follow a token still pending when `symbol` finishes into every
    /// production that uses `symbol`.
    fn follow(
        &self,
        symbol: &'a str,
        token: TokenId,
        seen: &mut HashSet<&'a str>,
    ) -> Option<Leak<'a>> {
        if !seen.insert(symbol) {
            return None;
        }
        if symbol == self.grammar.start_symbol() {
            return Some(Leak::End);
        }

        for user in self.users.get(symbol).into_iter().flatten().copied() {
            let ProductionKind::Sequence(members) = &user.kind else {
                // Branches and alternatives finish their user.
                if let Some(leak) = self.follow(&user.symbol, token, seen) {
                    return Some(leak);
                }
                continue;
            };
            for (i, _) in members.iter().enumerate().filter(|(_, m)| m.as_str() == symbol) {
                match self.claim_sequence(&members[i + 1..], token, &mut Vec::new()) {
                    Claim::Handled => {}
                    Claim::Skipped(p) => return Some(Leak::Skipped(p)),
                    Claim::Passes => {
                        if let Some(leak) = self.follow(&user.symbol, token, seen) {
                            return Some(leak);
                        }
                    }
                }
            }
        }
        None
    }

    fn check_expr(&mut self, symbol: &str, expr: &Expr) {
        let mut unknown = Vec::new();
        expr.walk(&mut |e| match e {
            Expr::Field(name) if !self.has_field(name) => {
                unknown.push(format!("unknown field `{name}`"));
            }
            Expr::Param(name) if !self.grammar.params().iter().any(|p| &p.name == name) => {
                unknown.push(format!("unknown parameter `{name}`"));
            }
            _ => {}
        });
        self.issues
            .extend(unknown.into_iter().map(|message| Issue::at(symbol, message)));
    }

    fn has_field(&self, name: &str) -> bool {
        self.grammar
            .productions()
            .any(|p| p.name.as_deref() == Some(name))
            || self.grammar.variables().iter().any(|v| v.name == name)
    }
}
