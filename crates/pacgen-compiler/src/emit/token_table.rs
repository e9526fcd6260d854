//! Token table builder.
//!
//! Every literal match and lookahead dispatch resolves tokens against a
//! combined pattern over a set of literals. Each set is compiled once into an
//! anchored sparse DFA with one pattern per literal, so the matched pattern
//! index names the token. Sets are cached per grammar by their id set.

use std::collections::HashMap;
use std::fmt::Write as _;

use regex_automata::dfa::{StartKind, dense};
use regex_automata::nfa::thompson;
use regex_automata::util::syntax;

use pacgen_bytecode::{TokenPattern, TokenSet, TokenSetId};
use pacgen_core::TokenId;
use pacgen_core::naming::mangle;

use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct TokenTableBuilder {
    /// `(grammar, tag)` to set.
    lookup: HashMap<(String, String), TokenSetId>,
    sets: Vec<TokenSet>,
}

impl TokenTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern the set of `literals` (plus end of data when `accepts_eod`).
    pub fn intern(
        &mut self,
        grammar: &str,
        literals: &[(TokenId, &[u8])],
        accepts_eod: bool,
    ) -> Result<TokenSetId> {
        let mut patterns: Vec<TokenPattern> = literals
            .iter()
            .map(|(id, literal)| TokenPattern {
                id: *id,
                literal: literal.to_vec(),
            })
            .collect();
        patterns.sort_by_key(|p| p.id);
        patterns.dedup_by_key(|p| p.id);

        let tag = set_tag(&patterns, accepts_eod);
        let key = (grammar.to_owned(), tag);
        if let Some(&id) = self.lookup.get(&key) {
            return Ok(id);
        }

        let name = mangle(grammar, "tokens", Some(&key.1));
        let dfa = build_dfa(&name, &patterns)?;

        let id = u16::try_from(self.sets.len()).map_err(|_| Error::Overflow("token sets"))?;
        let id = TokenSetId(id);
        self.sets.push(TokenSet {
            name,
            patterns,
            accepts_eod,
            dfa,
        });
        self.lookup.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, id: TokenSetId) -> &TokenSet {
        &self.sets[id.index()]
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn finish(self) -> Vec<TokenSet> {
        self.sets
    }
}

/// `1_2_eod`: sorted ids, then `eod` when end of data is accepted.
fn set_tag(patterns: &[TokenPattern], accepts_eod: bool) -> String {
    let mut parts: Vec<String> = patterns.iter().map(|p| p.id.get().to_string()).collect();
    if accepts_eod {
        parts.push("eod".to_owned());
    }
    parts.join("_")
}

/// Serialized anchored sparse DFA; pattern `i` matches `patterns[i]` exactly.
fn build_dfa(name: &str, patterns: &[TokenPattern]) -> Result<Vec<u8>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let regexes: Vec<String> = patterns.iter().map(|p| byte_pattern(&p.literal)).collect();
    let build_error = |e: &dyn std::fmt::Display| Error::TokenBuild {
        name: name.to_owned(),
        message: e.to_string(),
    };

    let dense = dense::Builder::new()
        .configure(
            dense::Config::new()
                .start_kind(StartKind::Anchored)
                .minimize(true),
        )
        .syntax(syntax::Config::new().unicode(false).utf8(false))
        .thompson(thompson::Config::new().utf8(false))
        .build_many(&regexes)
        .map_err(|e| build_error(&e))?;

    let sparse = dense.to_sparse().map_err(|e| build_error(&e))?;
    Ok(sparse.to_bytes_little_endian())
}

/// Regex matching exactly `literal`, one `\xHH` escape per byte.
fn byte_pattern(literal: &[u8]) -> String {
    let mut out = String::with_capacity(literal.len() * 4);
    for b in literal {
        write!(out, "\\x{b:02x}").unwrap();
    }
    out
}
