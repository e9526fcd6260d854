//! Token resolution against combined literal patterns.
//!
//! Every token set of a program is deserialized once into an anchored
//! sparse DFA whose pattern index names the matched literal. Resolving a
//! set at a position walks the DFA byte by byte and stops at the first
//! complete literal, since the literals of a set are prefix-free.

use std::fmt;

use regex_automata::dfa::Automaton;
use regex_automata::dfa::sparse::DFA;
use regex_automata::{Anchored, Input};

use pacgen_bytecode::{LookaheadState, Program, TokenSet, TokenSetId};
use pacgen_core::TokenId;

use super::error::RuntimeError;
use super::stream::Stream;

/// Outcome of resolving a token set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchResult {
    /// Token `id` spans up to stream offset `end`.
    Found { id: TokenId, end: usize },
    NotFound,
    /// No decision is possible before more bytes arrive.
    InsufficientInput,
    /// A token is already pending and it is not in the set.
    UnexpectedId(TokenId),
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { id, end } => write!(f, "found {id} ending at {end}"),
            Self::NotFound => f.write_str("not found"),
            Self::InsufficientInput => f.write_str("insufficient input"),
            Self::UnexpectedId(id) => write!(f, "unexpected pending {id}"),
        }
    }
}

struct CompiledSet<'p> {
    set: &'p TokenSet,
    /// `None` when the set holds no literal, only end of data.
    dfa: Option<DFA<&'p [u8]>>,
}

/// Token sets of one program, ready to match.
pub struct TokenMatcher<'p> {
    sets: Vec<CompiledSet<'p>>,
}

impl<'p> TokenMatcher<'p> {
    pub fn new(program: &'p Program) -> Result<Self, RuntimeError> {
        let sets = program
            .token_sets
            .iter()
            .map(|set| {
                let dfa = set.load_dfa().map_err(|message| RuntimeError::TokenTable {
                    name: set.name.clone(),
                    message,
                })?;
                Ok(CompiledSet { set, dfa })
            })
            .collect::<Result<_, RuntimeError>>()?;
        Ok(Self { sets })
    }

    pub fn set(&self, id: TokenSetId) -> &'p TokenSet {
        self.sets[id.index()].set
    }

    /// Resolve the next token against set `id`.
    ///
    /// A pending lookahead token is checked for membership without reading
    /// the stream. Otherwise the token starts at `state.position`; end of
    /// data is a token only once the stream is frozen.
    pub fn resolve(&self, id: TokenSetId, stream: &Stream, state: &LookaheadState) -> MatchResult {
        let compiled = &self.sets[id.index()];
        if let Some(pending) = state.lookahead {
            return if compiled.set.contains(pending) {
                MatchResult::Found {
                    id: pending,
                    end: state.position,
                }
            } else {
                MatchResult::UnexpectedId(pending)
            };
        }

        let hay = stream.remaining(state.position);
        if hay.is_empty() {
            return match (stream.is_frozen(), compiled.set.accepts_eod) {
                (false, _) => MatchResult::InsufficientInput,
                (true, true) => MatchResult::Found {
                    id: TokenId::EOD,
                    end: state.position,
                },
                (true, false) => MatchResult::NotFound,
            };
        }

        let Some(dfa) = &compiled.dfa else {
            return MatchResult::NotFound;
        };
        match scan(dfa, hay) {
            Scan::Matched { pattern, len } => MatchResult::Found {
                id: compiled.set.patterns[pattern].id,
                end: state.position + len,
            },
            Scan::Dead => MatchResult::NotFound,
            Scan::Exhausted if stream.is_frozen() => MatchResult::NotFound,
            Scan::Exhausted => MatchResult::InsufficientInput,
        }
    }
}

enum Scan {
    Matched { pattern: usize, len: usize },
    /// No literal of the set starts with the bytes seen.
    Dead,
    /// Every byte is a proper prefix of some literal.
    Exhausted,
}

fn scan(dfa: &DFA<&[u8]>, hay: &[u8]) -> Scan {
    let input = Input::new(hay).anchored(Anchored::Yes);
    let mut state = match dfa.start_state_forward(&input) {
        Ok(state) => state,
        Err(err) => panic!("token DFA has no anchored start state: {err}"),
    };
    for (i, &byte) in hay.iter().enumerate() {
        state = dfa.next_state(state, byte);
        if dfa.is_dead_state(state) {
            return Scan::Dead;
        }
        let eoi = dfa.next_eoi_state(state);
        if dfa.is_match_state(eoi) {
            return Scan::Matched {
                pattern: dfa.match_pattern(eoi, 0).as_usize(),
                len: i + 1,
            };
        }
    }
    Scan::Exhausted
}
