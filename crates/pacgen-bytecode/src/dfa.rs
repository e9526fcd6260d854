//! Loading the serialized token DFA of a set.

use regex_automata::dfa::sparse::DFA;

use crate::program::TokenSet;

impl TokenSet {
    /// The set's anchored sparse DFA, borrowed from the serialized bytes.
    ///
    /// `None` for a set without literal patterns. The bytes must come from
    /// `to_bytes_little_endian()` of the same `regex-automata` version.
    pub fn load_dfa(&self) -> Result<Option<DFA<&[u8]>>, String> {
        if self.dfa.is_empty() {
            return Ok(None);
        }
        let (dfa, _) = DFA::from_bytes(&self.dfa).map_err(|e| e.to_string())?;
        Ok(Some(dfa))
    }
}
