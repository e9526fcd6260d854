//! Binary serialization for grammars using postcard.

use super::GrammarError;
use super::set::GrammarSet;
use super::types::Grammar;

impl Grammar {
    /// Deserialize and validate a grammar from binary format.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, GrammarError> {
        let grammar: Self = postcard::from_bytes(bytes).map_err(GrammarError::Binary)?;
        grammar.validate()?;
        Ok(grammar)
    }

    /// Serialize grammar to binary format.
    pub fn to_binary(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("serialization should not fail")
    }
}

impl GrammarSet {
    pub fn from_binary(bytes: &[u8]) -> Result<Self, GrammarError> {
        let grammars: Vec<Grammar> = postcard::from_bytes(bytes).map_err(GrammarError::Binary)?;
        for grammar in &grammars {
            grammar.validate()?;
        }
        Self::from_grammars(grammars)
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let grammars: Vec<&Grammar> = self.iter().collect();
        postcard::to_allocvec(&grammars).expect("serialization should not fail")
    }
}
