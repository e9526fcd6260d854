//! Named collection of grammars.

use indexmap::IndexMap;

use super::GrammarError;
use super::types::Grammar;

/// Grammars visible to one compilation, so `ChildGrammar` references resolve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrammarSet {
    grammars: IndexMap<String, Grammar>,
}

impl GrammarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grammars(
        grammars: impl IntoIterator<Item = Grammar>,
    ) -> Result<Self, GrammarError> {
        let mut set = Self::new();
        for grammar in grammars {
            set.insert(grammar)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, grammar: Grammar) -> Result<(), GrammarError> {
        if self.grammars.contains_key(grammar.name()) {
            return Err(GrammarError::DuplicateGrammar(grammar.name().to_owned()));
        }
        self.grammars.insert(grammar.name().to_owned(), grammar);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Grammar> {
        self.grammars.get(name)
    }

    /// Grammars in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Grammar> {
        self.grammars.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grammars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}
