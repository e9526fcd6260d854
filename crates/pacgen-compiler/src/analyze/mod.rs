//! Passes over grammars that run before code generation.
//!
//! - `check` - the grammar-check pass; generation assumes its guarantees
//! - `scope` - parse-object record derivation

mod check;
mod scope;


pub use check::{Issue, check};
pub use scope::object_type;
