pub mod check;
pub mod compile;
pub mod dump;
pub mod exec;
pub mod loader;
pub mod run_common;
pub mod trace;
