//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! - `*Params` structs are populated from clap, ignoring hidden flags
//! - `Into<*Args>` impls bridge dispatch to the command handlers

use std::path::PathBuf;

use clap::ArgMatches;
use pacgen_vm::Verbosity;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::compile::CompileArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::exec::ExecArgs;
use crate::commands::run_common::RunArgs;
use crate::commands::trace::TraceArgs;

pub struct CheckParams {
    pub grammar_path: PathBuf,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: grammar_path(m),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub grammar_path: PathBuf,
    pub color: ColorChoice,
    // Input, runtime and trace flags are parsed but not extracted.
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: grammar_path(m),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CompileParams {
    pub grammar_path: PathBuf,
    pub output: PathBuf,
    pub color: ColorChoice,
}

impl CompileParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: grammar_path(m),
            output: m
                .get_one::<PathBuf>("output")
                .cloned()
                .expect("clap requires --output"),
            color: parse_color(m),
        }
    }
}

impl From<CompileParams> for CompileArgs {
    fn from(p: CompileParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            output: p.output,
            color: p.color.should_colorize(),
        }
    }
}

/// Input and runtime flags shared by exec and trace.
pub struct RunParams {
    pub grammar_path: PathBuf,
    pub input_path: Option<PathBuf>,
    pub input_text: Option<String>,
    pub parser: Option<String>,
    pub args: Vec<String>,
    pub chunk_size: Option<usize>,
    pub fuel: u32,
    pub recursion_limit: u32,
}

impl RunParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: grammar_path(m),
            input_path: m.get_one::<PathBuf>("input_path").cloned(),
            input_text: m.get_one::<String>("input_text").cloned(),
            parser: m.get_one::<String>("parser").cloned(),
            args: m
                .get_many::<String>("args")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            chunk_size: m.get_one::<u32>("chunk_size").map(|&n| n as usize),
            fuel: m.get_one::<u32>("fuel").copied().unwrap_or(1_000_000),
            recursion_limit: m
                .get_one::<u32>("recursion_limit")
                .copied()
                .unwrap_or(1024),
        }
    }
}

impl From<RunParams> for RunArgs {
    fn from(p: RunParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            input_path: p.input_path,
            input_text: p.input_text,
            parser: p.parser,
            args: p.args,
            chunk_size: p.chunk_size,
            fuel: p.fuel,
            recursion_limit: p.recursion_limit,
        }
    }
}

pub struct ExecParams {
    pub run: RunParams,
    pub compact: bool,
    pub color: ColorChoice,
    // Trace flags are parsed but not extracted.
}

impl ExecParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            run: RunParams::from_matches(m),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<ExecParams> for ExecArgs {
    fn from(p: ExecParams) -> Self {
        // Pretty by default when stdout is a TTY, unless --compact is passed
        let pretty = !p.compact && std::io::IsTerminal::is_terminal(&std::io::stdout());

        Self {
            run: p.run.into(),
            pretty,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TraceParams {
    pub run: RunParams,
    pub verbose: u8,
    pub no_result: bool,
    pub color: ColorChoice,
}

impl TraceParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            run: RunParams::from_matches(m),
            verbose: m.get_count("verbose"),
            no_result: m.get_flag("no_result"),
            color: parse_color(m),
        }
    }
}

impl From<TraceParams> for TraceArgs {
    fn from(p: TraceParams) -> Self {
        let verbosity = match p.verbose {
            0 => Verbosity::Default,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        };

        Self {
            run: p.run.into(),
            verbosity,
            no_result: p.no_result,
            color: p.color.should_colorize(),
        }
    }
}

fn grammar_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("grammar_path")
        .cloned()
        .expect("clap requires the grammar path")
}

/// Parse --color flag into ColorChoice.
fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
