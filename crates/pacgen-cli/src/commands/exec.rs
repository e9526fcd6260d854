//! Parse input and print the resulting object.

use pacgen_core::Colors;
use pacgen_vm::{NoopTracer, Registry};

use super::run_common::{self, RunArgs, fail};

pub struct ExecArgs {
    pub run: RunArgs,
    pub pretty: bool,
    pub color: bool,
}

pub fn run(args: ExecArgs) {
    let (program, input) = run_common::prepare(&args.run);
    let runtime = run_common::build_runtime(&program, &args.run);

    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let parser = run_common::resolve_parser(&registry, args.run.parser.as_deref());
    let parse_args = args
        .run
        .args
        .iter()
        .map(String::as_str)
        .map(run_common::parse_arg)
        .collect();

    let vm = runtime.parse(parser, parse_args).unwrap_or_else(|e| fail(&e));
    let object = run_common::feed(vm, &input, args.run.chunk_size, &mut NoopTracer)
        .unwrap_or_else(|e| fail(&e));

    let output = if args.color {
        object.format(&program, args.pretty, Colors::ON)
    } else {
        let view = object.view(&program);
        let json = if args.pretty {
            serde_json::to_string_pretty(&view)
        } else {
            serde_json::to_string(&view)
        };
        json.unwrap_or_else(|e| fail(&e))
    };
    println!("{output}");
}
