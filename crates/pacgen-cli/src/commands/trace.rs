//! Parse input and print the execution trace.

use pacgen_core::Colors;
use pacgen_vm::{PrintTracer, Registry, Verbosity};

use super::run_common::{self, RunArgs, fail};

pub struct TraceArgs {
    pub run: RunArgs,
    pub verbosity: Verbosity,
    pub no_result: bool,
    pub color: bool,
}

pub fn run(args: TraceArgs) {
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
    let colors = Colors::new(args.color);
    let mut tracer = PrintTracer::new(&program, args.verbosity, colors);
    let result = run_common::feed(vm, &input, args.run.chunk_size, &mut tracer);
    tracer.print();

    match result {
        Ok(object) => {
            if args.no_result {
                return;
            }
            println!("{}---{}", colors.dim, colors.reset);
            println!("{}", object.format(&program, true, colors));
        }
        Err(e) => fail(&e),
    }
}
