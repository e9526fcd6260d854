use indoc::indoc;
use pacgen_bytecode::Program;
use pacgen_core::Colors;

use super::test_utils::program;
use super::{Outcome, PrintTracer, Registry, Runtime, RuntimeError, Stream, Verbosity};

const CHOICE: &str = indoc! {r#"
    {
        "name": "S",
        "productions": {
            "s": { "kind": "sequence", "members": ["choice", "z"] },
            "choice": { "kind": "lookahead", "alternatives": ["x", "y"], "lookahead": [[1], [2]] },
            "x": { "kind": "literal", "value": "x", "id": 1, "name": "x" },
            "y": { "kind": "literal", "value": "y", "id": 2, "name": "y" },
            "z": { "kind": "literal", "value": "z", "id": 3 }
        }
    }
"#};

/// Trace a parse fed `chunks` one resume at a time, the last one frozen.
fn trace(program: &Program, verbosity: Verbosity, chunks: &[&[u8]]) -> String {
    let runtime = Runtime::builder(program).build().unwrap();
    let mut registry = Registry::new();
    runtime.init(&mut registry);
    let parser = registry.iter().next().unwrap();
    let mut tracer = PrintTracer::new(program, verbosity, Colors::OFF);

    let mut vm = runtime.parse(parser, vec![]).unwrap();
    let mut stream = Stream::new();
    for (i, chunk) in chunks.iter().enumerate() {
        stream.append(chunk);
        if i + 1 == chunks.len() {
            stream.freeze();
        }
        match vm.resume_with(&stream, &mut tracer) {
            Ok(Outcome::Suspended(next)) => vm = next,
            Ok(Outcome::Done(_)) | Err(RuntimeError::Parse(_)) => break,
            Err(err) => panic!("unexpected runtime error: {err}"),
        }
    }
    tracer.lines().join("\n")
}

#[test]
fn suspend_and_resume() {
    let program = program(CHOICE);

    insta::assert_snapshot!(trace(&program, Verbosity::Default, &[b"y", b"z"]), @r#"
    s_parse:
      00  enter T0 S
      01  tail_call s_parse_s
    s_parse_s:
      03  call s_parse_choice
    s_parse_choice:
      06  lookahead K0 [#1 → 07, #2 → 10]
      10  literal K2 #2 "y"
      11  finished self.y
      12  return
    s_parse_s:
      04  literal K3 #3 "z"
      ‖ suspended at 04 pos=1 la=-
      ▶ resumed at 04 pos=1 la=-
      04  literal K3 #3 "z"
      05  return
    "#);
}

#[test]
fn verbose_rejection() {
    let program = program(CHOICE);

    insta::assert_snapshot!(trace(&program, Verbosity::Verbose, &[b"q"]), @r#"
    s_parse:
      00  enter T0 S
      01  tail_call s_parse_s
    s_parse_s:
      03  call s_parse_choice
    s_parse_choice:
      06  lookahead K0 [#1 → 07, #2 → 10]
        ○ not found
      ✗ at offset 0: expected "x" | "y", found byte 0x71
    "#);
}

#[test]
fn verbose_matches_and_values() {
    let program = program(CHOICE);

    insta::assert_snapshot!(trace(&program, Verbosity::Verbose, &[b"xz"]), @r#"
    s_parse:
      00  enter T0 S
      01  tail_call s_parse_s
    s_parse_s:
      03  call s_parse_choice
    s_parse_choice:
      06  lookahead K0 [#1 → 07, #2 → 10]
        ● found #1 ending at 1
      07  literal K1 #1 "x"
        ● found #1 ending at 1
        = "x"
      08  finished self.x
      09  jump 12
      12  return
    s_parse_s:
      04  literal K3 #3 "z"
        ● found #3 ending at 2
        = "z"
      05  return
    "#);
}

#[test]
fn very_verbose_shows_state() {
    let program = program(CHOICE);

    let output = trace(&program, Verbosity::VeryVerbose, &[b"yz"]);

    let lines: Vec<&str> = output.lines().filter(|l| l.contains("literal")).collect();
    assert_eq!(
        lines,
        [
            r#"  10  literal K2 #2 "y"  [pos=1 la=#2@0]"#,
            r#"  04  literal K3 #3 "z"  [pos=1 la=-]"#,
        ]
    );
}
