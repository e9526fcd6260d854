//! Human-readable program dump for debugging and documentation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use pacgen_core::Colors;

use crate::format::{escape_bytes, format_instruction, width_for_count};
use crate::ids::{Addr, TypeId};
use crate::instructions::Instruction;
use crate::program::Program;

/// Render every section of `program`.
pub fn dump(program: &Program, colors: Colors) -> String {
    let mut out = String::new();

    dump_types(&mut out, program, colors);
    dump_tokens(&mut out, program, colors);
    dump_parsers(&mut out, program, colors);
    dump_code(&mut out, program, colors);

    out
}

fn dump_types(out: &mut String, program: &Program, c: Colors) {
    writeln!(out, "{}[types]{}", c.symbol, c.reset).unwrap();
    for (i, ty) in program.types.iter().enumerate() {
        let slots: Vec<_> = ty
            .slots
            .iter()
            .map(|s| format!("{}: {}", s.name, s.ty))
            .collect();
        let id = TypeId(i as u16);
        if slots.is_empty() {
            writeln!(out, "{id} {} {{}}", ty.name).unwrap();
        } else {
            writeln!(out, "{id} {} {{ {} }}", ty.name, slots.join(", ")).unwrap();
        }
    }
    out.push('\n');
}

fn dump_tokens(out: &mut String, program: &Program, c: Colors) {
    writeln!(out, "{}[tokens]{}", c.symbol, c.reset).unwrap();
    let w = width_for_count(program.token_sets.len());
    for (i, set) in program.token_sets.iter().enumerate() {
        let mut parts: Vec<_> = set
            .patterns
            .iter()
            .map(|p| {
                format!(
                    "{} {}\"{}\"{}",
                    p.id,
                    c.literal,
                    escape_bytes(&p.literal),
                    c.reset
                )
            })
            .collect();
        if set.accepts_eod {
            parts.push("eod".to_owned());
        }
        writeln!(out, "K{i:0w$} {}  {}", set.name, parts.join(" | ")).unwrap();
    }
    out.push('\n');
}

fn dump_parsers(out: &mut String, program: &Program, c: Colors) {
    writeln!(out, "{}[parsers]{}", c.symbol, c.reset).unwrap();
    for parser in &program.parsers {
        let params: Vec<_> = parser
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        writeln!(
            out,
            "{}({})  parse={}  init={}  {}",
            parser.name,
            params.join(", "),
            program.routine(parser.parse).name,
            parser.init,
            parser.ty
        )
        .unwrap();
    }
    out.push('\n');
}

fn dump_code(out: &mut String, program: &Program, c: Colors) {
    writeln!(out, "{}[code]{}", c.symbol, c.reset).unwrap();
    let w = width_for_count(program.code.len());
    let starts: BTreeMap<Addr, usize> = program
        .routines
        .iter()
        .enumerate()
        .map(|(i, r)| (r.entry, i))
        .collect();

    // Parse objects in scope: the routine's own, then nested children.
    let mut scopes = Vec::new();
    for (i, instr) in program.code.iter().enumerate() {
        let addr = Addr(i as u32);
        if let Some(&r) = starts.get(&addr) {
            let routine = &program.routines[r];
            writeln!(out, "{}{}{}:", c.symbol, routine.name, c.reset).unwrap();
            scopes.clear();
            scopes.push(routine.ty);
        }
        let Some(&ty) = scopes.last() else {
            continue;
        };
        writeln!(
            out,
            "  {}{:0w$}{}  {}",
            c.dim,
            addr.0,
            c.reset,
            format_instruction(program, program.ty(ty), instr, w)
        )
        .unwrap();
        match instr {
            Instruction::BeginChild { ty, .. } => scopes.push(*ty),
            Instruction::EndChild if scopes.len() > 1 => {
                scopes.pop();
            }
            _ => {}
        }
    }
}
