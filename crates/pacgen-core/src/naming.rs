//! Generated symbol names.
//!
//! Every routine, token table and registration record produced for a grammar
//! is named `{grammar}_{tag}[_{tag2}]`, lower-cased, with each character
//! outside `[A-Za-z0-9_]` replaced by `_0xHH_`. Hand-written host code calls
//! generated routines by these names, so the scheme is stable.

use std::fmt::Write as _;

/// Prefix of the hidden parse-object slots that carry grammar parameters.
pub const PARAM_SLOT_PREFIX: &str = "__param_";

/// Build a generated symbol name.
///
/// # Examples
///
/// ```
/// use pacgen_core::naming::mangle;
///
/// assert_eq!(mangle("Http", "parse", None), "http_parse");
/// assert_eq!(mangle("Http", "parse", Some("req-line")), "http_parse_req_0x2d_line");
/// ```
pub fn mangle(grammar: &str, tag: &str, tag2: Option<&str>) -> String {
    let mut raw = format!("{grammar}_{tag}");
    if let Some(tag2) = tag2 {
        raw.push('_');
        raw.push_str(tag2);
    }
    sanitize(&raw)
}

/// Lower-case `ident` and escape characters outside `[a-z0-9_]`.
pub fn sanitize(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for c in ident.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "_0x{:02x}_", c as u32);
        }
    }
    out
}

/// Name of the hidden slot holding parameter `name`.
pub fn param_slot(name: &str) -> String {
    format!("{PARAM_SLOT_PREFIX}{name}")
}

/// Whether a slot name denotes a hidden parameter slot.
pub fn is_param_slot(name: &str) -> bool {
    name.starts_with(PARAM_SLOT_PREFIX)
}
