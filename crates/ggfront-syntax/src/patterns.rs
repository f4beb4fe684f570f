//! Line patterns recognised by the source analyzer.
//!
//! All patterns are case-insensitive and match against a comment-stripped
//! logical line. Capture groups are documented next to each pattern.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("source pattern must compile")
}

/// A `type` or `signal` statement that does not end on this line.
pub(crate) static CONTINUED_DECL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)(?:type|signal)\s[^;]+$"));

/// 1: entity name.
pub(crate) static ENTITY_DECL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\bentity\s+([a-z0-9_]+)\s+is\b"));

/// 1: architecture name, 2: entity name.
pub(crate) static ARCHITECTURE_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\barchitecture\s+([a-z0-9_]+)\s+of\s+([a-z0-9_]+)\s+is\b")
});

/// 1: component name. The trailing `is` is optional in VHDL-93.
pub(crate) static COMPONENT_DECL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\bcomponent\s+([a-z0-9_]+)(?:\s+is\b|\s*$)"));

/// 1: instantiated entity name (`label : entity work.name`).
///
/// Anchored on the instance label so that attribute specifications
/// (`attribute a of e : entity is ...`) are not taken for instances.
pub(crate) static ENTITY_INSTANCE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)^\s*[a-z0-9_]+\s*:\s*entity\s+(?:[a-z0-9_]+\.)?([a-z0-9_]+)")
});

/// `file f : text [open read_mode] is [in|out] "path";`
///
/// 1: text up to and including the opening quote, 2: declaration part,
/// 3: optional `in`/`out` keyword, 4: path, 5: closing quote and `;`.
pub(crate) static FILE_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r#"(?i)^((\s*file\s[a-z0-9_:\s]+)\s+is\s+(in|out)?\s*")(.+)("\s*;)"#)
});

/// `file_open(f, "path", read_mode);`
///
/// 1: text up to and including the opening quote, 2: path,
/// 3: closing quote through `;`, 4: open mode.
pub(crate) static FILE_OPEN: Lazy<Regex> = Lazy::new(|| {
    compile(
        r#"(?i)^(\s*file_open\s*\((?:\s*[a-z0-9_]+\s*,\s*)+")(.+)("\s*,\s*(read_mode|write_mode|append_mode)\s*\)\s*;)"#,
    )
});

/// 1: type name, 2: comma separated value list.
pub(crate) static ENUM_TYPE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\btype\s+([a-z0-9_]+)\s+is\s+\(((?:\s*[a-z0-9_]+\s*,)*\s*[a-z0-9_]+\s*)\)")
});

/// 1: comma separated signal names, 2: type mark.
pub(crate) static SIGNAL_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\bsignal\s((?:\s*[a-z0-9_]+\s*,)*\s*[a-z0-9_]+\s*):\s*([a-z0-9_]+)")
});

/// `end [architecture] [name];`
///
/// 1: the `architecture` keyword when present, 2: the closing name.
pub(crate) static END_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\bend(\s+architecture)?(?:\s+([a-z0-9_]+))?\s*;")
});

/// Constructs that only exist in VHDL-2008.
pub(crate) static VHDL2008_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)ieee\.numeric_std_unsigned\.|std\.env\.|case\?|select\?|\?[=><?]|\?/=")
});

/// Splits a captured identifier list (`a, b ,c`) into trimmed names.
pub(crate) fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|name| name.trim_matches(|ch: char| ch == ' ' || ch == '\t'))
        .filter(|name| !name.is_empty())
}
