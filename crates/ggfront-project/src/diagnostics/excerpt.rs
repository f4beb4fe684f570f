//! Association of source excerpts with diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;

static CARET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\^").expect("valid caret pattern"));

/// Lines following a diagnostic that quote the offending code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Quoted lines joined with `\n`.
    pub text: String,
    /// Number of output lines after the diagnostic that the excerpt uses.
    pub consumed: usize,
}

/// Strategy for finding the code excerpt of a diagnostic.
///
/// How a tool quotes source code differs between tools and versions, so
/// the reformatter only depends on this trait.
pub trait ExcerptHeuristic {
    /// Excerpt belonging to the diagnostic at `lines[index]`, if any.
    fn excerpt(&self, lines: &[&str], index: usize) -> Option<Excerpt>;
}

/// GHDL's convention: the source line, then a line with a caret under the
/// offending column.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaretExcerpt;

impl ExcerptHeuristic for CaretExcerpt {
    fn excerpt(&self, lines: &[&str], index: usize) -> Option<Excerpt> {
        let caret = lines.get(index + 2)?;
        if !CARET_LINE.is_match(caret) {
            return None;
        }
        Some(Excerpt {
            text: format!("{}\n{caret}", lines[index + 1]),
            consumed: 2,
        })
    }
}
