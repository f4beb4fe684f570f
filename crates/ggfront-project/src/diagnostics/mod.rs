//! GHDL output reformatting.
//!
//! GHDL only ever sees the sandboxed sources, so its messages refer to
//! `src<N>.vhd` and to rewritten line numbers. The [`Reformatter`] maps
//! them back through each file's line map, attaches quoted code and an
//! explanation from the [`PatternTable`], and picks up the time at which a
//! simulation stopped.

mod excerpt;
mod patterns;
mod reformat;
mod timestamp;

pub use excerpt::{CaretExcerpt, Excerpt, ExcerptHeuristic};
pub use patterns::{PatternEntry, PatternTable, NO_DETAIL};
pub use reformat::{DiagnosticLine, DiagnosticReport, Reformatter};
pub use timestamp::SimTime;
