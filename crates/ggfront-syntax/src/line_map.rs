//! Mapping from rewritten line numbers back to original line numbers.

use serde::Serialize;

/// Where a line of the rewritten source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum LineOrigin {
    /// A line of the user's file (1-based).
    Source(u32),
    /// A line injected by the rewriter.
    Synthetic,
    /// One past the last line; GHDL reports unexpected end of file here.
    EndOfFile,
}

/// Ordered line map for one rewritten file.
///
/// Entry `n - 1` describes rewritten line `n`. The last entry is always
/// [`LineOrigin::EndOfFile`] once the map is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineMap {
    entries: Vec<LineOrigin>,
}

impl LineMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the origin of the next rewritten line.
    pub fn push(&mut self, origin: LineOrigin) {
        self.entries.push(origin);
    }

    /// Resolve a 1-based rewritten line number. `None` when out of range.
    #[must_use]
    pub fn resolve(&self, line: usize) -> Option<LineOrigin> {
        line.checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .copied()
    }

    /// Number of entries, the end-of-file sentinel included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in rewritten-line order.
    pub fn iter(&self) -> impl Iterator<Item = LineOrigin> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<LineOrigin> for LineMap {
    fn from_iter<T: IntoIterator<Item = LineOrigin>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
