//! Table of known GHDL messages with explanations.
//!
//! The table is plain text in groups of four lines: a regular expression,
//! a title, a description of the cause, and how to fix it. Entries are
//! tried in order and the first match wins.

use regex::Regex;
use tracing::warn;

const BUILTIN: &str = include_str!("../../resources/error_list.txt");

/// Detail shown for a diagnostic no entry matches.
pub const NO_DETAIL: &str = "詳細説明はありません．";

/// One known message.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    /// Pattern tested against the rewritten diagnostic text.
    pub pattern: Regex,
    /// Short title.
    pub name: String,
    /// Explanation of the cause.
    pub description: String,
    /// Suggested fix.
    pub handling: String,
}

impl PatternEntry {
    /// Detail block shown next to a matching diagnostic.
    #[must_use]
    pub fn detail(&self) -> String {
        format!(
            "{}\n　説明: {}\n　対処: {}\n",
            self.name, self.description, self.handling
        )
    }
}

/// Ordered, read-only list of [`PatternEntry`] values.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    /// The table shipped with the front-end.
    #[must_use]
    pub fn builtin() -> Self {
        Self::parse(BUILTIN)
    }

    /// Parse a table. A trailing incomplete group is ignored and entries
    /// whose pattern does not compile are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let lines: Vec<&str> = text.split('\n').collect();
        let entries = lines
            .chunks_exact(4)
            .filter_map(|group| match Regex::new(group[0]) {
                Ok(pattern) => Some(PatternEntry {
                    pattern,
                    name: group[1].to_string(),
                    description: group[2].to_string(),
                    handling: group[3].to_string(),
                }),
                Err(err) => {
                    warn!("skipping message pattern {:?}: {err}", group[0]);
                    None
                }
            })
            .collect();
        Self { entries }
    }

    /// First entry whose pattern matches `text`.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(text))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_of_four_lines() {
        let table = PatternTable::parse(
            "no declaration for\n未宣言\n宣言がない\n宣言する\n\
             missing \";\"\nセミコロン\n文末がない\n付ける\n\
             dangling",
        );
        assert_eq!(table.len(), 2);
        let entry = table.lookup("[a.vhd 3行 1文字] no declaration for \"x\"").unwrap();
        assert_eq!(entry.name, "未宣言");
        assert_eq!(entry.detail(), "未宣言\n　説明: 宣言がない\n　対処: 宣言する\n");
        assert!(table.lookup("something else").is_none());
    }

    #[test]
    fn first_match_wins() {
        let table = PatternTable::parse("error\n一般\na\nb\nerror: x\n特定\nc\nd\n");
        assert_eq!(table.lookup("error: x").unwrap().name, "一般");
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let table = PatternTable::parse("(unclosed\nbad\nx\ny\nok\ngood\nx\ny\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("ok").unwrap().name, "good");
    }

    #[test]
    fn builtin_table_classifies_common_errors() {
        let table = PatternTable::builtin();
        assert!(!table.is_empty());
        for line in [
            "[adder.vhd 12行 5文字] no declaration for \"cnt\"",
            "[adder.vhd 7行 1文字] missing \";\" at end of statement",
            "[tb.vhd 30行 3文字] can't match character literal '2' with type std_logic",
            "[tb.vhd 4行 10文字] unit \"adder\" not found in library \"work\"",
            "tb.vhd:20:7:@10ns:(assertion failure): bound check failure",
        ] {
            assert!(table.lookup(line).is_some(), "{line}");
        }
    }
}
