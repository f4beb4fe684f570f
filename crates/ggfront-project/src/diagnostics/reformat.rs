//! Rewriting of GHDL output in terms of the user's files.

use std::path::Path;

use ggfront_syntax::{sandboxed_source_name, LineMap, LineOrigin, SourceFile};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::excerpt::{CaretExcerpt, ExcerptHeuristic};
use super::patterns::{PatternTable, NO_DETAIL};
use super::timestamp::SimTime;

/// 1: source index, 2: line, 3: column, 4: severity marker, 5: message.
static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^src(\d+)\.vhd:(\d+):(\d+):(error:|warning:)?(.*)")
        .expect("valid location pattern")
});

static ERROR_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":error:").expect("valid marker pattern"));

/// 1: source index, 2: line, 3: optional column.
static BACKTRACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"at src(\d+)\.vhd:(\d+):?(\d*)$").expect("valid backtrace pattern")
});

const END_OF_FILE: &str = "ファイル末尾";
const SYNTHETIC_LINE: &str = "自動生成された行";
const INTERNAL_ERROR: &str = "GGFrontの内部エラー";

/// One reformatted output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticLine {
    /// Message with user file names and line numbers.
    pub text: String,
    /// Quoted source and caret lines, when the tool printed them.
    pub excerpt: Option<String>,
    /// Explanation from the pattern table.
    pub detail: String,
}

/// Reformatted output of one or more tool runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Lines in output order; empty lines are dropped.
    pub lines: Vec<DiagnosticLine>,
    /// Stop time when the output reports the end of a simulation.
    pub sim_time: Option<SimTime>,
}

impl DiagnosticReport {
    /// True when the simulation stopped on its own.
    #[must_use]
    pub fn sim_finished(&self) -> bool {
        self.sim_time.is_some()
    }

    /// True when nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Maps tool output back onto the project's sources.
///
/// Sources must be given in the order they were passed to the tool, so
/// that `src<N>.vhd` is the `N`th of them.
pub struct Reformatter<'a, H = CaretExcerpt> {
    files: Vec<(&'a Path, &'a LineMap)>,
    patterns: &'a PatternTable,
    vhdl2008: bool,
    excerpts: H,
}

impl<'a> Reformatter<'a> {
    /// Reformatter using GHDL's caret excerpt convention.
    pub fn new(
        files: impl IntoIterator<Item = &'a SourceFile>,
        patterns: &'a PatternTable,
        vhdl2008: bool,
    ) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|file| (file.original.as_path(), &file.line_map))
                .collect(),
            patterns,
            vhdl2008,
            excerpts: CaretExcerpt,
        }
    }
}

impl<'a, H: ExcerptHeuristic> Reformatter<'a, H> {
    /// Swap the excerpt heuristic.
    pub fn with_excerpts<E: ExcerptHeuristic>(self, excerpts: E) -> Reformatter<'a, E> {
        Reformatter {
            files: self.files,
            patterns: self.patterns,
            vhdl2008: self.vhdl2008,
            excerpts,
        }
    }

    /// Reformat captured output. Never fails; unrecognised lines pass
    /// through unchanged.
    #[must_use]
    pub fn reformat(&self, output: &str) -> DiagnosticReport {
        let output = output.replace("\r\n", "\n");
        let raw: Vec<&str> = output.split('\n').collect();
        let mut report = DiagnosticReport::default();

        let mut index = 0;
        while index < raw.len() {
            let (text, classifiable) = self.rewrite(raw[index]);

            let mut excerpt = None;
            if classifiable {
                if let Some(found) = self.excerpts.excerpt(&raw, index) {
                    index += found.consumed;
                    excerpt = Some(found.text);
                }
            }
            let detail = if classifiable {
                self.patterns.lookup(&text).map(|entry| entry.detail())
            } else {
                None
            };

            if let Some(time) = SimTime::from_stop_line(&text, self.vhdl2008) {
                report.sim_time = Some(time);
            }
            if !text.is_empty() {
                report.lines.push(DiagnosticLine {
                    text,
                    excerpt,
                    detail: detail.unwrap_or_else(|| NO_DETAIL.to_string()),
                });
            }
            index += 1;
        }
        report
    }

    /// Rewrite sandboxed references in one line. The flag tells whether the
    /// line is an error or warning worth classifying.
    fn rewrite(&self, line: &str) -> (String, bool) {
        let mut classifiable = false;
        let mut text = if let Some(caps) = LOCATION.captures(line) {
            classifiable = true;
            let severity = match caps.get(4).map(|m| m.as_str()) {
                Some("warning:") => " (警告)",
                _ => "",
            };
            format!(
                "[{}{severity}] {}",
                self.location(&caps),
                caps[5].trim_start()
            )
        } else if let Some(marker) = ERROR_MARKER.find(line) {
            classifiable = true;
            line[marker.end()..].trim().to_string()
        } else {
            line.to_string()
        };

        if let Some(caps) = BACKTRACE.captures(&text) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let location = self.location(&caps);
            text = format!("{}[{location}]", &text[..start + "at ".len()]);
        }
        (text, classifiable)
    }

    /// `<file> <line>行 <column>文字` for captures with groups 1 to 3.
    fn location(&self, caps: &Captures<'_>) -> String {
        let file = caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.files.get(i));
        let Some((path, line_map)) = file else {
            return format!("{} {INTERNAL_ERROR}", sandboxed_source_name_of(&caps[1]));
        };
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let origin = caps[2]
            .parse::<usize>()
            .ok()
            .and_then(|line| line_map.resolve(line));
        match origin {
            Some(LineOrigin::Source(line)) => {
                let column = caps.get(3).map_or("", |m| m.as_str());
                if column.is_empty() {
                    format!("{name} {line}行")
                } else {
                    format!("{name} {line}行 {column}文字")
                }
            }
            Some(LineOrigin::EndOfFile) => format!("{name} {END_OF_FILE}"),
            Some(LineOrigin::Synthetic) => format!("{name} {SYNTHETIC_LINE}"),
            None => format!("{name} {INTERNAL_ERROR}"),
        }
    }
}

fn sandboxed_source_name_of(index: &str) -> String {
    index
        .parse::<usize>()
        .map_or_else(|_| format!("src{index}.vhd"), |n| sandboxed_source_name(n).to_string())
}
