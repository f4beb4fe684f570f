//! Per-file analysis and rewriting of VHDL sources.
//!
//! Each project file is scanned once per compile or hierarchy refresh. The
//! analysis extracts what the hierarchy resolver needs (entities and the
//! components each architecture references) and produces the sandboxed text
//! GHDL is run on:
//!
//! - paths opened with `file ... is "..."` or `file_open(...)` are replaced by
//!   `src<N>_in<K>` / `src<N>_out<K>` so the simulation reads and writes
//!   inside the working directory
//! - every signal of a locally declared enumeration type gets an integer
//!   shadow `gf_src<N>_enum<K>` assigned from `'pos`, which the trace
//!   postprocessor later turns back into symbolic values
//!
//! Every emitted line is recorded in a [`LineMap`] so GHDL locations can be
//! mapped back to the user's file.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::SourceError;
use crate::line_map::{LineMap, LineOrigin};
use crate::patterns::{
    split_names, ARCHITECTURE_DECL, COMPONENT_DECL, CONTINUED_DECL, END_DECL, ENTITY_DECL,
    ENTITY_INSTANCE, ENUM_TYPE, FILE_DECL, FILE_OPEN, SIGNAL_DECL, VHDL2008_SYNTAX,
};
use crate::scanner::LineScanner;
use crate::text;

/// Extension of sandboxed source files.
pub const SANDBOX_EXTENSION: &str = "vhd";

/// Prefix of synthesized enumeration tracking signals.
///
/// Tracking signals are named `gf_src<N>_enum<K>`: `K` counts per source
/// file and `N` is the file's project index, so names are unique across
/// the project.
pub const TRACKING_PREFIX: &str = "gf";

/// Sandboxed name of the source at the given 1-based project index.
#[must_use]
pub fn sandboxed_source_name(index: usize) -> SmolStr {
    SmolStr::new(format!("src{index}.{SANDBOX_EXTENSION}"))
}

/// A component referenced from the architecture of `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubmoduleRef {
    /// Referenced entity (lower case).
    pub name: SmolStr,
    /// Entity whose architecture contains the reference (lower case, empty
    /// outside any architecture).
    pub parent: SmolStr,
}

/// Whether a redirected data file is read or written by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Read by the testbench; copied into the working directory.
    Input,
    /// Written by the testbench; copied back after simulation.
    Output,
}

impl Direction {
    /// Tag used in sandboxed names (`in` / `out`).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }
}

/// A data file opened by a source, redirected to a sandboxed name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFile {
    /// User path, resolved against the directory of the opening source.
    pub original: PathBuf,
    /// Sandboxed name inside the working directory.
    pub internal: SmolStr,
    /// Entity whose architecture opens the file.
    pub module: SmolStr,
    /// Read or write.
    pub direction: Direction,
    /// Whether the opening entity is reachable from the top module. Only
    /// meaningful after [`SourceAnalysis::resolve_references`].
    pub referenced: bool,
}

/// Binding between a user signal of enumeration type and its integer shadow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSignal {
    /// Entity whose architecture declares the signal.
    pub module: SmolStr,
    /// Enumeration type name (lower case).
    pub type_name: SmolStr,
    /// Signal name as written by the user.
    pub signal: SmolStr,
    /// Enumeration literals; the position is the encoded value.
    pub values: Vec<SmolStr>,
}

/// Rewritten form of one user source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Path as given in the project.
    pub original: PathBuf,
    /// Sandboxed name (`src<N>.vhd`).
    pub internal: SmolStr,
    /// Rewritten text, one `\n` terminated line per map entry.
    pub content: String,
    /// Original line of each rewritten line.
    pub line_map: LineMap,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAnalysis {
    /// The rewritten file.
    pub file: SourceFile,
    /// Declared entities, lower case, in declaration order.
    pub modules: Vec<SmolStr>,
    /// Component references, without repeated pairs.
    pub submodules: IndexSet<SubmoduleRef>,
    /// Enumeration signal bindings keyed by tracking signal name.
    pub enum_signals: IndexMap<SmolStr, EnumSignal>,
    /// Files read by the simulation.
    pub in_files: Vec<DataFile>,
    /// Files written by the simulation.
    pub out_files: Vec<DataFile>,
    /// True when a VHDL-2008 only construct was seen.
    pub uses_vhdl2008: bool,
}

impl SourceAnalysis {
    /// Read and analyze the source at `path` with the given 1-based index.
    pub fn from_path(path: impl AsRef<Path>, index: usize) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = text::read_latin1(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(analyze(path, index, &text))
    }

    /// Mark each data file as referenced when its opening entity satisfies
    /// the predicate (normally the hierarchy's reachability query).
    pub fn resolve_references(&mut self, mut is_referenced: impl FnMut(&str) -> bool) {
        for file in self.in_files.iter_mut().chain(self.out_files.iter_mut()) {
            file.referenced = is_referenced(&file.module);
        }
    }

    /// All redirected data files, inputs first.
    pub fn data_files(&self) -> impl Iterator<Item = &DataFile> {
        self.in_files.iter().chain(self.out_files.iter())
    }
}

/// Analyze source text that was read from `original`.
#[must_use]
pub fn analyze(original: &Path, index: usize, text: &str) -> SourceAnalysis {
    let mut analyzer = Analyzer::new(original, index, text.len());
    let mut scanner = LineScanner::new(text);
    let mut line_number: u32 = 0;

    while let Some(mut line) = scanner.next_line() {
        line_number += 1;
        if CONTINUED_DECL.is_match(&line) {
            while let Some(next) = scanner.next_line() {
                line.push(' ');
                line.push_str(&next);
                line_number += 1;
                if next.contains(';') {
                    break;
                }
            }
        }
        let line = analyzer.process_line(line);
        analyzer.emit(&line, LineOrigin::Source(line_number));
    }
    analyzer.line_map.push(LineOrigin::EndOfFile);

    let analysis = analyzer.finish(original, index);
    debug!(
        "analyzed {} as {}: {} entities, {} components, {} enum signals",
        original.display(),
        analysis.file.internal,
        analysis.modules.len(),
        analysis.submodules.len(),
        analysis.enum_signals.len()
    );
    analysis
}

struct Analyzer {
    index: usize,
    source_dir: PathBuf,
    content: String,
    line_map: LineMap,
    current_entity: SmolStr,
    current_architecture: SmolStr,
    enum_types: FxHashMap<SmolStr, Vec<SmolStr>>,
    modules: Vec<SmolStr>,
    submodules: IndexSet<SubmoduleRef>,
    enum_signals: IndexMap<SmolStr, EnumSignal>,
    in_files: Vec<DataFile>,
    out_files: Vec<DataFile>,
    uses_vhdl2008: bool,
}

impl Analyzer {
    fn new(original: &Path, index: usize, capacity: usize) -> Self {
        Self {
            index,
            source_dir: original.parent().map(Path::to_path_buf).unwrap_or_default(),
            content: String::with_capacity(capacity),
            line_map: LineMap::new(),
            current_entity: SmolStr::default(),
            current_architecture: SmolStr::default(),
            enum_types: FxHashMap::default(),
            modules: Vec::new(),
            submodules: IndexSet::new(),
            enum_signals: IndexMap::new(),
            in_files: Vec::new(),
            out_files: Vec::new(),
            uses_vhdl2008: false,
        }
    }

    fn emit(&mut self, line: &str, origin: LineOrigin) {
        self.content.push_str(line);
        self.content.push('\n');
        self.line_map.push(origin);
    }

    fn process_line(&mut self, line: String) -> String {
        if let Some(caps) = ENTITY_DECL.captures(&line) {
            self.modules.push(lower(&caps[1]));
        }
        if let Some(caps) = ARCHITECTURE_DECL.captures(&line) {
            self.current_architecture = lower(&caps[1]);
            self.current_entity = lower(&caps[2]);
        }
        if let Some(caps) = COMPONENT_DECL.captures(&line) {
            self.add_submodule(&caps[1]);
        }
        if let Some(caps) = ENTITY_INSTANCE.captures(&line) {
            if !caps[1].eq_ignore_ascii_case("is") {
                self.add_submodule(&caps[1]);
            }
        }

        let line = self.rewrite_file_decl(&line).unwrap_or(line);
        let line = self.rewrite_file_open(&line).unwrap_or(line);

        if let Some(caps) = ENUM_TYPE.captures(&line) {
            let values = split_names(&caps[2]).map(SmolStr::new).collect();
            self.enum_types.insert(lower(&caps[1]), values);
        }
        if let Some(caps) = SIGNAL_DECL.captures(&line) {
            let names: Vec<SmolStr> = split_names(&caps[1]).map(SmolStr::new).collect();
            self.track_enum_signals(&lower(&caps[2]), names);
        }
        if self.closes_architecture(&line) {
            self.emit_tracking_assignments();
        }
        if VHDL2008_SYNTAX.is_match(&line) {
            self.uses_vhdl2008 = true;
        }
        line
    }

    fn add_submodule(&mut self, name: &str) {
        self.submodules.insert(SubmoduleRef {
            name: lower(name),
            parent: self.current_entity.clone(),
        });
    }

    fn rewrite_file_decl(&mut self, line: &str) -> Option<String> {
        let caps = FILE_DECL.captures(line)?;
        let declaration = caps[2].trim_end().to_ascii_lowercase();
        let direction = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(keyword) if keyword == "in" => Direction::Input,
            Some(_) => Direction::Output,
            // VHDL-93 open kinds; a declaration without one opens for reading.
            None if declaration.ends_with("write_mode") || declaration.ends_with("append_mode") => {
                Direction::Output
            }
            None => Direction::Input,
        };
        let internal = self.add_data_file(&caps[4], direction);
        let end = caps.get(0).map_or(line.len(), |m| m.end());
        Some(format!("{}{internal}{}{}", &caps[1], &caps[5], &line[end..]))
    }

    fn rewrite_file_open(&mut self, line: &str) -> Option<String> {
        let caps = FILE_OPEN.captures(line)?;
        let direction = if caps[4].eq_ignore_ascii_case("read_mode") {
            Direction::Input
        } else {
            Direction::Output
        };
        let internal = self.add_data_file(&caps[2], direction);
        let end = caps.get(0).map_or(line.len(), |m| m.end());
        Some(format!("{}{internal}{}{}", &caps[1], &caps[3], &line[end..]))
    }

    fn add_data_file(&mut self, original: &str, direction: Direction) -> SmolStr {
        let files = match direction {
            Direction::Input => &mut self.in_files,
            Direction::Output => &mut self.out_files,
        };
        let internal = SmolStr::new(format!(
            "src{}_{}{}",
            self.index,
            direction.tag(),
            files.len()
        ));
        files.push(DataFile {
            original: self.source_dir.join(original),
            internal: internal.clone(),
            module: self.current_entity.clone(),
            direction,
            referenced: false,
        });
        internal
    }

    fn track_enum_signals(&mut self, type_name: &SmolStr, names: Vec<SmolStr>) {
        let Some(values) = self.enum_types.get(type_name).cloned() else {
            return;
        };
        for signal in names {
            let tracking = SmolStr::new(format!(
                "{TRACKING_PREFIX}_src{}_enum{}",
                self.index,
                self.enum_signals.len()
            ));
            self.emit(&format!("signal {tracking} : integer;"), LineOrigin::Synthetic);
            self.enum_signals.insert(
                tracking,
                EnumSignal {
                    module: self.current_entity.clone(),
                    type_name: type_name.clone(),
                    signal,
                    values: values.clone(),
                },
            );
        }
    }

    fn closes_architecture(&self, line: &str) -> bool {
        if self.current_architecture.is_empty() {
            return false;
        }
        END_DECL.captures_iter(line).any(|caps| match caps.get(2) {
            Some(name) => name.as_str().eq_ignore_ascii_case(&self.current_architecture),
            None => caps.get(1).is_some(),
        })
    }

    fn emit_tracking_assignments(&mut self) {
        let assignments: Vec<String> = self
            .enum_signals
            .iter()
            .filter(|(_, binding)| binding.module == self.current_entity)
            .map(|(tracking, binding)| {
                format!("{tracking} <= {}'pos({});", binding.type_name, binding.signal)
            })
            .collect();
        for assignment in assignments {
            self.emit(&assignment, LineOrigin::Synthetic);
        }
    }

    fn finish(self, original: &Path, index: usize) -> SourceAnalysis {
        SourceAnalysis {
            file: SourceFile {
                original: original.to_path_buf(),
                internal: sandboxed_source_name(index),
                content: self.content,
                line_map: self.line_map,
            },
            modules: self.modules,
            submodules: self.submodules,
            enum_signals: self.enum_signals,
            in_files: self.in_files,
            out_files: self.out_files,
            uses_vhdl2008: self.uses_vhdl2008,
        }
    }
}

fn lower(name: &str) -> SmolStr {
    SmolStr::new(name.to_ascii_lowercase())
}
