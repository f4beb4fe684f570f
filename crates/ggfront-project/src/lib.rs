//! `ggfront-project` - Project-level services of the GHDL front-end.
//!
//! Built on the per-file analysis of `ggfront-syntax`, this crate provides:
//!
//! - **Hierarchy**: Entity reference trees, duplicate and cycle detection,
//!   top module selection and reachability from the top
//! - **Diagnostics**: GHDL output mapped back onto user files, classified
//!   against a pattern table of known errors
//! - **Trace**: VCD postprocessing that restores enumeration literals
//! - **Configuration**: Versioned tool settings and TOML project files
//! - **Simulation**: Working-directory staging and the analyze, elaborate
//!   and run sequence behind the [`Toolchain`] trait
//!
//! Every service takes its context (settings, project, pattern table) by
//! reference. There is no process-wide state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod hierarchy;
pub mod project;
pub mod settings;
pub mod trace;
pub mod workdir;

pub use diagnostics::{
    CaretExcerpt, DiagnosticLine, DiagnosticReport, Excerpt, ExcerptHeuristic, PatternEntry,
    PatternTable, Reformatter, SimTime,
};
pub use driver::{
    Completion, FailureScope, Simulation, SimulationEnd, SimulationOutcome, ToolLog, ToolOutput,
    ToolRequest, ToolStep, Toolchain, CONTINUE_PROMPT,
};
pub use error::{ProjectError, SettingsError, SimulationError, StageError, ToolError, TraceError};
pub use hierarchy::{Hierarchy, HierarchyItem, HierarchyStatus, TopSelection};
pub use project::{Project, ProjectConfig};
pub use settings::{Settings, ToolPath, VhdlStandard};
pub use workdir::Workdir;
