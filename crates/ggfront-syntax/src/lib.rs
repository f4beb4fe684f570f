//! `ggfront-syntax` - Line-level VHDL scanning for the GHDL front-end.
//!
//! This crate turns user VHDL sources into the sandboxed form GHDL is run on:
//!
//! - **Scanner**: Strips `--` and `/* */` comments line by line without
//!   touching string literals
//! - **Source analysis**: Extracts entity/architecture/component declarations,
//!   rewrites opened data files to sandboxed names and injects tracking
//!   signals for enumerated types
//! - **Line maps**: Record which original line each rewritten line came from
//!
//! The recognition is pattern based. It is not a VHDL parser and only looks
//! for the constructs needed to build the design hierarchy and to map GHDL
//! messages back onto user files.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use ggfront_syntax::{analyze, LineOrigin};
//!
//! let text = "entity top is\nend top;\n";
//! let analysis = analyze(Path::new("top.vhd"), 1, text);
//!
//! assert_eq!(analysis.file.internal, "src1.vhd");
//! assert_eq!(analysis.modules, vec!["top"]);
//! assert_eq!(analysis.file.line_map.resolve(2), Some(LineOrigin::Source(2)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod line_map;
mod patterns;
pub mod scanner;
pub mod source;
pub mod text;

pub use error::SourceError;
pub use line_map::{LineMap, LineOrigin};
pub use scanner::{strip_comments, LineScanner, ScanState};
pub use source::{
    analyze, sandboxed_source_name, DataFile, Direction, EnumSignal, SourceAnalysis, SourceFile,
    SubmoduleRef, SANDBOX_EXTENSION, TRACKING_PREFIX,
};
