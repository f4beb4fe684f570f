//! CLI definitions for ggfront.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use ggfront_project::SimTime;

#[derive(Debug, Parser)]
#[command(
    name = "ggfront",
    version,
    about = "GHDL simulation front-end",
    infer_subcommands = true,
    after_help = "Examples:\n  ggfront hierarchy rtl/*.vhd tb.vhd\n  ggfront simulate --project ggfront-project.toml\n  ggfront view --project ggfront-project.toml"
)]
pub struct Cli {
    /// Show debug logs.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Settings file (defaults to ~/.ggfront.toml).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which sources to work on.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Project file (defaults to ./ggfront-project.toml when no files are given).
    #[arg(long, conflicts_with = "files")]
    pub project: Option<PathBuf>,
    /// Top module, overriding the project file and automatic selection.
    #[arg(long)]
    pub top: Option<String>,
    /// VHDL sources in compile order.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the entity hierarchy and the selected top module.
    Hierarchy {
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Print a source as it is handed to GHDL, with its line map.
    Convert {
        /// VHDL source.
        file: PathBuf,
        /// Position in the compile order (names the file `src<N>.vhd`).
        #[arg(long, default_value_t = 1)]
        index: usize,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Reformat a captured GHDL log against the project sources.
    Diagnose {
        /// Captured GHDL output.
        log: PathBuf,
        #[command(flatten)]
        sources: SourceArgs,
        /// Read stop times the way VHDL-2008 runs report them.
        #[arg(long)]
        vhdl2008: bool,
        /// Error pattern table replacing the built-in one.
        #[arg(long)]
        patterns: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Rewrite a VCD trace so enumeration signals show their literals.
    Wave {
        /// Trace written by GHDL.
        trace: PathBuf,
        /// Destination of the rewritten trace.
        #[arg(long)]
        out: PathBuf,
        /// Final timestamp (e.g. 150ns).
        #[arg(long, value_parser = parse_sim_time, default_value = "0fs")]
        end: SimTime,
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Compile and simulate the project, then write the trace.
    Simulate {
        #[command(flatten)]
        sources: SourceArgs,
        /// Working directory handed to GHDL.
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Simulation stop limit in milliseconds, overriding the settings.
        #[arg(long)]
        sim_limit: Option<u32>,
        /// Error pattern table replacing the built-in one.
        #[arg(long)]
        patterns: Option<PathBuf>,
        /// Simulate without asking when compilation printed warnings.
        #[arg(long, short)]
        yes: bool,
    },
    /// Open the project's trace in GTKWave.
    View {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse `<integer><f|p|n|u|m>s`.
pub fn parse_sim_time(text: &str) -> Result<SimTime, String> {
    let digits = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("時間の値が不正です: {text}"))?;
    let mut unit = text[digits.len()..].chars();
    match (unit.next(), unit.as_str()) {
        (Some(prefix), "s") => SimTime::from_unit(value, prefix)
            .ok_or_else(|| format!("時間の単位が不正です: {text}")),
        _ => Err(format!("時間の単位が不正です: {text}")),
    }
}
