//! Compile-and-simulate sequence.
//!
//! Every source is analyzed (`-a`) in project order; when all of them pass
//! the top module is elaborated (`-e`) and run (`-r`). Tool output is
//! reformatted after the compile phase and after the run. The external
//! process is reached through [`Toolchain`], so the sequence can be driven
//! by the real GHDL or by a scripted stand-in.

use std::fmt;
use std::path::{Path, PathBuf};

use ggfront_syntax::{EnumSignal, SourceAnalysis};
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::diagnostics::{DiagnosticReport, PatternTable, Reformatter, SimTime};
use crate::error::{SimulationError, ToolError};
use crate::project::Project;
use crate::settings::Settings;
use crate::trace;
use crate::workdir::{Workdir, TRACE_FILE};

/// Prompt shown when compilation produced messages but no errors.
pub const CONTINUE_PROMPT: &str =
    "解析中に警告が発生しました．詳しくはログを参照してください．\n続けてシミュレーションを行いますか？";

/// GHDL command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStep {
    /// Analyze one source file.
    Analyze,
    /// Elaborate the top module.
    Elaborate,
    /// Run the elaborated top module.
    Run,
}

impl ToolStep {
    /// Command flag.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Analyze => "-a",
            Self::Elaborate => "-e",
            Self::Run => "-r",
        }
    }
}

/// One tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    /// Command.
    pub step: ToolStep,
    /// Sandboxed source name for analysis, top module otherwise.
    pub target: SmolStr,
    /// Compile as VHDL-2008.
    pub vhdl2008: bool,
    /// Simulation stop time, used by [`ToolStep::Run`].
    pub stop_ms: u32,
}

impl ToolRequest {
    /// Command line arguments for GHDL.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        let mut args = vec![self.step.flag().to_string()];
        if self.vhdl2008 {
            args.push("--std=08".into());
        } else {
            args.push("-fexplicit".into());
            args.push("-fsynopsys".into());
        }
        args.push(self.target.to_string());
        if self.step == ToolStep::Run {
            args.push(format!("--vcd={TRACE_FILE}"));
            args.push("--ieee-asserts=disable".into());
            args.push(format!("--stop-time={}ms", self.stop_ms));
        }
        args
    }
}

/// Captured result of a finished tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit status.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// True for a zero exit status.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs GHDL commands inside a working directory.
pub trait Toolchain {
    /// Run one command to completion in `workdir`.
    fn run(&mut self, request: &ToolRequest, workdir: &Path) -> Result<ToolOutput, ToolError>;
}

impl<T: Toolchain + ?Sized> Toolchain for &mut T {
    fn run(&mut self, request: &ToolRequest, workdir: &Path) -> Result<ToolOutput, ToolError> {
        (**self).run(request, workdir)
    }
}

/// Output of consecutive tool runs, reformatted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolLog {
    text: String,
    exit_code: i32,
}

impl ToolLog {
    /// Append a run: stdout, then stderr, separated from earlier output by
    /// a newline. The exit code of the last run is kept.
    pub fn append(&mut self, output: &ToolOutput) {
        let has_output = !output.stdout.is_empty() || !output.stderr.is_empty();
        if !self.text.is_empty() && has_output {
            self.text.push('\n');
        }
        self.text.push_str(&output.stdout);
        self.text.push_str(&output.stderr);
        self.exit_code = output.exit_code;
    }

    /// Accumulated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Exit code of the last run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// True when no run produced output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Which part of compilation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Analysis of this many files failed.
    Files(usize),
    /// Every file analyzed but elaboration failed.
    Design,
}

impl fmt::Display for FailureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files(count) => write!(f, "{count}個のファイル"),
            Self::Design => f.write_str("ファイル全体"),
        }
    }
}

/// How a simulation that ran to the end stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEnd {
    /// The testbench stopped the simulation at this time.
    Finished(SimTime),
    /// The stop limit was reached first.
    LimitReached {
        /// The limit in milliseconds.
        limit_ms: u32,
    },
}

impl SimulationEnd {
    /// Last simulated instant.
    #[must_use]
    pub fn time(self) -> SimTime {
        match self {
            Self::Finished(time) => time,
            Self::LimitReached { limit_ms } => SimTime::from_ms(u64::from(limit_ms)),
        }
    }
}

/// A simulation that ran to the end.
#[derive(Debug)]
pub struct Completion {
    /// Reformatted compile output.
    pub compile: DiagnosticReport,
    /// Reformatted run output.
    pub report: DiagnosticReport,
    /// How the run stopped.
    pub end: SimulationEnd,
    /// Where the postprocessed trace was written.
    pub wave_path: PathBuf,
    /// Failures after the run (trace or output files). They do not
    /// invalidate the simulation.
    pub issues: Vec<SimulationError>,
}

/// Result of [`Simulation::run`].
#[derive(Debug)]
pub enum SimulationOutcome {
    /// Analysis or elaboration failed; nothing was run.
    CompileFailed {
        /// What failed.
        scope: FailureScope,
        /// Reformatted compile output.
        report: DiagnosticReport,
    },
    /// Compilation printed warnings and the caller chose to stop.
    Stopped {
        /// Reformatted compile output.
        report: DiagnosticReport,
    },
    /// The run failed before the testbench stopped it.
    RunFailed {
        /// Reformatted compile output.
        compile: DiagnosticReport,
        /// Reformatted run output.
        report: DiagnosticReport,
    },
    /// The run completed.
    Completed(Completion),
}

impl SimulationOutcome {
    /// Status line for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::CompileFailed { scope, .. } => format!(
                "{scope}の解析中にエラーが発生しました．詳しくはログを参照してください．"
            ),
            Self::Stopped { .. } => "シミュレーションを中止しました．".to_string(),
            Self::RunFailed { .. } => {
                "シミュレーション中にエラーが発生しました．詳しくはログを参照してください．"
                    .to_string()
            }
            Self::Completed(completion) => match completion.end {
                SimulationEnd::Finished(time) => {
                    format!("シミュレーションは {time} ns 後に停止しました．")
                }
                SimulationEnd::LimitReached { limit_ms } => {
                    format!("シミュレーションは {limit_ms} ms 以内に終了しませんでした．")
                }
            },
        }
    }

    /// True unless compilation or the run failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Stopped { .. })
    }
}

/// Compile-and-simulate request over borrowed context.
pub struct Simulation<'a, T> {
    settings: &'a Settings,
    patterns: &'a PatternTable,
    workdir: &'a Workdir,
    toolchain: T,
}

impl<'a, T: Toolchain> Simulation<'a, T> {
    /// New request.
    pub fn new(
        settings: &'a Settings,
        patterns: &'a PatternTable,
        workdir: &'a Workdir,
        toolchain: T,
    ) -> Self {
        Self {
            settings,
            patterns,
            workdir,
            toolchain,
        }
    }

    /// Compile and simulate `project`, whose hierarchy must be current.
    ///
    /// `proceed` is asked whether to simulate when compilation succeeded
    /// with output (normally warnings).
    pub fn run(
        &mut self,
        project: &Project,
        proceed: impl FnOnce(&DiagnosticReport) -> bool,
    ) -> Result<SimulationOutcome, SimulationError> {
        self.settings.check()?;
        let hierarchy = project.hierarchy();
        if !hierarchy.is_resolved() {
            return Err(SimulationError::NoTop);
        }
        let top = SmolStr::new(hierarchy.top().ok_or(SimulationError::NoTop)?);
        let wave_path = hierarchy
            .wave_path()
            .map(Path::to_path_buf)
            .ok_or(SimulationError::NoTop)?;
        let vhdl2008 = project.use_vhdl2008(self.settings.vhdl_std);

        self.workdir.prepare()?;
        let mut analyses: Vec<SourceAnalysis> = Vec::with_capacity(project.sources().len());
        let mut log = ToolLog::default();
        let mut failed_files = 0;
        for (index, path) in project.sources().iter().enumerate() {
            let mut analysis = SourceAnalysis::from_path(path, index + 1)?;
            analysis.resolve_references(|entity| hierarchy.referenced(entity));
            self.workdir.stage(&analysis)?;

            let output = self.invoke(ToolStep::Analyze, analysis.file.internal.clone(), vhdl2008)?;
            if !output.success() {
                failed_files += 1;
            }
            log.append(&output);
            analyses.push(analysis);
        }

        let mut scope = (failed_files > 0).then_some(FailureScope::Files(failed_files));
        if scope.is_none() {
            let output = self.invoke(ToolStep::Elaborate, top.clone(), vhdl2008)?;
            if !output.success() {
                scope = Some(FailureScope::Design);
            }
            log.append(&output);
        }

        let reformatter =
            Reformatter::new(analyses.iter().map(|a| &a.file), self.patterns, vhdl2008);
        let compile = reformatter.reformat(log.text());
        if let Some(scope) = scope {
            info!("compilation failed: {scope}");
            return Ok(SimulationOutcome::CompileFailed {
                scope,
                report: compile,
            });
        }
        if !log.is_empty() && !proceed(&compile) {
            return Ok(SimulationOutcome::Stopped { report: compile });
        }

        let output = self.invoke(ToolStep::Run, top, vhdl2008)?;
        let mut run_log = ToolLog::default();
        run_log.append(&output);
        let report = reformatter.reformat(run_log.text());
        let end = match report.sim_time {
            Some(time) => SimulationEnd::Finished(time),
            None if !output.success() => {
                return Ok(SimulationOutcome::RunFailed { compile, report });
            }
            None => SimulationEnd::LimitReached {
                limit_ms: self.settings.sim_limit_ms,
            },
        };
        info!("simulation ended: {end:?}");

        let mut issues = Vec::new();
        let enum_signals: IndexMap<SmolStr, EnumSignal> = analyses
            .iter()
            .flat_map(|analysis| analysis.enum_signals.clone())
            .collect();
        if let Err(err) =
            trace::postprocess(&self.workdir.trace_path(), &wave_path, end.time(), &enum_signals)
        {
            warn!("{err}");
            issues.push(err.into());
        }
        for analysis in &analyses {
            if let Err(err) = self.workdir.collect(analysis) {
                warn!("{err}");
                issues.push(err.into());
            }
        }

        Ok(SimulationOutcome::Completed(Completion {
            compile,
            report,
            end,
            wave_path,
            issues,
        }))
    }

    fn invoke(
        &mut self,
        step: ToolStep,
        target: SmolStr,
        vhdl2008: bool,
    ) -> Result<ToolOutput, ToolError> {
        let request = ToolRequest {
            step,
            target,
            vhdl2008,
            stop_ms: self.settings.sim_limit_ms,
        };
        debug!("ghdl {}", request.arguments().join(" "));
        self.toolchain.run(&request, self.workdir.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_follow_standard() {
        let request = ToolRequest {
            step: ToolStep::Analyze,
            target: "src1.vhd".into(),
            vhdl2008: false,
            stop_ms: 1,
        };
        assert_eq!(request.arguments(), vec!["-a", "-fexplicit", "-fsynopsys", "src1.vhd"]);

        let request = ToolRequest {
            step: ToolStep::Run,
            target: "tb".into(),
            vhdl2008: true,
            stop_ms: 10,
        };
        assert_eq!(
            request.arguments(),
            vec![
                "-r",
                "--std=08",
                "tb",
                "--vcd=wave.vcd",
                "--ieee-asserts=disable",
                "--stop-time=10ms",
            ]
        );
    }

    #[test]
    fn log_separates_runs() {
        let mut log = ToolLog::default();
        log.append(&ToolOutput::default());
        assert!(log.is_empty());
        log.append(&ToolOutput {
            exit_code: 1,
            stdout: "a\n".into(),
            stderr: "b\n".into(),
        });
        log.append(&ToolOutput::default());
        log.append(&ToolOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: "c\n".into(),
        });
        assert_eq!(log.text(), "a\nb\n\nc\n");
        assert_eq!(log.exit_code(), 0);
    }

    #[test]
    fn messages() {
        let outcome = SimulationOutcome::CompileFailed {
            scope: FailureScope::Files(2),
            report: DiagnosticReport::default(),
        };
        assert_eq!(
            outcome.message(),
            "2個のファイルの解析中にエラーが発生しました．詳しくはログを参照してください．"
        );
        assert_eq!(FailureScope::Design.to_string(), "ファイル全体");
        assert_eq!(
            SimulationEnd::LimitReached { limit_ms: 1 }.time(),
            SimTime::from_fs(1_000_000_000_000)
        );
    }
}
