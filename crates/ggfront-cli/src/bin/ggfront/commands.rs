//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use ggfront_project::driver::CONTINUE_PROMPT;
use ggfront_project::{
    trace, PatternTable, Project, ProjectConfig, ProjectError, Reformatter, Settings, Simulation,
    SimulationEnd, SimulationError, SimulationOutcome, TopSelection, Workdir,
};
use ggfront_syntax::text::read_latin1;
use ggfront_syntax::{EnumSignal, SourceAnalysis};
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::cli::{OutputFormat, SourceArgs};
use crate::render::{render_conversion, render_hierarchy, render_report};
use crate::tools::{self, GhdlProcess};
use crate::{prompt, style};

/// Project file picked up from the current directory.
const PROJECT_FILE_NAME: &str = "ggfront-project.toml";

pub struct SimulateOptions {
    pub workdir: Option<PathBuf>,
    pub sim_limit: Option<u32>,
    pub patterns: Option<PathBuf>,
    pub assume_yes: bool,
}

pub fn run_hierarchy(sources: &SourceArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let project = load_project(sources)?;
    let hierarchy = project.hierarchy();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(hierarchy)?),
        OutputFormat::Text => {
            print!("{}", render_hierarchy(hierarchy));
            if let Some(wave) = hierarchy.wave_path() {
                println!("{}", style::accent(format!("波形ファイル: {}", wave.display())));
            }
        }
    }
    if hierarchy.is_resolved() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", style::warning(SimulationError::NoTop.to_string()));
        Ok(ExitCode::FAILURE)
    }
}

pub fn run_convert(file: &Path, index: usize, format: OutputFormat) -> anyhow::Result<ExitCode> {
    anyhow::ensure!(index >= 1, "--index は 1 以上を指定してください．");
    let analysis = SourceAnalysis::from_path(file, index)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => print!("{}", render_conversion(&analysis)),
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_diagnose(
    log: &Path,
    sources: &SourceArgs,
    settings: Option<&Path>,
    vhdl2008: bool,
    patterns: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings)?;
    let project = load_project(sources)?;
    let analyses = analyze_all(&project)?;
    let patterns = load_patterns(patterns)?;
    let text = read_latin1(log)
        .with_context(|| format!("ログ {} の読み込みに失敗しました．", log.display()))?;

    let vhdl2008 = vhdl2008 || project.use_vhdl2008(settings.vhdl_std);
    let report = Reformatter::new(analyses.iter().map(|a| &a.file), &patterns, vhdl2008)
        .reformat(&text);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            print!("{}", render_report(&report));
            if let Some(time) = report.sim_time {
                println!("{}", style::accent(format!("停止時刻: {time} ns")));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_wave(
    trace_path: &Path,
    out: &Path,
    end: ggfront_project::SimTime,
    sources: &SourceArgs,
) -> anyhow::Result<ExitCode> {
    let project = load_project(sources)?;
    let enum_signals: IndexMap<SmolStr, EnumSignal> = analyze_all(&project)?
        .into_iter()
        .flat_map(|analysis| analysis.enum_signals)
        .collect();
    trace::postprocess(trace_path, out, end, &enum_signals)?;
    println!(
        "{}",
        style::success(format!("{} を書き出しました．", out.display()))
    );
    Ok(ExitCode::SUCCESS)
}

pub fn run_simulate(
    sources: &SourceArgs,
    settings: Option<&Path>,
    options: SimulateOptions,
) -> anyhow::Result<ExitCode> {
    let mut settings = load_settings(settings)?;
    if let Some(limit) = options.sim_limit {
        settings.sim_limit_ms = limit;
    }
    settings.check()?;
    let project = load_project(sources)?;
    if !project.hierarchy().is_resolved() {
        eprint!("{}", render_hierarchy(project.hierarchy()));
    }
    let patterns = load_patterns(options.patterns.as_deref())?;
    let workdir = Workdir::new(options.workdir.unwrap_or_else(default_workdir));
    let toolchain = GhdlProcess::new(&settings, &tools::base_dir())?;

    let assume_yes = options.assume_yes;
    let outcome = Simulation::new(&settings, &patterns, &workdir, toolchain).run(
        &project,
        |report| {
            print!("{}", render_report(report));
            assume_yes
                || prompt::confirm(CONTINUE_PROMPT, true).unwrap_or_else(|err| {
                    warn!("{err}");
                    false
                })
        },
    )?;

    let message = outcome.message();
    match &outcome {
        SimulationOutcome::CompileFailed { report, .. } => {
            print!("{}", render_report(report));
            eprintln!("{}", style::error(message));
        }
        SimulationOutcome::Stopped { .. } => println!("{}", style::warning(message)),
        SimulationOutcome::RunFailed { report, .. } => {
            print!("{}", render_report(report));
            eprintln!("{}", style::error(message));
        }
        SimulationOutcome::Completed(completion) => {
            print!("{}", render_report(&completion.report));
            match completion.end {
                SimulationEnd::Finished(_) => println!("{}", style::success(message)),
                SimulationEnd::LimitReached { .. } => println!("{}", style::warning(message)),
            }
            println!(
                "{}",
                style::accent(format!("波形ファイル: {}", completion.wave_path.display()))
            );
            for issue in &completion.issues {
                eprintln!("{}", style::warning(issue.to_string()));
            }
        }
    }
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn run_view(sources: &SourceArgs, settings: Option<&Path>) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings)?;
    settings.check()?;
    let project = load_project(sources)?;
    let wave = project
        .wave_path()
        .filter(|_| project.hierarchy().is_resolved())
        .ok_or(SimulationError::NoTop)?;
    anyhow::ensure!(wave.is_file(), "波形ファイルが作成されていません．");
    tools::launch_viewer(&settings, &tools::base_dir(), wave)?;
    Ok(ExitCode::SUCCESS)
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.map(Path::to_path_buf).or_else(Settings::default_path);
    let Some(path) = path else {
        debug!("no home directory; using default settings");
        return Ok(Settings::default());
    };
    Ok(Settings::load_or_default(path)?)
}

fn load_project(args: &SourceArgs) -> anyhow::Result<Project> {
    let mut config = match &args.project {
        Some(path) => ProjectConfig::load(path)?,
        None if !args.files.is_empty() => {
            ProjectConfig::from_sources(args.files.iter().cloned(), None)?
        }
        None => {
            let default = Path::new(PROJECT_FILE_NAME);
            if !default.is_file() {
                return Err(ProjectError::NoSources.into());
            }
            ProjectConfig::load(default)?
        }
    };
    if let Some(top) = &args.top {
        config.top = TopSelection::explicit(top);
    }
    let mut project = Project::new(config);
    for err in project.refresh() {
        eprintln!("{}", style::warning(err.to_string()));
    }
    Ok(project)
}

fn analyze_all(project: &Project) -> anyhow::Result<Vec<SourceAnalysis>> {
    Ok(project
        .analyze()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?)
}

fn load_patterns(path: Option<&Path>) -> anyhow::Result<PatternTable> {
    let Some(path) = path else {
        return Ok(PatternTable::builtin());
    };
    let text = std::fs::read_to_string(path).with_context(|| {
        format!("エラーパターン {} の読み込みに失敗しました．", path.display())
    })?;
    Ok(PatternTable::parse(&text))
}

fn default_workdir() -> PathBuf {
    std::env::temp_dir().join("ggfront-work")
}
