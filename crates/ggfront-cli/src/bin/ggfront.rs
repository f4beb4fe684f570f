//! `ggfront` - command line front-end for GHDL and GTKWave.

#![forbid(unsafe_code)]

#[path = "ggfront/cli.rs"]
mod cli;
#[path = "ggfront/commands.rs"]
mod commands;
#[path = "ggfront/completions.rs"]
mod completions;
#[path = "ggfront/prompt.rs"]
mod prompt;
#[path = "ggfront/render.rs"]
mod render;
#[path = "ggfront/style.rs"]
mod style;
#[path = "ggfront/tools.rs"]
mod tools;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", style::error(format!("エラー: {err:#}")));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = cli.settings.as_deref();
    match cli.command {
        Command::Hierarchy { sources, format } => commands::run_hierarchy(&sources, format),
        Command::Convert {
            file,
            index,
            format,
        } => commands::run_convert(&file, index, format),
        Command::Diagnose {
            log,
            sources,
            vhdl2008,
            patterns,
            format,
        } => commands::run_diagnose(
            &log,
            &sources,
            settings,
            vhdl2008,
            patterns.as_deref(),
            format,
        ),
        Command::Wave { trace, out, end, sources } => {
            commands::run_wave(&trace, &out, end, &sources)
        }
        Command::Simulate {
            sources,
            workdir,
            sim_limit,
            patterns,
            yes,
        } => commands::run_simulate(
            &sources,
            settings,
            commands::SimulateOptions {
                workdir,
                sim_limit,
                patterns,
                assume_yes: yes,
            },
        ),
        Command::View { sources } => commands::run_view(&sources, settings),
        Command::Completions { shell } => completions::run_completions(shell),
    }
}
