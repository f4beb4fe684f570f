//! Shell completions generator.

use std::process::ExitCode;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;

pub fn run_completions(shell: Shell) -> anyhow::Result<ExitCode> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ggfront", &mut std::io::stdout());
    Ok(ExitCode::SUCCESS)
}
