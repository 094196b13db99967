use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod app;

fn main() -> Result<ExitCode> {
    let cli = app::Cli::parse();
    if app::run(&cli)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
