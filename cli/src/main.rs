mod args;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use crate::args::Args;
use crate::commands::run;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    // stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(Level::from(args.log_level))
        .init();

    let command_json = serde_json::to_string(&args.command).unwrap_or_else(|_| "{}".to_string());
    tracing::debug!("command: {}", command_json);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
