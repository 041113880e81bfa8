// SPDX-License-Identifier: MIT OR Apache-2.0
//! `graph_editor` - check, format and inspect game-object records.
//!
//! Logs go to stderr and are filtered with `RUST_LOG`; command output goes
//! to stdout.

use clap::Parser;
use graph_editor_cli::{Cli, Outcome};
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("graph_editor v{} running {:?}", env!("CARGO_PKG_VERSION"), cli.command);

    match graph_editor_cli::run(cli) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
