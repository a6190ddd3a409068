//! Complaint desk - operator CLI for the complaint lifecycle engine
//!
//! Loads engine configuration and a staff roster, then replays scripted
//! submissions and staff actions, printing one JSON line per step.

mod cli;
mod replay;

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use complaint_engine::LifecycleCoordinator;

use cli::{Cli, Command};
use replay::{Replayer, Script};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries replay output
    let log_level = cli.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("complaint_desk={0},complaint_engine={0},warn", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::ShowConfig => {
            print!("{}", config.to_yaml()?);
        }
        Command::Replay { script } => {
            let directory = cli::load_staff(cli.staff.as_deref())?;
            info!(
                staff = directory.len(),
                cooldown_secs = config.admission.cooldown_secs,
                "Starting replay"
            );

            let content = std::fs::read_to_string(&script)
                .with_context(|| format!("reading script {}", script.display()))?;
            let script = Script::from_yaml(&content)
                .with_context(|| format!("parsing script {}", script.display()))?;

            let coordinator = LifecycleCoordinator::in_memory(config, Arc::new(directory))?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = Replayer::new(&coordinator).run(script, &mut out).await?;
            out.flush()?;

            info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Replay finished"
            );
        }
    }

    Ok(())
}
