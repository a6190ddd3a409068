//! Command line arguments and file loading.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use complaint_engine::{EngineConfig, InMemoryStaffDirectory};

/// Complaint desk - replay resident submissions and staff actions against
/// the complaint engine
#[derive(Parser, Debug)]
#[command(name = "complaint-desk")]
#[command(about = "Operator CLI for the complaint lifecycle engine")]
pub struct Cli {
    /// Engine configuration (YAML). Defaults apply when omitted.
    #[arg(short, long, env = "COMPLAINT_DESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Staff roster (YAML list of staff members)
    #[arg(short, long, env = "COMPLAINT_DESK_STAFF")]
    pub staff: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a YAML script of submissions and transitions, one JSON line per step
    Replay {
        /// Path to the script
        script: PathBuf,
    },
    /// Print the effective engine configuration as YAML
    ShowConfig,
}

/// Load and validate engine configuration.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_yaml(&content)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Load the staff roster, or an empty directory.
pub fn load_staff(path: Option<&Path>) -> anyhow::Result<InMemoryStaffDirectory> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading staff roster {}", path.display()))?;
            InMemoryStaffDirectory::from_yaml(&content)
                .with_context(|| format!("parsing staff roster {}", path.display()))
        }
        None => Ok(InMemoryStaffDirectory::new()),
    }
}
