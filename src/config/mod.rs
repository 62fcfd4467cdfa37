pub mod params;

use clap::Parser;

use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "frcbot")]
#[command(about = "FRC robot control core running against simulated hardware")]
pub struct CliConfig {
    /// Robot parameters file (TOML)
    #[arg(long, default_value = "./params/robot.toml")]
    pub params: String,

    /// Autonomous script to run (CSV, usually *.as)
    #[arg(long)]
    pub autoscript: Option<String>,

    /// Directory to list available autonomous scripts from
    #[arg(long, default_value = "./scripts")]
    pub autoscript_dir: String,

    /// Number of 50 Hz control loop ticks to simulate
    #[arg(long, default_value = "500")]
    pub ticks: u64,

    /// Directory for subsystem data logs; disabled when not set
    #[arg(long)]
    pub log_dir: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("params", &self.params)?;
        validate_path("autoscript-dir", &self.autoscript_dir)?;
        if let Some(script) = &self.autoscript {
            validate_path("autoscript", script)?;
        }
        if let Some(dir) = &self.log_dir {
            validate_path("log-dir", dir)?;
        }
        Ok(())
    }
}
