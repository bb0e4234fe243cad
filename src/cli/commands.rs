use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{self, SondoConfig};
use crate::errors::SondoError;

pub const DEFAULT_CONFIG_FILE: &str = "sondo.yaml";

#[derive(Parser)]
#[command(name = "sondo", version, about = "LLM-guided vulnerability discovery for IoT web interfaces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify captured packets and generate proof-of-concept scripts
    Generate(ConfigArgs),
    /// Run generated scripts against the device
    Execute(ExecuteArgs),
    /// Re-run confirmed scripts to rule out flaky results
    Verify(ConfigArgs),
}

#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Device vendor (overrides the config file)
    #[arg(long)]
    pub vendor: Option<String>,

    /// Device product (overrides the config file)
    #[arg(long)]
    pub product: Option<String>,

    /// Workspace root (overrides the config file)
    #[arg(long)]
    pub workspace: Option<String>,
}

#[derive(Args, Clone)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Clear the success set without asking
    #[arg(long)]
    pub reset: bool,

    /// Keep the success set without asking
    #[arg(long, conflicts_with = "reset")]
    pub keep: bool,
}

impl ConfigArgs {
    /// File config with CLI overrides applied, validated. The default config
    /// file is optional; an explicitly named one must exist.
    pub async fn load(&self) -> Result<SondoConfig, SondoError> {
        let path = Path::new(&self.config);
        let mut config = if path.exists() || self.config != DEFAULT_CONFIG_FILE {
            config::parse_config(path).await?
        } else {
            SondoConfig::default()
        };
        if let Some(vendor) = &self.vendor {
            config.vendor = vendor.clone();
        }
        if let Some(product) = &self.product {
            config.product = product.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace = PathBuf::from(workspace);
        }
        config.validate()?;
        Ok(config)
    }
}
