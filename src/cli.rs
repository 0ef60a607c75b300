use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stead", about = "Dev VM settings resolver and provision-plan builder")]
pub struct Cli {
    /// Path to settings file
    #[arg(short, long, default_value = "stead.yaml")]
    pub config: PathBuf,

    /// Directory holding the provisioning scripts
    #[arg(long, default_value = "scripts")]
    pub scripts: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the provision plan and print it
    Plan,

    /// Load, normalize, and validate the settings file
    Check,

    /// Create a starter stead.yaml
    Init {
        /// Skip the wizard and write defaults
        #[arg(long)]
        defaults: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}
