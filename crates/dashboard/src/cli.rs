//! Clap derive structures for the `dashboard` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dashboard_config::RetryPreset;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dashboard -- bootstrap and connectivity tool for the dashboard client
#[derive(Debug, Parser)]
#[command(
    name = "dashboard",
    version,
    about = "Bootstrap the dashboard backend and inspect connectivity",
    long_about = "Brings the dashboard client from a cold start to a fully operational\n\
        state: checks the network, validates configuration, initializes the\n\
        remote service and signs in, falling back to local data when the\n\
        backend cannot be reached.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to load instead of the platform default
    #[arg(long, env = "DASHBOARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bootstrap sequence and bind the data repositories
    #[command(alias = "up")]
    Bootstrap(BootstrapArgs),

    /// Take one connectivity reading and ping the remote
    Probe,

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct BootstrapArgs {
    /// Retry preset, overriding `[retry] preset`
    #[arg(long)]
    pub preset: Option<PresetArg>,

    /// Bind local repositories instead of failing when bootstrap fails
    #[arg(long)]
    pub local_on_failure: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    /// Slow, patient retries (the default)
    Conservative,
    /// Short delays, many attempts
    Aggressive,
    /// Sub-second delays, for development
    Fast,
}

impl From<PresetArg> for RetryPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Conservative => Self::Conservative,
            PresetArg::Aggressive => Self::Aggressive,
            PresetArg::Fast => Self::Fast,
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (file + environment)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
