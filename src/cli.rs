//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use shiplog::defaults::ROOT_ENV;
use shiplog::output::{OutputConfig, TerminalSink};

/// shiplog - Changelog entries, releases, and release notes
#[derive(Parser, Debug)]
#[command(name = "shiplog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Changelog project root (the directory holding config.yaml)
    #[arg(long, global = true, value_name = "DIR", env = ROOT_ENV, default_value = ".")]
    root: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new pending changelog entry
    Add(commands::add::AddArgs),

    /// Create, publish, or inspect releases
    Release(commands::release::ReleaseArgs),

    /// List entries or show entries and releases by identifier
    Show(commands::show::ShowArgs),

    /// Check entries, manifests, and modules for structural problems
    Validate(commands::validate::ValidateArgs),

    /// List the modules configured for this project
    Modules(commands::modules::ModulesArgs),

    /// Show release and entry statistics
    Stats(commands::stats::StatsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let sink = TerminalSink::new(OutputConfig::from_env_and_flag(&self.color));
        let root = self.root;

        match self.command {
            Commands::Add(args) => commands::add::execute(args, &root, &sink),
            Commands::Release(args) => commands::release::execute(args, &root, &sink),
            Commands::Show(args) => commands::show::execute(args, &root, &sink),
            Commands::Validate(args) => commands::validate::execute(args, &root, &sink),
            Commands::Modules(args) => commands::modules::execute(args, &root, &sink),
            Commands::Stats(args) => commands::stats::execute(args, &root, &sink),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Install the stderr logger. `RUST_LOG` overrides `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}
