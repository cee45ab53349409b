// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::FailurePolicy;

/// Command-line arguments for `cloudwork`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cloudwork",
    version,
    about = "Run provisioning and job scripts across a fleet of hosts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cloudwork.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Cloudwork.toml")]
    pub config: String,

    /// Run only on this worker (exact host match).
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLOUDWORK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the config's `failure_policy` (`continue` or `fail-fast`).
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,

    /// Do not ask for confirmation before running a local script file.
    #[arg(long, short = 'y')]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the input/output directory structure for the configured workers.
    Bootstrap,

    /// Run a named script from the config, or a local script file
    /// (`./path` or `/path`), on all workers.
    Run {
        #[arg(value_name = "NAME|FILE", default_value = "run")]
        script: String,
    },

    /// Run the given words as an ad-hoc script on all workers.
    Exec {
        #[arg(
            value_name = "SCRIPT",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        words: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
