//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// psensor-host - Periodic sensor agent host
#[derive(Parser, Debug)]
#[command(
    name = "psensor-host",
    author,
    version,
    about = "Run periodic sensors against an in-memory data hub",
    long_about = "Runs the periodic sensors described in a configuration file.\n\n\
                  Each sensor exposes <name>/value, <name>/enable, <name>/period and \n\
                  <name>/trigger. Control values are read from stdin as \n\
                  '<path> [value]' lines, e.g. 'temp/period 2.5' or 'temp/trigger'."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PSENSOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PSENSOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured sensors
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "psensor.toml",
        env = "PSENSOR_CONFIG"
    )]
    pub config: PathBuf,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "PSENSOR_DURATION")]
    pub duration: u64,

    /// Do not read control lines from stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Stop when stdin reaches end of file
    #[arg(long, conflicts_with = "no_stdin")]
    pub exit_on_eof: bool,

    /// Log every published sample at info level
    #[arg(long)]
    pub echo: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PSENSOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "psensor.toml", env = "PSENSOR_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "psensor.toml", env = "PSENSOR_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List the resource paths each sensor creates
    #[arg(long)]
    pub resources: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "psensor-host",
            "-vv",
            "run",
            "--config",
            "agent.toml",
            "--duration",
            "5",
            "--exit-on-eof",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("agent.toml"));
                assert_eq!(args.duration, 5);
                assert!(args.exit_on_eof);
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_conflicting_flags() {
        assert!(Cli::try_parse_from(["psensor-host", "-q", "-v", "info"]).is_err());
        assert!(
            Cli::try_parse_from(["psensor-host", "run", "--no-stdin", "--exit-on-eof"]).is_err()
        );
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
