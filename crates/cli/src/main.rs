//! # psensor-host
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 周期传感器运行与控制台控制
//! - 优雅关闭处理

mod cli;
mod commands;
mod host;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_host, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Prometheus is installed by `run` itself
    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..ObservabilityConfig::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "psensor-host starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_host(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
