//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::TimerService;
use data_hub::TokioTimerService;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::host::{console, Agent};

/// Execute the `run` command
pub async fn run_host(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        host = %blueprint.host.name,
        sensors = blueprint.sensors.len(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::install_prometheus(args.metrics_port)?;
    }

    let timers: Arc<dyn TimerService> =
        Arc::new(TokioTimerService::current().context("No tokio runtime for timers")?);
    let mut agent = Agent::build(&blueprint, timers)?;
    if args.echo {
        agent.echo_samples();
    }
    agent.apply_initial_controls(&blueprint)?;

    // Console
    let (eof_tx, eof_rx) = if args.exit_on_eof {
        let (tx, rx) = oneshot::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };
    let console = if args.no_stdin {
        None
    } else {
        Some(console::spawn(Arc::clone(agent.hub()), eof_tx)?)
    };

    let run_for = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    let shutdown = async move {
        let deadline = async {
            match run_for {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        let eof = async {
            match eof_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = setup_shutdown_signal() => warn!("Received shutdown signal, stopping sensors..."),
            _ = deadline => info!("Run duration elapsed"),
            _ = eof => info!("Control input closed"),
        }
    };

    info!(sensors = agent.sensors().len(), "Sensors running");
    let stats = agent.run(shutdown).await;

    if let Some(console) = console {
        console.abort();
    }

    info!(
        samples = stats.metrics.samples_published,
        duration_secs = stats.duration.as_secs_f64(),
        rate = format!("{:.2}", stats.samples_per_sec()),
        "Run completed"
    );
    stats.print_summary();

    agent.shutdown();
    info!("psensor-host finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
