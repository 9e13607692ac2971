//! Stdin control console
//!
//! Each line is `<path> [value]`:
//!
//! ```text
//! temp/enable true
//! temp/period 2.5
//! temp/trigger
//! list
//! ```

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use contracts::{ControlValue, DataType, Timestamp};
use data_hub::{DataHub, Direction};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Push a control value into an output
    Deliver { path: String, value: ControlValue },
    /// Print every resource
    List,
    /// Print usage
    Help,
    /// Blank line or `#` comment
    Nothing,
}

/// Parse one line; `lookup` gives the data type of a hub output
pub fn parse_line(
    line: &str,
    lookup: impl Fn(&str) -> Option<DataType>,
) -> Result<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleCommand::Nothing);
    }

    let mut parts = line.split_whitespace();
    let path = parts.next().unwrap_or_default();
    let arg = parts.next();
    if parts.next().is_some() {
        bail!("expected '<path> [value]', got '{line}'");
    }

    match (path, arg) {
        ("list" | "ls", None) => return Ok(ConsoleCommand::List),
        ("help" | "?", None) => return Ok(ConsoleCommand::Help),
        _ => {}
    }

    let Some(data_type) = lookup(path) else {
        bail!("no control output at '{path}'");
    };

    let value = match (data_type, arg) {
        (DataType::Trigger, None) => ControlValue::Trigger,
        (DataType::Trigger, Some(_)) => bail!("'{path}' is a trigger and takes no value"),
        (_, None) => bail!("'{path}' needs a {data_type} value"),
        (DataType::Boolean, Some(raw)) => ControlValue::Boolean(parse_bool(raw)?),
        (DataType::Numeric, Some(raw)) => ControlValue::Numeric(
            raw.parse()
                .with_context(|| format!("'{raw}' is not a number"))?,
        ),
        (other, Some(_)) => bail!("'{path}' is a {other} resource and cannot be driven"),
    };

    Ok(ConsoleCommand::Deliver {
        path: path.to_string(),
        value,
    })
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => bail!("'{raw}' is not a boolean"),
    }
}

/// Data type of an output resource on `hub`
fn output_type(hub: &DataHub, path: &str) -> Option<DataType> {
    hub.resource(path)
        .filter(|info| info.direction == Direction::Output)
        .map(|info| info.data_type)
}

/// Execute one line against `hub`
pub fn execute(hub: &DataHub, line: &str) -> Result<()> {
    match parse_line(line, |path| output_type(hub, path))? {
        ConsoleCommand::Deliver { path, value } => {
            let handlers = hub.deliver(&path, Timestamp::NOW, value)?;
            debug!(path = %path, ?value, handlers, "control value delivered");
        }
        ConsoleCommand::List => {
            for info in hub.resources() {
                println!(
                    "{:<32} {:<6} {:<8} {}",
                    info.path,
                    format!("{:?}", info.direction).to_lowercase(),
                    info.data_type.to_string(),
                    info.units
                );
            }
        }
        ConsoleCommand::Help => {
            println!("<path> [value]   push a control value, e.g. 'temp/period 2.5'");
            println!("list             show every resource");
        }
        ConsoleCommand::Nothing => {}
    }
    Ok(())
}

/// Feed lines to `hub` until the sender side closes
pub async fn console_loop(
    hub: Arc<DataHub>,
    mut lines: mpsc::Receiver<String>,
    eof: Option<oneshot::Sender<()>>,
) {
    while let Some(line) = lines.recv().await {
        if let Err(e) = execute(&hub, &line) {
            warn!(line = %line.trim(), error = %e, "control line rejected");
        }
    }

    info!("stdin closed");
    if let Some(eof) = eof {
        let _ = eof.send(());
    }
}

/// Read stdin on a dedicated thread and run the console loop.
///
/// A blocking read never holds up runtime shutdown: the reader thread is
/// detached and dies with the process.
pub fn spawn(hub: Arc<DataHub>, eof: Option<oneshot::Sender<()>>) -> Result<JoinHandle<()>> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("stdin-console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn stdin reader")?;

    Ok(tokio::spawn(console_loop(hub, rx, eof)))
}
