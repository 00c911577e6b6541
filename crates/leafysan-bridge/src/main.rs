//! Leafysan greenhouse bridge: entry point.
//!
//! This binary sits between a greenhouse controller on a serial port and any
//! number of browser dashboards on WebSocket.  It decodes the controller's
//! bit-packed frames into readings, serves them as JSON, and pushes the
//! dashboards' threshold setpoints back to the controller once per tick.
//!
//! # Usage
//!
//! ```text
//! leafysan-bridge [OPTIONS]
//!
//! Options:
//!   -l, --list-serial-ports     Print available serial ports and exit
//!   -s, --serial-port <PATH>    Serial device [default: /dev/ttyUSB0]
//!   -b, --baud-rate <BAUD>      Serial speed [default: 115200]
//!   -d, --write-data            Append readings to the daily CSV archive
//!       --data-dir <DIR>        Archive directory [default: data]
//!       --ws-bind <IP>          WebSocket bind address [default: 0.0.0.0]
//!       --ws-port <PORT>        WebSocket port [default: 8080]
//!       --tick-ms <MS>          Setpoint tick period [default: 1000]
//!   -c, --config <FILE>         Optional TOML settings file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Default        | Description                  |
//! |-------------------------|----------------|------------------------------|
//! | `LEAFYSAN_SERIAL_PORT`  | `/dev/ttyUSB0` | Serial device                |
//! | `LEAFYSAN_BAUD_RATE`    | `115200`       | Serial speed                 |
//! | `LEAFYSAN_WRITE_DATA`   | off            | Enable the CSV archive       |
//! | `LEAFYSAN_DATA_DIR`     | `data`         | Archive directory            |
//! | `LEAFYSAN_WS_BIND`      | `0.0.0.0`      | WebSocket bind address       |
//! | `LEAFYSAN_WS_PORT`      | `8080`         | WebSocket port               |
//! | `LEAFYSAN_TICK_MS`      | `1000`         | Setpoint tick period (ms)    |
//! | `LEAFYSAN_CONFIG`       | none           | TOML settings file           |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leafysan_bridge::domain::BridgeConfig;
use leafysan_bridge::infrastructure::serial_conn::list_ports;
use leafysan_bridge::infrastructure::settings::load_settings;
use leafysan_bridge::infrastructure::run_bridge;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Leafysan greenhouse bridge.
///
/// Relays controller readings to browser dashboards and dashboard setpoints
/// back to the controller.
#[derive(Debug, Parser)]
#[command(
    name = "leafysan-bridge",
    about = "Serial-to-WebSocket bridge for the Leafysan greenhouse controller",
    version
)]
struct Cli {
    /// Print the available serial ports and exit.
    #[arg(short = 'l', long)]
    list_serial_ports: bool,

    /// Serial device the controller is attached to.
    #[arg(short = 's', long, default_value = "/dev/ttyUSB0", env = "LEAFYSAN_SERIAL_PORT")]
    serial_port: String,

    /// Serial line speed (8N1, no flow control).
    #[arg(short = 'b', long, default_value_t = 115_200, env = "LEAFYSAN_BAUD_RATE")]
    baud_rate: u32,

    /// Append one row per tick to the daily CSV archive.
    #[arg(short = 'd', long, env = "LEAFYSAN_WRITE_DATA")]
    write_data: bool,

    /// Directory holding the daily archive files.
    #[arg(long, default_value = "data", env = "LEAFYSAN_DATA_DIR")]
    data_dir: PathBuf,

    /// IP address to bind the WebSocket server to.
    ///
    /// Use `0.0.0.0` to accept dashboards from any network interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "LEAFYSAN_WS_BIND")]
    ws_bind: String,

    /// TCP port for the WebSocket server to listen on.
    #[arg(long, default_value_t = 8080, env = "LEAFYSAN_WS_PORT")]
    ws_port: u16,

    /// Setpoint tick period in milliseconds.
    #[arg(long, default_value_t = 1000, env = "LEAFYSAN_TICK_MS")]
    tick_ms: u64,

    /// Optional TOML settings file (protocol, thresholds, limits, display).
    #[arg(short = 'c', long, env = "LEAFYSAN_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI arguments (and the settings file, if any)
    /// into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--ws-bind` is not a valid IP address, the tick
    /// period is zero, or the settings file cannot be loaded.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let ws_bind_addr: SocketAddr = format!("{}:{}", self.ws_bind, self.ws_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid WebSocket bind address: '{}:{}'",
                    self.ws_bind, self.ws_port
                )
            })?;

        if self.tick_ms == 0 {
            anyhow::bail!("--tick-ms must be greater than zero");
        }

        let mut config = BridgeConfig {
            serial_port: self.serial_port,
            baud_rate: self.baud_rate,
            write_data: self.write_data,
            data_dir: self.data_dir,
            ws_bind_addr,
            tick_interval: Duration::from_millis(self.tick_ms),
            ..BridgeConfig::default()
        };

        if let Some(path) = &self.config {
            let settings = load_settings(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            settings.apply_to(&mut config)?;
        }

        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` sets the level.
/// 2. CLI arguments are parsed; `--list-serial-ports` prints and exits.
/// 3. A [`BridgeConfig`] is built from the arguments and settings file.
/// 4. A Ctrl+C handler clears a shared `AtomicBool`.
/// 5. [`run_bridge`] opens the serial port and serves dashboards until the
///    flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_serial_ports {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("no serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let config = cli.into_bridge_config()?;

    info!(
        "Leafysan bridge starting: serial={} @ {} baud, ws={}, archive={}",
        config.serial_port,
        config.baud_rate,
        config.ws_bind_addr,
        if config.write_data { "on" } else { "off" }
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    //
    // The accept loop checks this flag every 200 ms and the setpoint tick
    // checks it on every tick.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_bridge(config, running).await?;

    info!("Leafysan bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
