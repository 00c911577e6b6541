//! Infrastructure layer for leafysan-bridge.
//!
//! The infrastructure layer handles all I/O: the serial port, the dashboard
//! WebSocket server, the CSV archive and the settings file.
//!
//! # What does NOT belong here?
//!
//! - Frame decoding or setpoint encoding (that is `leafysan-core`)
//! - Request parsing and reply formatting (that is the application layer)
//! - Command-line parsing (that is done in `main.rs`)

pub mod archive_writer;
pub mod serial_conn;
pub mod settings;
pub mod ws_server;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::{info, warn};

use leafysan_core::{ChannelCodec, StateStore};

use crate::domain::config::BridgeConfig;
use archive_writer::ArchiveWriter;
use ws_server::DashboardContext;

pub use ws_server::run_server;

/// The State Store shared by the serial reader, the tick and every dashboard.
///
/// Each user takes the lock for one operation (apply a frame, snapshot the
/// values, update thresholds) so no reader ever sees a half-applied frame.
pub type SharedStore = Arc<RwLock<StateStore>>;

/// Opens the serial port and runs the bridge until `running` is cleared.
///
/// Spawns the serial reader and the setpoint tick, then serves dashboards on
/// the current task.
///
/// # Errors
///
/// Returns an error if the actuator shift is invalid, the serial port cannot
/// be opened, or the WebSocket listener cannot be bound.  Faults after
/// startup are logged and never end the bridge.
pub async fn run_bridge(config: BridgeConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let codec = ChannelCodec::new(config.actuator_shift).context("invalid protocol settings")?;
    let mut store = StateStore::new(codec, config.limits);
    let startup = store.set_thresholds(&config.initial_thresholds);
    for rejected in &startup.rejected {
        warn!("initial threshold ignored: {rejected}");
    }
    info!("initial thresholds: {:?}", store.thresholds());
    let store: SharedStore = Arc::new(RwLock::new(store));

    let port = serial_conn::open(&config.serial_port, config.baud_rate)?;
    info!(
        "serial port {} open at {} baud",
        config.serial_port, config.baud_rate
    );
    let (reader, writer) = tokio::io::split(port);

    let archive = ArchiveWriter::new(&config.data_dir);
    if config.write_data {
        info!("archiving readings to {}", archive.dir().display());
    }

    let reader_task = tokio::spawn(serial_conn::read_frames(reader, Arc::clone(&store)));
    let tick_task = tokio::spawn(serial_conn::run_tick(
        writer,
        Arc::clone(&store),
        config.write_data.then(|| archive.clone()),
        config.tick_interval,
        Arc::clone(&running),
    ));

    let ctx = Arc::new(DashboardContext {
        store,
        archive,
        brightness_band: config.brightness_display,
    });
    let served = run_server(config.ws_bind_addr, ctx, Arc::clone(&running)).await;

    // Stop the tick if the server ended on its own (bind failure).
    running.store(false, Ordering::Relaxed);
    if let Err(e) = tick_task.await {
        warn!("setpoint tick task failed: {e}");
    }
    reader_task.abort();

    served
}
