//! Serial link to the greenhouse controller.
//!
//! Two halves run as independent Tokio tasks over one port:
//!
//! - **Reader** ([`read_frames`]): feeds every received byte to the
//!   [`FrameDecoder`] and applies each parsed frame to the State Store.
//! - **Setpoint tick** ([`run_tick`]): once per period, writes the encoded
//!   thresholds to the controller and, when enabled, appends an archive row.
//!
//! # Why a decoder and not a buffer?
//!
//! A serial `read()` may return part of a frame, several frames, or line
//! noise between frames.  The decoder is a byte-at-a-time state machine, so
//! read boundaries never matter and nothing has to be buffered here.
//!
//! Both halves are generic over `AsyncRead` / `AsyncWrite` so tests can drive
//! them with scripted mock streams instead of a real port.

use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, MissedTickBehavior};
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};
use tracing::{debug, error, info, trace, warn};

use leafysan_core::{encode_setpoints, DecodeEvent, FrameDecoder, Thresholds};

use crate::infrastructure::archive_writer::ArchiveWriter;
use crate::infrastructure::SharedStore;

// ── Port discovery and opening ────────────────────────────────────────────────

/// USB identity strings reported for a port, when the OS knows them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsbDetails {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

/// One available serial port, as printed by `--list-serial-ports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescription {
    pub name: String,
    pub usb: Option<UsbDetails>,
}

impl fmt::Display for PortDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let Some(usb) = &self.usb else {
            return Ok(());
        };
        let label: Vec<&str> = [&usb.manufacturer, &usb.product]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .collect();
        if !label.is_empty() {
            write!(f, " ({})", label.join(" "))?;
        }
        if let Some(sn) = &usb.serial_number {
            write!(f, " [serial {sn}]")?;
        }
        Ok(())
    }
}

/// Lists the serial ports present on this machine.
///
/// # Errors
///
/// Returns an error if the OS port enumeration fails.
pub fn list_ports() -> anyhow::Result<Vec<PortDescription>> {
    let ports = tokio_serial::available_ports().context("failed to enumerate serial ports")?;
    Ok(ports
        .into_iter()
        .map(|p| PortDescription {
            name: p.port_name,
            usb: match p.port_type {
                SerialPortType::UsbPort(info) => Some(UsbDetails {
                    manufacturer: info.manufacturer,
                    product: info.product,
                    serial_number: info.serial_number,
                }),
                _ => None,
            },
        })
        .collect())
}

/// Opens `path` at `baud_rate`, 8 data bits, no parity, one stop bit, no
/// flow control.
///
/// # Errors
///
/// Returns an error if the device does not exist or cannot be opened.
pub fn open(path: &str, baud_rate: u32) -> anyhow::Result<SerialStream> {
    tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .with_context(|| format!("failed to open serial port {path} at {baud_rate} baud"))
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Frame counts from one run of [`read_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderStats {
    /// Frames applied to the State Store.
    pub frames: u64,
    /// End markers that closed an empty frame.
    pub invalid: u64,
}

/// Reads the controller's byte stream until EOF or a read error.
///
/// Each parsed frame is applied under a write lock held for that one frame,
/// so a concurrent values request sees either the old or the new readings,
/// never a mix.  Invalid datasets are logged and leave the store untouched.
///
/// Returning does not stop the bridge: dashboards keep receiving the last
/// known state.
pub async fn read_frames<R>(mut reader: R, store: SharedStore) -> ReaderStats
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut stats = ReaderStats::default();
    let mut buf = [0u8; 256];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                error!("serial port closed (EOF); no further readings will arrive");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!("serial read failed: {e}; no further readings will arrive");
                break;
            }
        };
        trace!("serial: {n} bytes received");

        for event in decoder.feed_slice(&buf[..n]) {
            match event {
                DecodeEvent::Parsed(frame) => {
                    let update = store.write().await.apply_frame(&frame);
                    stats.frames += 1;
                    debug!("frame applied: {update:?}");
                }
                DecodeEvent::InvalidDataset => {
                    stats.invalid += 1;
                    warn!("invalid dataset: end marker closed an empty frame");
                }
            }
        }
    }

    info!(
        "serial reader stopped after {} frames ({} invalid)",
        stats.frames, stats.invalid
    );
    stats
}

// ── Setpoint tick ─────────────────────────────────────────────────────────────

/// Writes one encoded setpoint frame.
///
/// # Errors
///
/// Returns the underlying I/O error if the write or flush fails.
pub async fn write_setpoints<W>(writer: &mut W, thresholds: &Thresholds) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_setpoints(thresholds)).await?;
    writer.flush().await
}

/// One tick: push the current thresholds, then archive the current readings.
///
/// The archive row is written on the blocking pool.  Failures are logged; the
/// next tick simply tries again.
pub async fn tick_once<W>(writer: &mut W, store: &SharedStore, archive: Option<&ArchiveWriter>)
where
    W: AsyncWrite + Unpin,
{
    let (thresholds, values) = {
        let store = store.read().await;
        (store.thresholds(), store.current_values())
    };

    if let Err(e) = write_setpoints(writer, &thresholds).await {
        error!("failed to write setpoints to controller: {e}");
    } else {
        trace!("setpoints written: {thresholds:?}");
    }

    if let Some(archive) = archive {
        let archive = archive.clone();
        let now = Local::now().naive_local();
        // File I/O stays off the async workers; a slow disk only delays rows.
        let appended = tokio::task::spawn_blocking(move || archive.append(now, &values)).await;
        match appended {
            Ok(Ok(path)) => trace!("archive row appended to {}", path.display()),
            Ok(Err(e)) => warn!("{e}"),
            Err(e) => error!("archive append task failed: {e}"),
        }
    }
}

/// Runs [`tick_once`] every `period` until `running` is cleared.
///
/// The first tick fires immediately so the controller receives setpoints as
/// soon as the port is open.
pub async fn run_tick<W>(
    mut writer: W,
    store: SharedStore,
    archive: Option<ArchiveWriter>,
    period: Duration,
    running: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !running.load(Ordering::Relaxed) {
            debug!("shutdown flag set; stopping setpoint tick");
            break;
        }
        tick_once(&mut writer, &store, archive.as_ref()).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use leafysan_core::{StateStore, ThresholdCandidate};
    use tokio::sync::RwLock;
    use tokio_test::io::Builder;

    fn shared() -> SharedStore {
        Arc::new(RwLock::new(StateStore::default()))
    }

    // ── read_frames ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_reader_applies_frame_split_across_reads() {
        // Arrange: one frame delivered in two chunks
        let mock = Builder::new()
            .read(&[0x40, 0x84])
            .read(&[0x85, 0x86, 0x3F])
            .build();
        let store = shared();

        // Act
        let stats = read_frames(mock, Arc::clone(&store)).await;

        // Assert
        assert_eq!(stats, ReaderStats { frames: 1, invalid: 0 });
        assert_eq!(store.read().await.current_values().brightness, 4177);
    }

    #[tokio::test]
    async fn test_reader_counts_invalid_dataset_without_mutation() {
        let mock = Builder::new().read(&[0x40, 0x3F]).build();
        let store = shared();

        let stats = read_frames(mock, Arc::clone(&store)).await;

        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.frames, 0);
        assert_eq!(
            store.read().await.current_values(),
            leafysan_core::ChannelValues::default()
        );
    }

    #[tokio::test]
    async fn test_reader_stops_on_read_error_and_keeps_state() {
        // Arrange: a good frame, then the device disappears
        let mock = Builder::new()
            .read(&[0x40, 0x84, 0x85, 0x86, 0x3F])
            .read_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))
            .build();
        let store = shared();

        // Act
        let stats = read_frames(mock, Arc::clone(&store)).await;

        // Assert: the reader returned instead of panicking, last state intact
        assert_eq!(stats.frames, 1);
        assert_eq!(store.read().await.current_values().brightness, 4177);
    }

    // ── setpoint tick ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_write_setpoints_sends_encoded_frame() {
        // Arrange
        let t = Thresholds::default();
        let mut mock = Builder::new().write(&encode_setpoints(&t)).build();

        // Act / Assert: the mock panics on any unexpected byte
        write_setpoints(&mut mock, &t).await.unwrap();
    }

    #[tokio::test]
    async fn test_tick_sends_latest_thresholds() {
        // Arrange: a dashboard raised the temperature setpoint
        let store = shared();
        store.write().await.set_thresholds(&ThresholdCandidate {
            temperature: Some(25.5),
            ..Default::default()
        });
        let expected = encode_setpoints(&store.read().await.thresholds());
        let mut mock = Builder::new().write(&expected).build();

        // Act
        tick_once(&mut mock, &store, None).await;
    }

    #[tokio::test]
    async fn test_tick_survives_write_error() {
        let store = shared();
        let mut mock = Builder::new()
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))
            .build();

        // Must log and return rather than panic.
        tick_once(&mut mock, &store, None).await;
    }

    #[tokio::test]
    async fn test_tick_appends_archive_row() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("leafysan-tick-{}", uuid::Uuid::new_v4()));
        let archive = ArchiveWriter::new(&dir);
        let store = shared();
        let mut mock = Builder::new()
            .write(&encode_setpoints(&Thresholds::default()))
            .build();

        // Act
        tick_once(&mut mock, &store, Some(&archive)).await;

        // Assert
        let today = Local::now().date_naive();
        let text = archive.read_day(today).unwrap().unwrap_or_default();
        // The clock may have crossed midnight between the tick and the read.
        if !text.is_empty() {
            assert_eq!(text.lines().count(), 2);
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_tick_survives_archive_failure() {
        // Arrange: the archive directory path is an existing regular file
        let blocker =
            std::env::temp_dir().join(format!("leafysan-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"").unwrap();
        let archive = ArchiveWriter::new(&blocker);
        let store = shared();
        let mut mock = Builder::new()
            .write(&encode_setpoints(&Thresholds::default()))
            .build();

        // Act: the setpoints still go out and the failed append is only logged
        tick_once(&mut mock, &store, Some(&archive)).await;

        // Assert
        assert!(blocker.is_file());
        std::fs::remove_file(blocker).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_tick_sends_setpoints_every_period() {
        // Arrange: ticks at t = 0 s, 1 s and 2 s, each one frame
        let frame = encode_setpoints(&Thresholds::default());
        let mock = Builder::new()
            .write(&frame)
            .write(&frame)
            .write(&frame)
            .build();
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let task = tokio::spawn(run_tick(
            mock,
            shared(),
            None,
            Duration::from_secs(1),
            Arc::clone(&running),
        ));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        running.store(false, Ordering::Relaxed);

        // Assert: the t = 3 s tick sees the cleared flag and writes nothing;
        // the mock panics on a missing or extra frame
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_tick_does_nothing_after_shutdown() {
        // Arrange: the flag is already cleared and the mock expects no writes
        let mock = Builder::new().build();
        let running = Arc::new(AtomicBool::new(false));

        // Act: must return promptly
        run_tick(
            mock,
            shared(),
            None,
            Duration::from_millis(10),
            running,
        )
        .await;
    }

    // ── port descriptions ────────────────────────────────────────────────────

    #[test]
    fn test_port_description_plain() {
        let p = PortDescription {
            name: "/dev/ttyS0".to_string(),
            usb: None,
        };
        assert_eq!(p.to_string(), "/dev/ttyS0");
    }

    #[test]
    fn test_port_description_with_usb_details() {
        let p = PortDescription {
            name: "/dev/ttyUSB0".to_string(),
            usb: Some(UsbDetails {
                manufacturer: Some("FTDI".to_string()),
                product: Some("FT232R USB UART".to_string()),
                serial_number: Some("A50285BI".to_string()),
            }),
        };
        assert_eq!(
            p.to_string(),
            "/dev/ttyUSB0 (FTDI FT232R USB UART) [serial A50285BI]"
        );
    }
}
