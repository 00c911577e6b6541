//! WebSocket server: accept loop and per-dashboard session handling.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from dashboards.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Answering each JSON request with at most one JSON reply.
//! 5. Gracefully shutting down when the `running` flag is cleared.
//!
//! # Concurrency
//!
//! Each dashboard runs in its own Tokio task.  All sessions share one
//! [`DashboardContext`]; the State Store lock is held for a single read or
//! update, never across a network write.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::archive::{archive_date, downsample, MAX_ARCHIVE_ROWS};
use crate::application::dashboard_service::{
    parse_request, threshold_candidate, thresholds_response, values_response,
};
use crate::domain::display::DisplayRange;
use crate::domain::messages::{DashboardRequest, DashboardResponse};
use crate::infrastructure::archive_writer::ArchiveWriter;
use crate::infrastructure::SharedStore;

/// Everything a dashboard session needs to answer requests.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub store: SharedStore,
    pub archive: ArchiveWriter,
    pub brightness_band: DisplayRange,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `addr` and serves dashboards until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(
    addr: SocketAddr,
    ctx: Arc<DashboardContext>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;

    info!("dashboard WebSocket server listening on {addr}");
    serve(listener, ctx, running).await;
    Ok(())
}

/// Accept loop over an already-bound listener.
///
/// `accept()` is polled with a 200 ms timeout so the loop notices a cleared
/// `running` flag even when no dashboard is connecting.
pub async fn serve(listener: TcpListener, ctx: Arc<DashboardContext>, running: Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new dashboard connection from {peer_addr}");
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    handle_dashboard_session(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g., too many open file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout: loop back to check the `running` flag.
            }
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_dashboard_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<DashboardContext>,
) {
    match run_session(raw_stream, peer_addr, ctx).await {
        Ok(()) => info!("dashboard {peer_addr} disconnected"),
        Err(e) => warn!("dashboard {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs one dashboard session: handshake, then request/reply until close.
///
/// # Errors
///
/// Returns an error if the WebSocket handshake fails or a reply cannot be
/// sent.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<DashboardContext>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let session_id = Uuid::new_v4();
    info!("dashboard session {session_id} established with {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    while let Some(frame) = ws_rx.next().await {
        let ws_msg = match frame {
            Ok(msg) => msg,
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                debug!("session {session_id}: dashboard WebSocket closed");
                break;
            }
            Err(e) => {
                warn!("session {session_id}: dashboard WebSocket error: {e}");
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(text) => {
                let Some(reply) = handle_text(&ctx, session_id, &text).await else {
                    continue;
                };
                match serde_json::to_string(&reply) {
                    Ok(json) => ws_tx
                        .send(WsMessage::Text(json))
                        .await
                        .with_context(|| format!("session {session_id}: reply send failed"))?,
                    Err(e) => error!("session {session_id}: JSON serialization error: {e}"),
                }
            }
            WsMessage::Binary(_) => {
                warn!("session {session_id}: unexpected binary WebSocket frame (ignored)");
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            WsMessage::Close(_) => {
                debug!("session {session_id}: Close frame received");
                break;
            }
        }
    }

    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Answers one text frame.
///
/// Returns `None` for frames that are not a valid request; those are logged
/// and the session carries on.
pub async fn handle_text(
    ctx: &DashboardContext,
    session_id: Uuid,
    text: &str,
) -> Option<DashboardResponse> {
    let request = match parse_request(text) {
        Ok(r) => r,
        Err(e) => {
            warn!("session {session_id}: {e}");
            return None;
        }
    };
    debug!("session {session_id}: {} request", request.type_name());

    let reply = match request {
        DashboardRequest::Values => {
            let values = ctx.store.read().await.current_values();
            values_response(&values, &ctx.brightness_band)
        }

        DashboardRequest::Archive { date } => {
            let day = archive_date(date, Local::now().date_naive());
            let archive = ctx.archive.clone();
            // A full day is tens of thousands of rows; keep file I/O off the
            // async workers.
            let read = tokio::task::spawn_blocking(move || {
                archive
                    .read_day(day)
                    .map(|text| text.map(|t| downsample(&t, MAX_ARCHIVE_ROWS)))
            })
            .await;
            let data = match read {
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => {
                    debug!("session {session_id}: no archive for {day}");
                    String::new()
                }
                Ok(Err(e)) => {
                    warn!("session {session_id}: {e}");
                    String::new()
                }
                Err(e) => {
                    error!("session {session_id}: archive read task failed: {e}");
                    String::new()
                }
            };
            DashboardResponse::Archive { data }
        }

        DashboardRequest::Thresholds { data } => {
            let candidate = threshold_candidate(&data);
            let (update, thresholds) = {
                let mut store = ctx.store.write().await;
                let update = store.set_thresholds(&candidate);
                (update, store.thresholds())
            };
            for rejected in &update.rejected {
                warn!("session {session_id}: threshold rejected: {rejected}");
            }
            if !update.accepted.is_empty() {
                info!("session {session_id}: thresholds now {thresholds:?}");
            }
            thresholds_response(&thresholds)
        }
    };

    Some(reply)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use leafysan_core::{DecodeEvent, FrameDecoder, StateStore};
    use tokio::sync::RwLock;
    use tokio_tungstenite::connect_async;

    fn context(dir_name: &str) -> DashboardContext {
        DashboardContext {
            store: Arc::new(RwLock::new(StateStore::default())),
            archive: ArchiveWriter::new(
                std::env::temp_dir().join(format!("leafysan-ws-{dir_name}-{}", Uuid::new_v4())),
            ),
            brightness_band: DisplayRange::default(),
        }
    }

    async fn feed(ctx: &DashboardContext, bytes: &[u8]) {
        for event in FrameDecoder::new().feed_slice(bytes) {
            if let DecodeEvent::Parsed(frame) = event {
                ctx.store.write().await.apply_frame(&frame);
            }
        }
    }

    // ── handle_text ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_values_request_returns_latest_brightness() {
        // Arrange
        let ctx = context("values");
        feed(&ctx, &[0x40, 0x84, 0x85, 0x86, 0x3F]).await;

        // Act
        let reply = handle_text(&ctx, Uuid::new_v4(), r#"{"type":"values"}"#).await;

        // Assert
        match reply {
            Some(DashboardResponse::Values { data }) => assert_eq!(data.brightness, 4177),
            other => panic!("expected values reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_json_yields_no_reply() {
        let ctx = context("bad");
        assert!(handle_text(&ctx, Uuid::new_v4(), "][").await.is_none());
        assert!(handle_text(&ctx, Uuid::new_v4(), r#"{"type":"nope"}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_thresholds_request_updates_store_and_echoes() {
        // Arrange
        let ctx = context("thresholds");
        let text = r#"{"type":"thresholds","data":{"temperature":31,"moisture":"42.5","brightness":800}}"#;

        // Act
        let reply = handle_text(&ctx, Uuid::new_v4(), text).await;

        // Assert: temperature out of range, the others accepted
        let t = ctx.store.read().await.thresholds();
        assert_eq!(t.temperature_tenths, 210);
        assert_eq!(t.moisture_tenths, 425);
        assert_eq!(t.brightness, 800);
        assert_eq!(reply, Some(thresholds_response(&t)));
    }

    #[tokio::test]
    async fn test_archive_request_for_missing_day_is_empty() {
        let ctx = context("archive-missing");
        let reply = handle_text(&ctx, Uuid::new_v4(), r#"{"type":"archive","date":86400000}"#).await;
        assert_eq!(
            reply,
            Some(DashboardResponse::Archive {
                data: String::new()
            })
        );
    }

    #[tokio::test]
    async fn test_archive_request_returns_todays_rows() {
        // Arrange: write one row for today
        let ctx = context("archive-today");
        let now = Local::now().naive_local();
        ctx.archive.append(now, &Default::default()).unwrap();

        // Act: no date means today
        let reply = handle_text(&ctx, Uuid::new_v4(), r#"{"type":"archive"}"#).await;

        // Assert
        match reply {
            Some(DashboardResponse::Archive { data }) => {
                assert!(data.starts_with("time,temperature,"));
                assert_eq!(data.lines().count(), 2);
            }
            other => panic!("expected archive reply, got {other:?}"),
        }
        std::fs::remove_dir_all(ctx.archive.dir()).unwrap();
    }

    // ── end to end over a real socket ────────────────────────────────────────

    #[tokio::test]
    async fn test_dashboard_round_trip_over_websocket() {
        // Arrange: serve on an ephemeral port
        let ctx = Arc::new(context("e2e"));
        feed(&ctx, &[0x40, 0x84, 0x85, 0x86, 0x3F]).await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let server = tokio::spawn(serve(listener, Arc::clone(&ctx), Arc::clone(&running)));

        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();

        // Act: garbage first, then a real request on the same session
        ws.send(WsMessage::Text("not json".to_string())).await.unwrap();
        ws.send(WsMessage::Text(r#"{"type":"values"}"#.to_string()))
            .await
            .unwrap();
        let reply = loop {
            match ws.next().await {
                Some(Ok(WsMessage::Text(t))) => break t,
                Some(Ok(_)) => continue,
                other => panic!("connection ended early: {other:?}"),
            }
        };

        // Assert
        let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(json["type"], "values");
        assert_eq!(json["data"]["brightness"], 4177);

        // Shut down
        ws.close(None).await.unwrap();
        running.store(false, Ordering::Relaxed);
        server.await.unwrap();
    }
}
