//! WebSocket endpoint: upgrade, per-connection tasks, and the close path.
//!
//! Each terminal connection runs two concurrent halves:
//!
//! - **Writer**: owns the sink, drains the session's [`Outbound`] channel in
//!   order, and exits after writing a close frame.
//! - **Reader**: consumes frames from the terminal.  Pongs refresh the
//!   liveness flag; text is logged; a close frame or transport error ends it.
//!
//! Whichever half finishes first ends the session, and the close path in
//! [`close_session`] releases the registry entry.
//!
//! Authentication failures never reach the registry: the connection is
//! upgraded, sent a close frame with the rejection code, and dropped.

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use kasir_core::protocol::decode_inbound;
use kasir_core::TerminalId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::{close_session, ConnectParams, Handshake, Outbound, Session};
use crate::infrastructure::app_state::AppState;

/// `GET /` and `GET /ws` with an `Upgrade: websocket` header.
pub async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, params, state))
}

/// Runs one terminal connection from upgrade to close.
async fn run_session(socket: WebSocket, params: ConnectParams, state: AppState) {
    let mut handshake = Handshake::new();
    handshake.accept(params);

    let (mut ws_tx, mut ws_rx) = socket.split();

    let kasir_id = match handshake.authenticate(&state.verifier) {
        Ok(id) => id,
        Err(reason) => {
            let frame = CloseFrame {
                code: reason.close_code(),
                reason: reason.to_string().into(),
            };
            if let Err(e) = ws_tx.send(Message::Close(Some(frame))).await {
                debug!("failed to send rejection close frame: {e}");
            }
            return;
        }
    };

    // The writer starts before registration so the welcome is flushed as
    // soon as it is queued.
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let mut writer = tokio::spawn(write_loop(ws_tx, out_rx, kasir_id.clone()));

    let session = handshake
        .register(kasir_id, &state.registry, out_tx)
        .await
        .session;

    tokio::select! {
        exit = &mut writer => {
            debug!(kasir_id = %session.kasir_id(), ?exit, "writer finished");
        }
        _ = read_loop(&mut ws_rx, &session) => {
            debug!(kasir_id = %session.kasir_id(), "reader finished");
        }
    }

    writer.abort();
    close_session(&state.registry, &session).await;
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Why a writer task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriterExit {
    /// Every sender was dropped.
    ChannelClosed,
    /// A close frame was written.
    CloseSent,
    /// The transport rejected a frame.
    WriteFailed(String),
}

async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    kasir_id: TerminalId,
) -> WriterExit
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(command) = rx.recv().await {
        let (frame, last) = match command {
            Outbound::Text(text) => (Message::Text(text.into()), false),
            Outbound::Ping => (Message::Ping(Bytes::new()), false),
            Outbound::Close { code, reason } => {
                debug!(%kasir_id, code, "closing transport: {reason}");
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                (Message::Close(Some(frame)), true)
            }
        };

        if let Err(e) = sink.send(frame).await {
            warn!(%kasir_id, "write to Kasir {kasir_id} failed: {e}");
            return WriterExit::WriteFailed(e.to_string());
        }
        if last {
            return WriterExit::CloseSent;
        }
    }
    WriterExit::ChannelClosed
}

// ── Reader ────────────────────────────────────────────────────────────────────

async fn read_loop(ws_rx: &mut SplitStream<WebSocket>, session: &Session) {
    let kasir_id = session.kasir_id();

    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%kasir_id, "transport error: {e}");
                break;
            }
        };

        match frame {
            Message::Text(text) => match decode_inbound(text.as_str()) {
                // Terminals have no commands; inbound messages are only logged.
                Ok(value) => info!(%kasir_id, "received message from Kasir {kasir_id}: {value}"),
                Err(e) => warn!(%kasir_id, "ignoring malformed message: {e}"),
            },
            Message::Binary(data) => {
                warn!(%kasir_id, "unexpected binary frame ({} bytes, ignored)", data.len());
            }
            Message::Pong(_) => {
                session.mark_alive();
            }
            Message::Ping(_) => {
                // axum answers pings itself.
                debug!(%kasir_id, "ping from terminal");
            }
            Message::Close(frame) => {
                debug!(%kasir_id, ?frame, "terminal sent close");
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
