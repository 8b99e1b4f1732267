//! WebSocket upgrade handler and per-connection session task

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::SessionManager;
use crate::ws::protocol::{ClientAction, ServerMsg};

type WsSink = futures::stream::SplitSink<WebSocket, Message>;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_failed_upgrade(|e| {
        warn!(error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(state.config.game.outbound_buffer);

    let player_id = match state.sessions.on_connect(outbound_tx) {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Failed to register player");
            return;
        }
    };

    // The id goes out before any snapshot; snapshots queue up meanwhile
    let welcome = ServerMsg::Welcome { id: player_id };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        warn!(player_id = %player_id, error = %e, "Failed to send welcome");
        state.sessions.on_disconnect(player_id);
        return;
    }

    run_session(player_id, &state.sessions, ws_sink, ws_stream, outbound_rx).await;

    state.sessions.on_disconnect(player_id);
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Client closed, sent garbage, or the read side errored
    ReaderDone,
    /// The socket rejected a write
    WriterFailed,
    /// The world dropped this player's outbound queue
    QueueClosed,
}

/// Run the session with read/write split. Whichever half finishes first ends
/// the session; the other half is dropped with it.
async fn run_session<S, W>(
    player_id: Uuid,
    sessions: &SessionManager,
    ws_sink: W,
    ws_stream: S,
    outbound_rx: mpsc::Receiver<Arc<str>>,
) -> SessionEnd
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let end = tokio::select! {
        end = write_loop(player_id, ws_sink, outbound_rx) => end,
        () = read_loop(player_id, sessions, ws_stream) => SessionEnd::ReaderDone,
    };
    debug!(player_id = %player_id, end = ?end, "Session ended");
    end
}

/// Writer: queued snapshots -> WebSocket
async fn write_loop<W>(
    player_id: Uuid,
    mut ws_sink: W,
    mut outbound_rx: mpsc::Receiver<Arc<str>>,
) -> SessionEnd
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbound_rx.recv().await {
        if let Err(e) = ws_sink.send(Message::Text(frame.to_string())).await {
            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
            return SessionEnd::WriterFailed;
        }
    }
    SessionEnd::QueueClosed
}

/// Reader: WebSocket -> world
async fn read_loop<S>(player_id: Uuid, sessions: &SessionManager, mut ws_stream: S)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(result) = ws_stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "WebSocket read failed");
                return;
            }
        };

        match decode_frame(message) {
            Ok(Frame::Action(action)) => {
                let outcome = sessions.on_message(player_id, &action);
                trace!(
                    player_id = %player_id,
                    moved = outcome.moved,
                    fired = ?outcome.fired,
                    "Action applied"
                );
            }
            Ok(Frame::Control) => {
                debug!(player_id = %player_id, "Control frame");
            }
            Ok(Frame::Close) => {
                info!(player_id = %player_id, "Client initiated close");
                return;
            }
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Undecodable client message");
                return;
            }
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, PartialEq)]
enum Frame {
    Action(ClientAction),
    Control,
    Close,
}

fn decode_frame(message: Message) -> Result<Frame, serde_json::Error> {
    match message {
        Message::Text(text) => serde_json::from_str(&text).map(Frame::Action),
        Message::Binary(bytes) => serde_json::from_slice(&bytes).map(Frame::Action),
        Message::Ping(_) | Message::Pong(_) => Ok(Frame::Control),
        Message::Close(_) => Ok(Frame::Close),
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
