//! WebSocket session loop.
//!
//! One task owns one socket and processes frames strictly in order:
//! read, decode, dispatch, reply. The loop ends on the first protocol
//! error, transport error, or peer close, and the socket is closed with a
//! code that matches the reason before it is released.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures_util::{FutureExt, SinkExt};

use super::dispatch::Dispatcher;
use super::messages::{Command, Reply, decode_command, encode_reply};
use crate::error::{ProtocolError, TransportError};

/// How long to wait for the peer to answer our close frame.
pub const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The peer sent a close frame, with its status code if any.
    PeerClosed(Option<u16>),
    /// A frame could not be decoded, or a reply could not be encoded.
    Protocol(ProtocolError),
    /// Reading or writing the socket failed.
    Transport(TransportError),
    /// Dispatch panicked.
    Panicked,
}

impl SessionEnd {
    /// Returns `true` for a peer close with status 1000.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::PeerClosed(Some(close_code::NORMAL)))
    }

    /// Close code to send, or `None` when the peer already started the
    /// handshake and only our reply is outstanding.
    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        match self {
            Self::PeerClosed(_) => None,
            Self::Protocol(e) => Some(e.close_code()),
            Self::Transport(_) => Some(close_code::NORMAL),
            Self::Panicked => Some(close_code::ERROR),
        }
    }

    fn log(&self) {
        match self {
            Self::PeerClosed(Some(close_code::NORMAL)) => {
                tracing::info!("client closed the connection");
            }
            Self::PeerClosed(code) => tracing::warn!(?code, "client closed abnormally"),
            Self::Protocol(e) => tracing::warn!(error = %e, "protocol error"),
            Self::Transport(e) => tracing::warn!(error = %e, "transport error"),
            Self::Panicked => tracing::error!("dispatch panicked; closing with internal error"),
        }
    }
}

/// Runs one session to completion and closes the socket.
///
/// Panics raised while handling a message are caught here so the peer
/// still receives a close frame.
pub async fn run_session(mut socket: WebSocket, dispatcher: Dispatcher) -> SessionEnd {
    tracing::info!("session opened");

    let end = AssertUnwindSafe(message_loop(&mut socket, &dispatcher))
        .catch_unwind()
        .await
        .unwrap_or(SessionEnd::Panicked);

    end.log();
    close(&mut socket, &end).await;
    tracing::debug!("session closed");
    end
}

async fn message_loop(socket: &mut WebSocket, dispatcher: &Dispatcher) -> SessionEnd {
    loop {
        let command = match next_command(socket).await {
            Ok(command) => command,
            Err(end) => return end,
        };
        tracing::debug!(action = %command.action, key = %command.data.key, "received message");

        let reply = dispatcher.dispatch(&command).await;
        if let Err(end) = send_reply(socket, &reply).await {
            return end;
        }
    }
}

/// Waits for the next data frame, skipping control frames.
async fn next_command(socket: &mut WebSocket) -> Result<Command, SessionEnd> {
    loop {
        let frame = match socket.recv().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(SessionEnd::Transport(TransportError::Read(e))),
            None => return Err(SessionEnd::Transport(TransportError::Dropped)),
        };

        match frame {
            Message::Text(text) => {
                return decode_command(text.as_str()).map_err(SessionEnd::Protocol);
            }
            Message::Binary(bytes) => {
                return Err(SessionEnd::Protocol(ProtocolError::UnexpectedBinary {
                    len: bytes.len(),
                }));
            }
            Message::Close(frame) => return Err(SessionEnd::PeerClosed(frame.map(|f| f.code))),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

async fn send_reply(socket: &mut WebSocket, reply: &Reply) -> Result<(), SessionEnd> {
    let text = encode_reply(reply).map_err(SessionEnd::Protocol)?;
    socket
        .send(Message::text(text))
        .await
        .map_err(|e| SessionEnd::Transport(TransportError::Write(e)))
}

async fn close(socket: &mut WebSocket, end: &SessionEnd) {
    let Some(code) = end.close_code() else {
        // The reply to the peer's close frame is queued; push it out.
        if let Err(e) = socket.flush().await {
            tracing::debug!(error = %e, "close reply not delivered");
        }
        return;
    };

    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(""),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "close frame not delivered");
        return;
    }

    let acknowledged = tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, async {
        while let Some(Ok(frame)) = socket.recv().await {
            if matches!(frame, Message::Close(_)) {
                break;
            }
        }
    })
    .await;
    if acknowledged.is_err() {
        tracing::debug!("peer did not acknowledge close");
    }
}
