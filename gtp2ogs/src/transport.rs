//! The server's WebSocket RPC transport. Named as an out-of-scope external
//! collaborator by the purpose statement; kept thin here, but wired for
//! real so the bot is actually runnable. Mirrors the relay's send/receive
//! task split: one task drains outbound messages into the socket, a second
//! decodes inbound frames into events, and `run` races their natural
//! termination the same way the connection handler did.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use protocol::wire::{ActiveGameEvent, AuthenticateAck, AuthenticateMessage, NotificationEnvelope, ServerEvent};

use crate::error::Error;

fn decode_event(text: &str) -> Option<ServerEvent> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let kind = value.get("type")?.as_str()?.to_string();
    if kind == "active_game" {
        return serde_json::from_value::<ActiveGameEvent>(value).ok().map(ServerEvent::ActiveGame);
    }
    let id = value
        .get("id")
        .map(|v| if let Some(s) = v.as_str() { s.to_string() } else { v.to_string() })
        .unwrap_or_default();
    Some(ServerEvent::Notification(NotificationEnvelope { kind, id, body: value }))
}

/// A connected socket to the server. `send` is fire-and-forget into the
/// outbound queue; `next_event` drains decoded inbound events in order.
pub struct ServerConnection {
    outbound_tx: mpsc::UnboundedSender<serde_json::Value>,
    inbound_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl ServerConnection {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| Error::SocketDisconnected(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<serde_json::Value>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

        let mut send_task = tokio::spawn(async move {
            while let Some(value) = outbound_rx.recv().await {
                if sink.send(Message::Text(value.to_string())).await.is_err() {
                    break;
                }
            }
        });

        let inbound_tx_for_receive = inbound_tx.clone();
        let mut receive_task = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = decode_event(&text) {
                            if inbound_tx_for_receive.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => {
                        let _ = inbound_tx_for_receive.send(ServerEvent::Disconnect);
                        break;
                    }
                    _ => {}
                }
            }
        });

        tokio::spawn(async move {
            tokio::select! {
                _ = &mut send_task => { receive_task.abort(); }
                _ = &mut receive_task => { send_task.abort(); }
            }
        });

        let _ = inbound_tx.send(ServerEvent::Connect);

        Ok(Self { outbound_tx, inbound_rx })
    }

    /// A cloneable handle for sending outbound socket messages from tasks
    /// that don't own the connection itself (e.g. the periodic status
    /// reporter).
    pub fn sender(&self) -> mpsc::UnboundedSender<serde_json::Value> {
        self.outbound_tx.clone()
    }

    pub fn send(&self, value: serde_json::Value) -> Result<(), Error> {
        self.outbound_tx
            .send(value)
            .map_err(|_| Error::SocketDisconnected("outbound channel closed".into()))
    }

    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.inbound_rx.recv().await
    }

    /// Sends `authenticate` and waits specifically for its ack, bypassing
    /// the general event stream (the ack isn't one of the four inbound
    /// event kinds the session controller otherwise dispatches on).
    pub async fn authenticate(&mut self, message: &AuthenticateMessage) -> Result<AuthenticateAck, Error> {
        self.send(serde_json::json!({
            "type": "authenticate",
            "jwt": message.jwt,
            "bot_username": message.bot_username,
            "bot_apikey": message.bot_apikey,
            "bot_config": message.bot_config,
        }))?;

        loop {
            match self.inbound_rx.recv().await {
                Some(ServerEvent::Notification(envelope)) if envelope.kind == "authenticate_ack" => {
                    return serde_json::from_value(envelope.body)
                        .map_err(|e| Error::AuthFailed(e.to_string()));
                }
                Some(ServerEvent::Disconnect) | None => {
                    return Err(Error::AuthFailed("disconnected before authentication".into()));
                }
                _ => continue,
            }
        }
    }
}
