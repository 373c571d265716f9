//! WebSocket Actor - pushes build results to connected browsers.

use std::net::TcpStream;
use std::time::Duration;

use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::ReloadMessage;

/// Upper bound for a handshake or a single send to a stalled client
const IO_TIMEOUT: Duration = Duration::from_secs(2);

pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    clients: Vec<WebSocket<TcpStream>>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Vec::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload => self.broadcast(&ReloadMessage::Reload),
                WsMsg::Error(message) => self.broadcast(&ReloadMessage::error(message)),
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut client in self.clients.drain(..) {
                        let _ = client.close(None);
                        let _ = client.flush();
                    }
                    break;
                }
            }
        }
    }

    fn add_client(&mut self, stream: TcpStream) {
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::debug!("ws"; "handshake failed: {}", e);
                return;
            }
        };

        let hello = Message::Text(ReloadMessage::connected().to_json().into());
        if let Err(e) = ws.send(hello) {
            crate::debug!("ws"; "client dropped during hello: {}", e);
            return;
        }

        self.clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", self.clients.len());
    }

    /// Send to every client, dropping the ones that fail.
    fn broadcast(&mut self, msg: &ReloadMessage) {
        if self.clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let frame = Message::Text(msg.to_json().into());
        self.clients.retain_mut(|client| match client.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", self.clients.len());
    }
}
