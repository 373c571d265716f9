//! WebSocket listener for live reload.
//!
//! The listener is bound up front so the real port is known before the
//! first HTML response is served. Accepted sockets are handed to WsActor,
//! which performs the handshake.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the non-blocking accept loop
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind the live reload listener, trying successive ports when taken.
pub fn bind(interface: IpAddr, base_port: u16) -> Result<(TcpListener, u16)> {
    let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    if port != base_port {
        crate::log!("reload"; "port {} in use, using {} instead", base_port, port);
    }
    crate::debug!("reload"; "ws://{}", SocketAddr::new(interface, port));
    Ok((listener, port))
}

/// Accept clients on a background thread until shutdown.
pub fn spawn_acceptor(listener: TcpListener, ws_tx: mpsc::Sender<WsMsg>) -> Result<()> {
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        while !crate::core::is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // Handshake and writes use blocking IO
                    let _ = stream.set_nonblocking(false);

                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }
    });

    Ok(())
}

fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_skips_taken_port() {
        let taken = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let (_listener, port) = try_bind_port(LOCALHOST, taken_port, MAX_PORT_RETRIES).unwrap();
        assert_ne!(port, taken_port);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let taken = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        assert!(try_bind_port(LOCALHOST, taken_port, 1).is_err());
    }
}
