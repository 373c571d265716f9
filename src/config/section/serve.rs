//! `[serve]` section configuration.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # 0.0.0.0 makes the server reachable from LAN
//! port = 8080                 # HTTP port (next free port is used when taken)
//! watch = true                # rebuild and reload on file changes
//! ws_port = 35729             # live-reload WebSocket port
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    pub watch: bool,
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            watch: true,
            ws_port: 35729,
        }
    }
}
