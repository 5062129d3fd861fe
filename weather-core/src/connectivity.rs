//! Synchronous "is the network reachable right now" check.

use std::{
    net::{TcpStream, ToSocketAddrs},
    sync::mpsc,
    thread,
    time::Duration,
};

use url::Url;

pub trait ConnectivityProbe: Send + Sync {
    /// Blocks for at most the probe's timeout.
    fn is_reachable(&self) -> bool;
}

/// Resolves and connects to a host on a helper thread, then waits for the
/// first answer or the timeout, whichever comes first.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probes the host serving `url`; `None` if the URL has no host.
    pub fn for_url(url: &str, timeout: Duration) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, timeout))
    }
}

impl ConnectivityProbe for TcpProbe {
    fn is_reachable(&self) -> bool {
        let (tx, rx) = mpsc::channel();
        let target = (self.host.clone(), self.port);
        let timeout = self.timeout;

        // The thread may outlive us if DNS hangs; its send then goes nowhere.
        thread::spawn(move || {
            let reachable = target
                .to_socket_addrs()
                .map(|mut addrs| {
                    addrs.any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
                })
                .unwrap_or(false);
            let _ = tx.send(reachable);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(reachable) => {
                tracing::debug!(host = %self.host, reachable, "connectivity probe answered");
                reachable
            }
            Err(_) => {
                tracing::info!(
                    host = %self.host,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "connectivity probe timed out"
                );
                false
            }
        }
    }
}
