use std::net::SocketAddr;

/// Caller identity for a request, as seen by admission control.
///
/// Derived from the network peer address, not from authentication, so it is not
/// a stable identity (NAT, proxies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    key: String,
}

impl CallerContext {
    /// Key for a peer: its IP address without the port.
    pub fn from_peer(addr: SocketAddr) -> Self {
        Self {
            key: addr.ip().to_string(),
        }
    }

    /// Used when the transport exposes no peer address.
    pub fn unknown() -> Self {
        Self {
            key: "unknown".to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
