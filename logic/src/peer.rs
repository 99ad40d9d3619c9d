use std::net::SocketAddr;

use crate::Id;

/// A remote node: its identifier and its network address.
///
/// Two peers are equal iff both fields match; this is what makes them safe
/// to use as `HashSet`/`HashMap` keys during a lookup (see
/// [`crate::search`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peer {
    pub id: Id,
    pub addr: SocketAddr,
}

impl Peer {
    pub fn new(id: Id, addr: SocketAddr) -> Self {
        Peer { id, addr }
    }

    /// True for the `0.0.0.0:0` sentinel a non-listening (client-only) host
    /// signs its outbound requests with in place of a real address: it has
    /// nothing to be dialed back on, so it must never be learned into a
    /// remote peer's routing table (mirrors the original's empty
    /// `SenderAddr` convention in `core/host.go`).
    pub fn is_unroutable(&self) -> bool {
        self.addr.ip().is_unspecified() && self.addr.port() == 0
    }
}
