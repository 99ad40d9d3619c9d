use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    peer::Peer,
    protocol::{Request, Response},
};

/// Transport-level failures a lookup or store has to tolerate as a normal,
/// non-fatal outcome (§7.1): a peer going unreachable is routine network
/// behaviour, not a bug.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum PeerError {
    #[error("connection to {0} timed out")]
    Timeout(SocketAddr),

    #[error("could not reach {0}: {1}")]
    Unreachable(SocketAddr, String),

    #[error("peer at {0} sent a malformed response")]
    Protocol(SocketAddr),
}

/// The network-facing half of a node: everything [`crate::dht::Host`] needs
/// in order to talk to a remote peer, without knowing how the bytes actually
/// travel. The real implementation (TCP dial, bincode framing, 3s deadline)
/// lives in the transport crate; tests use small in-memory stand-ins
/// instead.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Sends `request` to `addr`, identifying the local node as `sender`
    /// (§4.3/§6: every outbound request is signed with the sender's own
    /// (id, listen address) pair so the recipient can learn a dialable
    /// address for it — the TCP source port of the connection is an
    /// ephemeral outbound port, not something the recipient could ever
    /// dial back), and waits for the matching response.
    async fn send(
        &self,
        addr: SocketAddr,
        sender: Peer,
        request: Request,
    ) -> Result<Response, PeerError>;

    /// Convenience wrapper used by the liveness sweep (§4.8): true iff the
    /// peer answered a PING.
    async fn ping(&self, addr: SocketAddr, sender: Peer) -> bool {
        matches!(self.send(addr, sender, Request::Ping).await, Ok(Response::Pong(_)))
    }
}
