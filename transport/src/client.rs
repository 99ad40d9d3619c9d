use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use kdfs_logic::{
    client::PeerError,
    protocol::{Request, Response},
    Peer, PeerClient,
};
use tokio::net::TcpStream;
use tracing::debug;

use crate::wire::{read_frame, write_frame, Envelope};

/// A node-to-node request has three seconds, end to end — dial, write,
/// and the matching response — before it's treated as a dead peer (§6).
const REQUEST_DEADLINE: Duration = Duration::from_secs(3);

/// The TCP implementation of [`PeerClient`]: dials the peer fresh for
/// every request, since the protocol is connection-per-exchange rather
/// than a long-lived multiplexed session (§4, §6).
#[derive(Clone, Copy, Debug)]
pub struct TcpPeerClient;

#[async_trait]
impl PeerClient for TcpPeerClient {
    async fn send(
        &self,
        addr: SocketAddr,
        sender: Peer,
        request: Request,
    ) -> Result<Response, PeerError> {
        tokio::time::timeout(REQUEST_DEADLINE, self.exchange(addr, sender, request))
            .await
            .map_err(|_| PeerError::Timeout(addr))?
    }
}

impl TcpPeerClient {
    async fn exchange(
        &self,
        addr: SocketAddr,
        sender: Peer,
        request: Request,
    ) -> Result<Response, PeerError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| PeerError::Unreachable(addr, e.to_string()))?;

        let envelope = Envelope { sender, request };
        write_frame(&mut stream, &envelope)
            .await
            .map_err(|e| PeerError::Unreachable(addr, e.to_string()))?;

        let response = read_frame(&mut stream)
            .await
            .map_err(|_| PeerError::Protocol(addr))?;

        debug!(%addr, "request answered");
        Ok(response)
    }
}
