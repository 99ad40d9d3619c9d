use std::{net::SocketAddr, sync::Arc, time::Duration};

use kdfs_logic::{storage::ValueStore, Host, PeerClient};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::wire::{read_frame, write_frame, Envelope};

/// Symmetric with [`crate::client::TcpPeerClient`]'s outbound deadline
/// (§6): a slow or stalled peer cannot pin down a connection slot forever.
const RESPONSE_DEADLINE: Duration = Duration::from_secs(3);

/// Reads one request from `stream`, dispatches it to `host`, and writes
/// back the response. One request, one response, one connection (§4, §6).
pub async fn handle_connection<S, T>(
    host: Arc<Host<S, T>>,
    mut stream: TcpStream,
    peer_addr: SocketAddr,
) -> Result<(), crate::wire::WireError>
where
    S: ValueStore + Send + Sync + 'static,
    T: PeerClient + 'static,
{
    let work = async {
        let envelope: Envelope = read_frame(&mut stream).await?;
        debug!(sender = ?envelope.sender, ?peer_addr, ?envelope.request, "handling request");
        let response = host.handle_request(envelope.sender, envelope.request);
        write_frame(&mut stream, &response).await
    };

    match tokio::time::timeout(RESPONSE_DEADLINE, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%peer_addr, "connection exceeded the response deadline");
            Ok(())
        }
    }
}
