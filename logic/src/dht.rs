use std::net::SocketAddr;

use tracing::{debug, info, instrument};

use crate::{
    client::PeerClient,
    config::SystemConfig,
    peer::Peer,
    protocol::{FindValueResponse, Request, Response},
    routing::RoutingTable,
    search::{self, Outcome},
    storage::ValueStore,
    value::Value,
    Id,
};

/// A single DHT participant: its identity, its view of the network, and the
/// value store it offers to the rest of the network. Generic over the value
/// store (`S`) and the peer transport (`T`) so the core logic never depends
/// on a concrete storage backend or network stack (§3, §4).
pub struct Host<S: ValueStore, T: PeerClient> {
    config: SystemConfig,
    id: Id,
    addr: SocketAddr,
    routing: RoutingTable,
    store: S,
    client: T,
}

impl<S: ValueStore, T: PeerClient> Host<S, T> {
    pub fn new(config: SystemConfig, id: Id, addr: SocketAddr, store: S, client: T) -> Self {
        let routing = RoutingTable::new(id, &config.routing);
        Host {
            config,
            id,
            addr,
            routing,
            store,
            client,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn as_peer(&self) -> Peer {
        Peer::new(self.id, self.addr)
    }

    /// Offers a peer to the routing table. Every inbound request and every
    /// outbound exchange calls this (§5's opportunistic-learning rule).
    fn learn(&self, peer: Peer) {
        self.routing.add_peer(peer);
    }

    /// Answers a request arriving from `sender`, learning about it first —
    /// unless `sender` is the unroutable sentinel a client-only host signs
    /// its requests with, in which case there is nothing dialable to learn
    /// (see [`Peer::is_unroutable`]).
    #[instrument(skip(self, request), fields(local = %self.id, %sender.id))]
    pub fn handle_request(&self, sender: Peer, request: Request) -> Response {
        if !sender.is_unroutable() {
            self.learn(sender);
        }

        match request {
            Request::Ping => Response::Pong(self.id),
            Request::FindNode(target) => {
                let peers = self.routing.closest(target, self.config.routing.bucket_size);
                Response::FoundNode(peers)
            }
            Request::FindValue(target) => match self.store.get(target) {
                Some(value) => Response::FoundValue(FindValueResponse::Value(value)),
                None => {
                    let peers = self.routing.closest(target, self.config.routing.bucket_size);
                    Response::FoundValue(FindValueResponse::CloserPeers(peers))
                }
            },
            Request::Store(id, value) => {
                let stored = self.store.set(id, value);
                Response::Stored(stored)
            }
        }
    }

    /// The iterative FIND_NODE lookup (§4.6): the closest peers known to
    /// the network for `target`.
    #[instrument(skip(self), fields(local = %self.id))]
    pub async fn query_nodes(&self, target: Id) -> Vec<Peer> {
        let seed = self.routing.closest(target, self.config.routing.bucket_size);
        let outcome = search::lookup(
            &self.client,
            self.as_peer(),
            target,
            seed,
            self.config.routing.bucket_size,
            self.config.search.parallelism,
            false,
            |peer| self.learn(peer),
        )
        .await;
        match outcome {
            Outcome::Nodes(peers) => peers,
            Outcome::Value(_) => unreachable!("node lookups never short-circuit on a value"),
        }
    }

    /// The iterative FIND_VALUE lookup (§4.6): checks the local store
    /// first, then asks the network.
    #[instrument(skip(self), fields(local = %self.id))]
    pub async fn query_value(&self, target: Id) -> Option<Value> {
        if let Some(value) = self.store.get(target) {
            return Some(value);
        }

        let seed = self.routing.closest(target, self.config.routing.bucket_size);
        let outcome = search::lookup(
            &self.client,
            self.as_peer(),
            target,
            seed,
            self.config.routing.bucket_size,
            self.config.search.parallelism,
            true,
            |peer| self.learn(peer),
        )
        .await;
        match outcome {
            Outcome::Value(value) => Some(value),
            Outcome::Nodes(_) => None,
        }
    }

    /// The store orchestrator (§4.7): derives the content id, finds the
    /// closest peers via FIND_NODE, then stores sequentially until
    /// `max_replicas` peers have accepted the value or the candidate list
    /// is exhausted.
    #[instrument(skip(self, value), fields(local = %self.id))]
    pub async fn store_value(&self, value: Value) -> (Id, usize) {
        let id = Id::of_content(value.as_bytes());
        let nodes = self.query_nodes(id).await;

        let mut replicas = 0usize;
        for peer in nodes {
            if replicas >= self.config.search.max_replicas {
                break;
            }
            let accepted = if peer.id == self.id {
                self.store.set(id, value.clone())
            } else {
                matches!(
                    self.client
                        .send(peer.addr, self.as_peer(), Request::Store(id, value.clone()))
                        .await,
                    Ok(Response::Stored(true))
                )
            };
            if accepted {
                replicas += 1;
            }
        }

        info!(%id, replicas, "stored value");
        (id, replicas)
    }

    /// Joins the network through a known peer (§4.5): PING to learn its
    /// id, then a self-lookup to populate the routing table. Returns false
    /// if the bootstrap peer never answered.
    #[instrument(skip(self), fields(local = %self.id))]
    pub async fn bootstrap(&self, addr: SocketAddr) -> bool {
        let remote_id = match self.client.send(addr, self.as_peer(), Request::Ping).await {
            Ok(Response::Pong(id)) => id,
            _ => return false,
        };

        self.learn(Peer::new(remote_id, addr));
        let _ = self.query_nodes(self.id).await;
        true
    }

    /// Prunes peers that no longer answer a PING (§4.8). Driven by an
    /// external tick, not self-scheduling.
    #[instrument(skip(self), fields(local = %self.id))]
    pub async fn sweep_routing_table(&self) {
        for peer in self.routing.snapshot() {
            if !self.client.ping(peer.addr, self.as_peer()).await {
                debug!(%peer.id, "peer unresponsive, removing from routing table");
                self.routing.remove_peer(peer.id);
            }
        }
    }

    /// Reclaims expired local store entries. Delegates entirely to the
    /// store implementation; a no-op for stores (like [`crate::storage::NullStore`])
    /// that hold nothing.
    pub fn sweep_store(&self) {
        self.store.sweep_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::PeerError, storage::LocalStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn id(b: u8) -> Id {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        Id::from_bytes(bytes)
    }

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    /// A client that never reaches anyone; enough to exercise the parts of
    /// `Host` that don't need a live network.
    struct UnreachableClient;

    #[async_trait]
    impl PeerClient for UnreachableClient {
        async fn send(&self, addr: SocketAddr, _: Peer, _: Request) -> Result<Response, PeerError> {
            Err(PeerError::Unreachable(addr, "no network in this test".into()))
        }
    }

    /// A client that answers PING with a fixed id, for bootstrap tests.
    struct StubClient(Mutex<Option<Id>>);

    #[async_trait]
    impl PeerClient for StubClient {
        async fn send(&self, _: SocketAddr, _: Peer, request: Request) -> Result<Response, PeerError> {
            match request {
                Request::Ping => match *self.0.lock().unwrap() {
                    Some(id) => Ok(Response::Pong(id)),
                    None => Ok(Response::FoundNode(vec![])),
                },
                _ => Ok(Response::FoundNode(vec![])),
            }
        }
    }

    fn host(local: Id) -> Host<LocalStore, UnreachableClient> {
        Host::new(
            SystemConfig::default(),
            local,
            addr(0),
            LocalStore::new(crate::config::StorageConfig::default()),
            UnreachableClient,
        )
    }

    #[test]
    fn handle_request_learns_the_sender() {
        let h = host(id(0));
        let sender = Peer::new(id(1), addr(1));
        h.handle_request(sender, Request::Ping);
        assert_eq!(h.routing().peer_count(), 1);
    }

    #[test]
    fn handle_request_does_not_learn_an_unroutable_sender() {
        // A client-only host (kdfs store/find) signs its requests from the
        // 0.0.0.0:0 sentinel since it never listens; a real peer answering
        // it must not pollute its routing table with that address.
        let h = host(id(0));
        let sentinel = Peer::new(id(1), "0.0.0.0:0".parse().unwrap());
        h.handle_request(sentinel, Request::Ping);
        assert_eq!(h.routing().peer_count(), 0);
    }

    #[test]
    fn find_node_may_return_the_asking_peer_itself() {
        // In a sparse (e.g. two-node) network the only peer a responder
        // knows about can be the very node asking — the response must
        // still include it rather than filtering it out (spec §4.4, §8's
        // "returns exactly min(N, k) peers").
        let h = host(id(0));
        let sender = Peer::new(id(0b0000_0001), addr(1));
        h.handle_request(sender, Request::Ping);
        let resp = h.handle_request(sender, Request::FindNode(id(0b0000_0011)));
        match resp {
            Response::FoundNode(peers) => {
                assert!(peers.iter().any(|p| p.id == sender.id));
            }
            _ => panic!("expected FoundNode"),
        }
    }

    #[test]
    fn store_then_find_value_round_trips_locally() {
        let h = host(id(0));
        let target = id(5);
        let value = Value::from_payload(b"payload");
        let resp = h.handle_request(Peer::new(id(1), addr(1)), Request::Store(target, value.clone()));
        assert_eq!(resp, Response::Stored(true));
        let resp = h.handle_request(Peer::new(id(1), addr(1)), Request::FindValue(target));
        assert_eq!(resp, Response::FoundValue(FindValueResponse::Value(value)));
    }

    #[tokio::test]
    async fn bootstrap_fails_when_the_peer_never_answers() {
        let h = host(id(0));
        assert!(!h.bootstrap(addr(9)).await);
        assert_eq!(h.routing().peer_count(), 0);
    }

    #[tokio::test]
    async fn bootstrap_learns_the_remote_id_on_success() {
        let remote = id(7);
        let client = StubClient(Mutex::new(Some(remote)));
        let h = Host::new(
            SystemConfig::default(),
            id(0),
            addr(0),
            LocalStore::new(crate::config::StorageConfig::default()),
            client,
        );
        assert!(h.bootstrap(addr(7)).await);
        assert_eq!(h.routing().peer_count(), 1);
    }
}
