use std::{net::SocketAddr, sync::Arc};

use kdfs_logic::{config::SystemConfig, storage::ValueStore, Host, Id};
use tokio::{net::TcpListener, task::JoinSet};
use tracing::warn;

use crate::{client::TcpPeerClient, server::handle_connection, shutdown::ShutdownSender};

/// A running DHT participant bound to a real TCP socket: the accept loop,
/// the routing-table liveness sweep, and the storage TTL sweep all run as
/// background tasks driven by one shared shutdown signal (§5).
pub struct Node<S: ValueStore + Send + Sync + 'static> {
    host: Arc<Host<S, TcpPeerClient>>,
    shutdown_tx: ShutdownSender,
}

impl<S: ValueStore + Send + Sync + 'static> Node<S> {
    pub fn new(config: SystemConfig, id: Id, addr: SocketAddr, store: S) -> Self {
        Node {
            host: Arc::new(Host::new(config, id, addr, store, TcpPeerClient)),
            shutdown_tx: ShutdownSender::new(),
        }
    }

    pub fn host(&self) -> &Arc<Host<S, TcpPeerClient>> {
        &self.host
    }

    /// Joins an existing network through `addr` (§4.5).
    pub async fn bootstrap(&self, addr: SocketAddr) -> bool {
        self.host.bootstrap(addr).await
    }

    /// Binds the listener and runs the accept loop plus both maintenance
    /// sweeps until shutdown is signalled.
    pub async fn serve(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.host.addr()).await?;

        let accept_host = self.host.clone();
        let mut accept_shutdown = self.shutdown_tx.subscribe();
        let accept_task = tokio::spawn(async move {
            // Tracks every in-flight handler so shutdown can wait for them
            // to drain instead of dropping them mid-exchange (§5).
            let mut handlers: JoinSet<()> = JoinSet::new();
            loop {
                tokio::select! {
                    _ = accept_shutdown.recv() => break,
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer_addr)) => {
                                let host = accept_host.clone();
                                handlers.spawn(async move {
                                    if let Err(err) = handle_connection(host, stream, peer_addr).await {
                                        warn!(%peer_addr, %err, "connection failed");
                                    }
                                });
                            }
                            Err(err) => warn!(%err, "accept failed"),
                        }
                    }
                    Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
                }
            }
            while handlers.join_next().await.is_some() {}
        });

        let routing_host = self.host.clone();
        let routing_period = self.host.config().maintenance.routing_sweep_period;
        let mut routing_shutdown = self.shutdown_tx.subscribe();
        let routing_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(routing_period);
            ticker.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    _ = routing_shutdown.recv() => break,
                    _ = ticker.tick() => routing_host.sweep_routing_table().await,
                }
            }
        });

        let storage_host = self.host.clone();
        let storage_period = self.host.config().storage.ttl / 5;
        let mut storage_shutdown = self.shutdown_tx.subscribe();
        let storage_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(storage_period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = storage_shutdown.recv() => break,
                    _ = ticker.tick() => storage_host.sweep_store(),
                }
            }
        });

        let _ = tokio::join!(accept_task, routing_task, storage_task);
        Ok(())
    }

    /// Signals every background task (accept loop, both maintenance
    /// sweeps) to stop after its current unit of work.
    pub fn shutdown(&self) {
        self.shutdown_tx.shutdown();
    }
}
