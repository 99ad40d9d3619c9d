use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use kdfs_logic::{
    config::SystemConfig,
    storage::{LocalStore, NullStore},
    Id,
};
use kdfs_transport::Node;
use tracing::info;

/// Command-line front-end for the distributed file store, mirroring the
/// original's `cmd/node` and `cmd/cli` binaries.
#[derive(Parser, Debug)]
#[command(name = "kdfs")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Starts a DHT node: binds a listener, optionally bootstraps against
    /// an existing peer, and serves requests until interrupted.
    Node {
        /// Port to listen on (binds 127.0.0.1:<port>).
        #[arg(long, default_value_t = 42042)]
        port: u16,

        /// Address of an existing node to bootstrap against.
        #[arg(long)]
        bootstrap: Option<SocketAddr>,
    },
    /// Publishes a file to the network through a running node.
    Store {
        /// Address of a node to publish through.
        #[arg(long)]
        addr: SocketAddr,

        /// Path of the file to publish.
        #[arg(long)]
        file: PathBuf,
    },
    /// Retrieves a previously published file by its root id.
    Find {
        /// Address of a node to resolve through.
        #[arg(long)]
        addr: SocketAddr,

        /// Hex-encoded root id, as printed by `store`.
        #[arg(long)]
        id: String,

        /// Path to write the retrieved bytes to.
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Args::parse().command {
        Command::Node { port, bootstrap } => run_node(port, bootstrap).await,
        Command::Store { addr, file } => run_store(addr, file).await,
        Command::Find { addr, id, out } => run_find(addr, id, out).await,
    }
}

async fn run_node(port: u16, bootstrap: Option<SocketAddr>) -> anyhow::Result<()> {
    let node_addr: SocketAddr = format!("127.0.0.1:{port}").parse()?;
    let id = Id::random(&mut rand::thread_rng());
    let node = Arc::new(Node::new(
        SystemConfig::default(),
        id,
        node_addr,
        LocalStore::new(Default::default()),
    ));

    info!(%id, %node_addr, "starting up node");

    if let Some(bootstrap_addr) = bootstrap {
        if !node.bootstrap(bootstrap_addr).await {
            anyhow::bail!("could not bootstrap against {bootstrap_addr}");
        }
    }

    spawn_stats_logger(node.clone());

    let serving = node.clone();
    let serve_task = tokio::spawn(async move { serving.serve().await });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    node.shutdown();

    serve_task.await??;
    Ok(())
}

/// Logs the routing table size and local store size once a minute, as the
/// original's `cmd/node` goroutine does.
fn spawn_stats_logger<S>(node: Arc<Node<S>>)
where
    S: kdfs_logic::storage::ValueStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        ticker.tick().await; // skip the immediate first tick
        loop {
            ticker.tick().await;
            let peer_count = node.host().routing().peer_count();
            info!(peer_count, "node in routing table");
        }
    });
}

/// Builds a bootstrap-only host: a [`NullStore`] participant that holds no
/// data of its own, used by `store`/`find`, mirroring the original's
/// `core.NewFakeStorage()` client host.
async fn client_host(addr: SocketAddr) -> anyhow::Result<Arc<Node<NullStore>>> {
    // This host never binds a listener, so it has no address a peer could
    // dial back on. Sign outbound requests with the unroutable sentinel
    // (0.0.0.0:0) rather than a real-looking loopback address, so the
    // request handler on the other end knows not to learn it
    // (`Peer::is_unroutable`, mirroring the original's empty `SenderAddr`).
    let local_addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
    let id = Id::random(&mut rand::thread_rng());
    let node = Arc::new(Node::new(SystemConfig::default(), id, local_addr, NullStore));

    if !node.bootstrap(addr).await {
        anyhow::bail!("could not bootstrap against {addr}");
    }
    Ok(node)
}

async fn run_store(addr: SocketAddr, path: PathBuf) -> anyhow::Result<()> {
    let node = client_host(addr).await?;
    let data = kdfs_tree::file::read_file(&path).await?;
    let (id, replicas) = kdfs_tree::store_data(&data, node.host().as_ref()).await;
    println!("{id}  ({replicas} replicas)");
    Ok(())
}

async fn run_find(addr: SocketAddr, id: String, out: PathBuf) -> anyhow::Result<()> {
    let node = client_host(addr).await?;
    let target = Id::from_hex(&id)?;
    let data = kdfs_tree::find_data(target, node.host().as_ref())
        .await
        .ok_or_else(|| anyhow::anyhow!("file not found"))?;
    kdfs_tree::file::write_file(&out, &data).await?;
    println!("{} bytes written to {}", data.len(), out.display());
    Ok(())
}
