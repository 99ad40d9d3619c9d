use std::{net::SocketAddr, sync::Arc, time::Duration};

use kdfs_logic::{config::SystemConfig, storage::LocalStore, value::Value, Id};
use kdfs_transport::Node;

const BASE_PORT: u16 = 43_000;

fn addr(offset: u16) -> SocketAddr {
    format!("127.0.0.1:{}", BASE_PORT + offset).parse().unwrap()
}

fn id(byte: u8) -> Id {
    let mut bytes = [0u8; 20];
    bytes[0] = byte;
    Id::from_bytes(bytes)
}

/// Brings up `size` real TCP nodes on successive loopback ports and chains
/// each one's bootstrap to its predecessor, mirroring the original test
/// harness's network construction.
async fn spawn_network(size: u16) -> Vec<Arc<Node<LocalStore>>> {
    let mut nodes = Vec::new();
    for i in 0..size {
        let node = Arc::new(Node::new(
            SystemConfig::default(),
            id(i as u8 + 1),
            addr(i),
            LocalStore::new(Default::default()),
        ));
        let serving = node.clone();
        tokio::spawn(async move {
            let _ = serving.serve().await;
        });
        nodes.push(node);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;

    for i in 1..nodes.len() {
        assert!(
            nodes[i].bootstrap(addr((i - 1) as u16)).await,
            "node {i} failed to bootstrap against its predecessor"
        );
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    nodes
}

#[tokio::test(flavor = "multi_thread")]
async fn stores_and_finds_a_value_across_a_small_network() {
    const SIZE: u16 = 6;
    let nodes = spawn_network(SIZE).await;

    let payload = vec![7u8; 42];
    let value = Value::from_payload(&payload);
    let (content_id, replicas) = nodes[0].host().store_value(value.clone()).await;
    assert!(replicas >= 1, "value was not stored on any replica");

    let retrieved = nodes[SIZE as usize - 1].host().query_value(content_id).await;
    assert_eq!(
        retrieved.map(|v| v.as_bytes().to_vec()),
        Some(value.as_bytes().to_vec())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn find_value_reports_nothing_for_an_unknown_id() {
    let nodes = spawn_network(4).await;
    let missing = id(200);
    assert!(nodes[0].host().query_value(missing).await.is_none());
}
