use std::sync::Mutex;

use crate::{config::RoutingConfig, consts::ID_LEN_BITS, kbucket::KBucket, peer::Peer, Id};

struct Inner {
    buckets: Vec<KBucket>,
}

/// The local node's routing table: 160 buckets indexed by shared-prefix
/// length with the local id (bucket `i` holds peers sharing `159 - i`
/// leading bits). All mutation and snapshotting goes through the table's
/// own mutex (§3, §5's "shared-resource policy").
pub struct RoutingTable {
    local_id: Id,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl RoutingTable {
    pub fn new(local_id: Id, config: &RoutingConfig) -> Self {
        let buckets = (0..ID_LEN_BITS).map(|_| KBucket::default()).collect();
        RoutingTable {
            local_id,
            capacity: config.bucket_size,
            inner: Mutex::new(Inner { buckets }),
        }
    }

    fn bucket_index(&self, id: Id) -> usize {
        let shared = self.local_id.shared_prefix_len(&id) as usize;
        ID_LEN_BITS - 1 - shared
    }

    /// Offers a peer to the table. Rejects the local node itself, an
    /// already-present id, or an insertion into a full bucket (oldest-wins:
    /// no eviction happens here).
    pub fn add_peer(&self, peer: Peer) -> bool {
        if peer.id == self.local_id {
            return false;
        }
        let index = self.bucket_index(peer.id);
        let mut inner = self.inner.lock().unwrap();
        inner.buckets[index].insert(peer, self.capacity)
    }

    pub fn remove_peer(&self, id: Id) -> bool {
        let index = self.bucket_index(id);
        let mut inner = self.inner.lock().unwrap();
        inner.buckets[index].remove(id)
    }

    /// A point-in-time copy of every known peer.
    pub fn snapshot(&self) -> Vec<Peer> {
        let inner = self.inner.lock().unwrap();
        inner.buckets.iter().flat_map(|b| b.iter().copied()).collect()
    }

    pub fn peer_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.buckets.iter().map(KBucket::len).sum()
    }

    /// The `n` peers closest to `target` by XOR distance, ascending.
    pub fn closest(&self, target: Id, n: usize) -> Vec<Peer> {
        let mut peers = self.snapshot();
        peers.sort_by_key(|p| p.id.distance(&target));
        peers.truncate(n);
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr() -> SocketAddr {
        "127.0.0.1:1".parse().unwrap()
    }

    fn id_with_byte(b: u8) -> Id {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        Id::from_bytes(bytes)
    }

    #[test]
    fn bucket_index_matches_formula() {
        let local = id_with_byte(0b1010_0000);
        let table = RoutingTable::new(local, &RoutingConfig::default());
        // Flip the top bit: shares 0 leading bits -> bucket 159.
        let far = id_with_byte(0b0010_0000);
        assert_eq!(table.bucket_index(far), 159);
        // Identical except last byte: shares 159 bits -> bucket 0.
        let mut near_bytes = *local.as_bytes();
        near_bytes[19] ^= 1;
        let near = Id::from_bytes(near_bytes);
        assert_eq!(table.bucket_index(near), 0);
    }

    #[test]
    fn self_insertion_always_rejected() {
        let local = id_with_byte(1);
        let table = RoutingTable::new(local, &RoutingConfig::default());
        assert!(!table.add_peer(Peer::new(local, addr())));
        assert_eq!(table.peer_count(), 0);
    }

    #[test]
    fn bucket_never_exceeds_capacity() {
        let local = id_with_byte(0);
        let config = RoutingConfig { bucket_size: 2 };
        let table = RoutingTable::new(local, &config);
        // All share the same 159-bit prefix with local (bucket 0).
        for b in 1..=3u8 {
            table.add_peer(Peer::new(id_with_byte(b), addr()));
        }
        assert_eq!(table.peer_count(), 2);
    }

    #[test]
    fn closest_sorts_ascending_by_distance() {
        let local = id_with_byte(0);
        let table = RoutingTable::new(local, &RoutingConfig::default());
        let target = id_with_byte(0b0000_1111);
        let far = Peer::new(id_with_byte(0b1111_0000), addr());
        let near = Peer::new(id_with_byte(0b0000_1110), addr());
        table.add_peer(far);
        table.add_peer(near);
        let closest = table.closest(target, 10);
        assert_eq!(closest[0].id, near.id);
        assert_eq!(closest[1].id, far.id);
    }
}
