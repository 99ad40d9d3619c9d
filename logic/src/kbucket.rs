use crate::{peer::Peer, Id};

/// A single bucket: an ordered sequence of up to `bucket_size` peers.
///
/// The eviction policy is oldest-wins: once full, new peers are rejected
/// rather than replacing an existing entry. Stale entries are reclaimed by
/// the periodic liveness sweep (§4.8), not by this structure.
#[derive(Debug, Default)]
pub struct KBucket {
    entries: Vec<Peer>,
}

impl KBucket {
    pub fn has(&self, id: Id) -> bool {
        self.entries.iter().any(|x| x.id == id)
    }

    /// Appends `peer` if there is room and it isn't already present.
    pub fn insert(&mut self, peer: Peer, capacity: usize) -> bool {
        if self.has(peer.id) {
            return false;
        }
        if self.entries.len() >= capacity {
            return false;
        }
        self.entries.push(peer);
        true
    }

    /// Removes the peer with the given id, preserving relative order of
    /// the rest.
    pub fn remove(&mut self, id: Id) -> bool {
        match self.entries.iter().position(|x| x.id == id) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn peer(byte: u8) -> Peer {
        let mut bytes = [0u8; 20];
        bytes[0] = byte;
        Peer::new(Id::from_bytes(bytes), "127.0.0.1:1".parse::<SocketAddr>().unwrap())
    }

    #[test]
    fn rejects_when_full() {
        let mut bucket = KBucket::default();
        assert!(bucket.insert(peer(1), 2));
        assert!(bucket.insert(peer(2), 2));
        assert!(!bucket.insert(peer(3), 2));
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn rejects_duplicate_id() {
        let mut bucket = KBucket::default();
        assert!(bucket.insert(peer(1), 2));
        assert!(!bucket.insert(peer(1), 2));
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn remove_preserves_order() {
        let mut bucket = KBucket::default();
        bucket.insert(peer(1), 3);
        bucket.insert(peer(2), 3);
        bucket.insert(peer(3), 3);
        assert!(bucket.remove(peer(2).id));
        let ids: Vec<_> = bucket.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![peer(1).id, peer(3).id]);
    }

    #[test]
    fn remove_frees_capacity() {
        let mut bucket = KBucket::default();
        bucket.insert(peer(1), 1);
        assert!(!bucket.insert(peer(2), 1));
        assert!(bucket.remove(peer(1).id));
        assert!(bucket.insert(peer(2), 1));
    }
}
