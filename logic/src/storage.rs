use std::{cmp::Reverse, collections::HashMap, sync::Mutex};

use instant::Instant;
use priority_queue::PriorityQueue;
use tracing::{debug, info};

use crate::{config::StorageConfig, value::Value, Id};

/// The local value-persistence backend, pluggable behind this trait so the
/// core never depends on a specific storage technology. `get`/`set` must be
/// safe for concurrent use.
pub trait ValueStore: Send + Sync {
    fn get(&self, id: Id) -> Option<Value>;

    /// Attempts to store `value` under `id`. Returns whether it was
    /// accepted — capacity rejections are a normal, non-fatal outcome
    /// (§7.2).
    fn set(&self, id: Id, value: Value) -> bool;

    /// Reclaims expired entries, if this store has any notion of expiry.
    /// Intended to be driven by a periodic `TTL / 5` sweep (§4.8); a no-op
    /// by default.
    fn sweep_expired(&self) {}
}

struct Inner {
    entries: HashMap<Id, Value>,
    deadlines: PriorityQueue<Id, Reverse<Instant>>,
}

/// A bounded, TTL-expiring map from [`Id`] to [`Value`] (§3, §4.8). Entries
/// beyond `max_entries` are rejected; entries past their expiry are
/// reclaimed by [`LocalStore::sweep_expired`].
pub struct LocalStore {
    config: StorageConfig,
    inner: Mutex<Inner>,
}

impl LocalStore {
    pub fn new(config: StorageConfig) -> Self {
        LocalStore {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                deadlines: PriorityQueue::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValueStore for LocalStore {
    fn get(&self, id: Id) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        inner.entries.get(&id).cloned()
    }

    fn set(&self, id: Id, value: Value) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.entries.contains_key(&id) && inner.entries.len() >= self.config.max_entries {
            info!(%id, "store rejected, at capacity");
            return false;
        }
        let deadline = Instant::now() + self.config.ttl;
        inner.entries.insert(id, value);
        inner.deadlines.push(id, Reverse(deadline));
        true
    }

    /// Deletes every entry whose expiry is in the past. Intended to be
    /// driven by a periodic `TTL / 5` sweep (§4.8).
    fn sweep_expired(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();
        while let Some((_, Reverse(deadline))) = inner.deadlines.peek() {
            if *deadline > now {
                break;
            }
            let (id, _) = inner.deadlines.pop().unwrap();
            inner.entries.remove(&id);
            debug!(%id, "expired store entry reclaimed");
        }
    }
}

/// A store that refuses every write and never has anything to read. Used
/// by client-only processes (e.g. the CLI's `store`/`find` subcommands)
/// that participate in the DHT without hosting data themselves — the
/// original's `FakeStorage`.
#[derive(Default)]
pub struct NullStore;

impl ValueStore for NullStore {
    fn get(&self, _id: Id) -> Option<Value> {
        None
    }

    fn set(&self, _id: Id, _value: Value) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> Id {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        Id::from_bytes(bytes)
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = LocalStore::new(StorageConfig::default());
        let value = Value::from_payload(b"hello");
        assert!(store.set(id(1), value.clone()));
        assert_eq!(store.get(id(1)), Some(value));
    }

    #[test]
    fn rejects_beyond_capacity() {
        let store = LocalStore::new(StorageConfig {
            max_entries: 1,
            ..StorageConfig::default()
        });
        assert!(store.set(id(1), Value::zeroed()));
        assert!(!store.set(id(2), Value::zeroed()));
        // Overwriting an existing key is not a new entry.
        assert!(store.set(id(1), Value::zeroed()));
    }

    #[test]
    fn null_store_rejects_everything() {
        let store = NullStore;
        assert!(!store.set(id(1), Value::zeroed()));
        assert_eq!(store.get(id(1)), None);
    }

    #[test]
    fn sweep_reclaims_expired_entries() {
        let store = LocalStore::new(StorageConfig {
            ttl: std::time::Duration::from_millis(1),
            ..StorageConfig::default()
        });
        assert!(store.set(id(1), Value::zeroed()));
        std::thread::sleep(std::time::Duration::from_millis(20));
        store.sweep_expired();
        assert!(store.is_empty());
    }
}
