use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use kdfs_logic::{storage::ValueStore, value::Value, Host, Id, PeerClient};
use tokio::sync::Semaphore;

/// No more than this many FIND_VALUE/STORE exchanges are in flight at once
/// per [`ParallelReader`]/[`ParallelWriter`] (§4.9 supplement).
const PARALLELISM: usize = 20;

/// What the chunk/tree codec needs to fetch a value by id. Implemented for
/// [`kdfs_logic::Host`] so a node can read its own DHT directly; a plain
/// client-only process can implement it over the wire instead.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn find_value(&self, id: Id) -> Option<Value>;
}

/// What the chunk/tree codec needs to publish a value. See [`Reader`].
#[async_trait]
pub trait Writer: Send + Sync {
    async fn store_value(&self, value: Value) -> (Id, usize);
}

#[async_trait]
impl<S, T> Reader for Host<S, T>
where
    S: ValueStore + Send + Sync,
    T: PeerClient + Send + Sync,
{
    async fn find_value(&self, id: Id) -> Option<Value> {
        self.query_value(id).await
    }
}

#[async_trait]
impl<S, T> Writer for Host<S, T>
where
    S: ValueStore + Send + Sync,
    T: PeerClient + Send + Sync,
{
    async fn store_value(&self, value: Value) -> (Id, usize) {
        self.store_value(value).await
    }
}

/// Parallelizes FIND_VALUE lookups over a [`Reader`], bounded to
/// [`PARALLELISM`] concurrent requests.
pub struct ParallelReader<'a, R: Reader + ?Sized> {
    reader: &'a R,
    semaphore: Arc<Semaphore>,
}

impl<'a, R: Reader + ?Sized> ParallelReader<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        ParallelReader {
            reader,
            semaphore: Arc::new(Semaphore::new(PARALLELISM)),
        }
    }

    /// Looks up every id, preserving input order. `None` unless every id
    /// was found — a partially-reconstructed tree is not a usable result.
    pub async fn find_values(&self, ids: &[Id]) -> Option<Vec<Value>> {
        if ids.is_empty() {
            return Some(Vec::new());
        }

        let mut pending = FuturesUnordered::new();
        for (index, &id) in ids.iter().enumerate() {
            let semaphore = self.semaphore.clone();
            let reader = self.reader;
            pending.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                (index, reader.find_value(id).await)
            });
        }

        let mut results: Vec<Option<Value>> = std::iter::repeat_with(|| None).take(ids.len()).collect();
        while let Some((index, value)) = pending.next().await {
            results[index] = value;
        }
        results.into_iter().collect()
    }
}

/// Parallelizes STORE requests over a [`Writer`], bounded to
/// [`PARALLELISM`] concurrent requests.
pub struct ParallelWriter<'a, W: Writer + ?Sized> {
    writer: &'a W,
    semaphore: Arc<Semaphore>,
}

impl<'a, W: Writer + ?Sized> ParallelWriter<'a, W> {
    pub fn new(writer: &'a W) -> Self {
        ParallelWriter {
            writer,
            semaphore: Arc::new(Semaphore::new(PARALLELISM)),
        }
    }

    /// Stores every value and returns the minimum replica count across all
    /// of them — the network's weakest link for this upload. An empty
    /// `values` list has zero replicas by definition; the host original
    /// implementation left a `1000` sentinel in that case since nothing
    /// ever lowered it, which this corrects (§9).
    pub async fn store_values(&self, values: Vec<Value>) -> usize {
        if values.is_empty() {
            return 0;
        }

        let mut pending = FuturesUnordered::new();
        for value in values {
            let semaphore = self.semaphore.clone();
            let writer = self.writer;
            pending.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                writer.store_value(value).await.1
            });
        }

        let mut min_replicas = usize::MAX;
        while let Some(replicas) = pending.next().await {
            min_replicas = min_replicas.min(replicas);
        }
        min_replicas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeStore {
        values: Mutex<std::collections::HashMap<Id, Value>>,
        replicas_per_store: usize,
    }

    #[async_trait]
    impl Reader for FakeStore {
        async fn find_value(&self, id: Id) -> Option<Value> {
            self.values.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl Writer for FakeStore {
        async fn store_value(&self, value: Value) -> (Id, usize) {
            let id = Id::of_content(value.as_bytes());
            self.values.lock().unwrap().insert(id, value);
            (id, self.replicas_per_store)
        }
    }

    fn id(b: u8) -> Id {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        Id::from_bytes(bytes)
    }

    #[tokio::test]
    async fn find_values_fails_entirely_if_any_id_is_missing() {
        let store = FakeStore {
            values: Mutex::new(std::collections::HashMap::from([(id(1), Value::zeroed())])),
            replicas_per_store: 3,
        };
        let reader = ParallelReader::new(&store);
        assert!(reader.find_values(&[id(1), id(2)]).await.is_none());
        assert!(reader.find_values(&[id(1)]).await.is_some());
    }

    #[tokio::test]
    async fn find_values_of_empty_input_succeeds_trivially() {
        let store = FakeStore {
            values: Mutex::new(std::collections::HashMap::new()),
            replicas_per_store: 3,
        };
        let reader = ParallelReader::new(&store);
        assert_eq!(reader.find_values(&[]).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn store_values_reports_the_minimum_replica_count() {
        let store = FakeStore {
            values: Mutex::new(std::collections::HashMap::new()),
            replicas_per_store: 2,
        };
        let writer = ParallelWriter::new(&store);
        let replicas = writer.store_values(vec![Value::zeroed(), Value::zeroed()]).await;
        assert_eq!(replicas, 2);
    }

    #[tokio::test]
    async fn store_values_of_empty_input_is_zero_not_the_sentinel() {
        let store = FakeStore {
            values: Mutex::new(std::collections::HashMap::new()),
            replicas_per_store: 2,
        };
        let writer = ParallelWriter::new(&store);
        assert_eq!(writer.store_values(Vec::new()).await, 0);
    }
}
