#![forbid(unsafe_code)]

//! Stores and retrieves arbitrarily-sized blobs on a [`kdfs_logic`] network
//! by representing them as a tree: each leaf holds a slice of the data,
//! each internal node an ordered list of its children's ids (§6).

pub mod codec;
pub mod file;
pub mod parallel;

use kdfs_logic::Id;
use parallel::{ParallelReader, ParallelWriter, Reader, Writer};

/// Splits `data` into a tree and stores every node, up to [`MAX_REPLICAS`]
/// apart — really bounded by `writer`'s own replication policy. Returns
/// the content id and the minimum replica count observed across all
/// nodes.
pub async fn store_data<W: Writer + ?Sized>(data: &[u8], writer: &W) -> (Id, usize) {
    let (id, values) = codec::split(data);
    let parallel = ParallelWriter::new(writer);
    let replicas = parallel.store_values(values).await;
    (id, replicas)
}

/// Retrieves the blob stored under `id`, or `None` if the root or any
/// descendant couldn't be found.
pub async fn find_data<R: Reader + ?Sized>(id: Id, reader: &R) -> Option<Vec<u8>> {
    let root = reader.find_value(id).await?;
    let parallel = ParallelReader::new(reader);
    codec::join(root, &parallel).await
}
