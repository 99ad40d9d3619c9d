use std::{future::Future, pin::Pin};

use kdfs_logic::{consts::ID_LEN, value::Value, Id};

use crate::parallel::{ParallelReader, Reader};

/// Bytes reserved at the front of every [`Value`]: 1 byte marking leaf vs.
/// internal, 4 bytes (big-endian) for the node's size.
const HEADER_SIZE: usize = 5;

/// Usable bytes left for a node's body after the header.
const PAYLOAD_SIZE: usize = Value::LEN - HEADER_SIZE;

/// The most children an internal node can list — as many ids as fit in
/// [`PAYLOAD_SIZE`].
pub const MAX_CHILDREN: usize = PAYLOAD_SIZE / ID_LEN;

enum TreeNode {
    Leaf { size: u32, chunk: Box<[u8; PAYLOAD_SIZE]> },
    Internal { children: Vec<TreeNode> },
}

fn split_into_leaves(data: &[u8]) -> Vec<TreeNode> {
    if data.is_empty() {
        return vec![TreeNode::Leaf {
            size: 0,
            chunk: Box::new([0u8; PAYLOAD_SIZE]),
        }];
    }

    data.chunks(PAYLOAD_SIZE)
        .map(|slice| {
            let mut chunk = [0u8; PAYLOAD_SIZE];
            chunk[..slice.len()].copy_from_slice(slice);
            TreeNode::Leaf {
                size: slice.len() as u32,
                chunk: Box::new(chunk),
            }
        })
        .collect()
}

/// Groups a level of nodes into parents of at most [`MAX_CHILDREN`]
/// children each, recursing until a single root remains.
fn build_tree(level: Vec<TreeNode>) -> TreeNode {
    if level.len() == 1 {
        return level.into_iter().next().unwrap();
    }

    let mut iter = level.into_iter();
    let mut parents = Vec::new();
    loop {
        let group: Vec<TreeNode> = (&mut iter).take(MAX_CHILDREN).collect();
        if group.is_empty() {
            break;
        }
        parents.push(TreeNode::Internal { children: group });
    }
    build_tree(parents)
}

/// Serializes a tree depth-first, children before their parent, pushing
/// each node's [`Value`] onto `out` and returning the id of the node just
/// serialized. The root's id (the last one returned) is the content id for
/// the whole blob.
fn serialize(node: &TreeNode, out: &mut Vec<Value>) -> Id {
    let mut bytes = [0u8; Value::LEN];

    match node {
        TreeNode::Leaf { size, chunk } => {
            bytes[0] = 1;
            bytes[1..HEADER_SIZE].copy_from_slice(&size.to_be_bytes());
            bytes[HEADER_SIZE..].copy_from_slice(chunk.as_ref());
        }
        TreeNode::Internal { children } => {
            bytes[0] = 0;
            bytes[1..HEADER_SIZE].copy_from_slice(&(children.len() as u32).to_be_bytes());
            for (i, child) in children.iter().enumerate() {
                let child_id = serialize(child, out);
                let start = HEADER_SIZE + i * ID_LEN;
                bytes[start..start + ID_LEN].copy_from_slice(child_id.as_bytes());
            }
        }
    }

    let value = Value::from(bytes);
    let id = Id::of_content(value.as_bytes());
    out.push(value);
    id
}

/// Splits an arbitrary-length blob into a tree of fixed-size [`Value`]s
/// and returns the root's content id alongside every node, depth-first
/// (§6).
pub fn split(data: &[u8]) -> (Id, Vec<Value>) {
    let root = build_tree(split_into_leaves(data));
    let mut values = Vec::new();
    let root_id = serialize(&root, &mut values);
    (root_id, values)
}

fn decode_header(value: &Value) -> (bool, u32) {
    let bytes = value.as_bytes();
    let is_leaf = bytes[0] == 1;
    let size = u32::from_be_bytes(bytes[1..HEADER_SIZE].try_into().unwrap());
    (is_leaf, size)
}

/// Reassembles a blob from its root [`Value`], fetching children as
/// needed through `reader`. `None` if any node in the tree couldn't be
/// retrieved.
pub fn join<'a, R: Reader + ?Sized>(
    root: Value,
    reader: &'a ParallelReader<'a, R>,
) -> Pin<Box<dyn Future<Output = Option<Vec<u8>>> + Send + 'a>> {
    Box::pin(async move {
        let (is_leaf, size) = decode_header(&root);

        if is_leaf {
            let bytes = root.as_bytes();
            let end = HEADER_SIZE + size as usize;
            return Some(bytes[HEADER_SIZE..end].to_vec());
        }

        let mut ids = Vec::with_capacity(size as usize);
        let bytes = root.as_bytes();
        for i in 0..size as usize {
            let start = HEADER_SIZE + i * ID_LEN;
            let mut id_bytes = [0u8; ID_LEN];
            id_bytes.copy_from_slice(&bytes[start..start + ID_LEN]);
            ids.push(Id::from_bytes(id_bytes));
        }

        let children = reader.find_values(&ids).await?;

        let mut data = Vec::new();
        for child in children {
            data.extend(join(child, reader).await?);
        }
        Some(data)
    })
}
