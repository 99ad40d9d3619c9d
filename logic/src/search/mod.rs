use std::collections::HashSet;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use crate::{
    client::PeerClient,
    peer::Peer,
    protocol::{FindValueResponse, Request, Response},
    value::Value,
    Id,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum QueryState {
    Waiting,
    Queried,
}

/// What an iterative lookup settled on: either the closest peers known, or
/// (for a FIND_VALUE lookup that succeeded) the value itself.
pub enum Outcome {
    Nodes(Vec<Peer>),
    Value(Value),
}

/// The iterative closest-alpha lookup (§4.6): starting from `seed`,
/// repeatedly queries the `parallelism` peers closest to `target` that
/// haven't answered yet, folding every peer a response mentions into the
/// working shortlist, until the `bucket_size` closest peers known have all
/// been queried. A FIND_VALUE lookup (`want_value`) returns as soon as any
/// peer has the value.
///
/// `learn` is called once per peer actually contacted, so the caller can
/// feed it back into the routing table (§5's opportunistic-learning rule)
/// without this function depending on [`crate::routing::RoutingTable`]
/// directly — it is tested with a no-op closure.
#[instrument(skip(client, seed, learn), fields(%target))]
pub async fn lookup<T, L>(
    client: &T,
    local: Peer,
    target: Id,
    seed: Vec<Peer>,
    bucket_size: usize,
    parallelism: usize,
    want_value: bool,
    learn: L,
) -> Outcome
where
    T: PeerClient,
    L: Fn(Peer),
{
    let local_id = local.id;
    let mut shortlist: Vec<(Peer, QueryState)> = Vec::new();
    // Keyed on the full (id, address) pair (§9: peer set membership must
    // hash/compare on both fields, not the id alone) so a peer reachable
    // at more than one address isn't silently merged into a single entry.
    let mut seen: HashSet<Peer> = HashSet::new();
    seen.insert(local);

    for peer in seed {
        if seen.insert(peer) {
            shortlist.push((peer, QueryState::Waiting));
        }
    }

    let mut pending = FuturesUnordered::new();

    loop {
        shortlist.sort_by_key(|(p, _)| p.id.distance(&target));
        for entry in shortlist.iter_mut() {
            if pending.len() >= parallelism {
                break;
            }
            if entry.1 != QueryState::Waiting {
                continue;
            }
            entry.1 = QueryState::Queried;
            let peer = entry.0;
            let request = if want_value {
                Request::FindValue(target)
            } else {
                Request::FindNode(target)
            };
            pending.push(async move {
                let res = client.send(peer.addr, local, request).await;
                (peer, res)
            });
        }

        let (peer, result) = match pending.next().await {
            Some(x) => x,
            None => break,
        };

        let discovered = match result {
            Ok(Response::FoundNode(peers)) => peers,
            Ok(Response::FoundValue(FindValueResponse::CloserPeers(peers))) => peers,
            Ok(Response::FoundValue(FindValueResponse::Value(value))) => {
                learn(peer);
                return Outcome::Value(value);
            }
            Ok(_) => {
                warn!(?peer, "unexpected response kind during lookup");
                Vec::new()
            }
            Err(err) => {
                debug!(?peer, %err, "lookup query failed");
                Vec::new()
            }
        };

        learn(peer);
        for candidate in discovered {
            if candidate.id != local_id && seen.insert(candidate) {
                shortlist.push((candidate, QueryState::Waiting));
            }
        }

        // Keep only the closest `bucket_size` candidates: the window the
        // lookup converges against, per the original paper.
        shortlist.sort_by_key(|(p, _)| p.id.distance(&target));
        shortlist.truncate(bucket_size);
    }

    shortlist.sort_by_key(|(p, _)| p.id.distance(&target));
    shortlist.truncate(bucket_size);
    Outcome::Nodes(shortlist.into_iter().map(|(p, _)| p).collect())
}
