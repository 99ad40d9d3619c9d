use crate::{peer::Peer, value::Value, Id};

/// The wire-agnostic request vocabulary (§4, §6). A [`crate::client::PeerClient`]
/// carries one of these to a remote peer and gets back the matching
/// [`Response`]; the actual bytes-on-the-wire encoding is the transport
/// crate's concern, not this one's.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request {
    Ping,
    FindNode(Id),
    FindValue(Id),
    Store(Id, Value),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    /// Carries the responder's own id, since a PING is also how a fresh
    /// peer (e.g. a bootstrap target) first identifies itself (§4.5).
    Pong(Id),
    FoundNode(Vec<Peer>),
    FoundValue(FindValueResponse),
    Stored(bool),
}

/// A FIND_VALUE answer is either the value itself or the closest peers
/// known, mirroring the original's "value, else closer nodes" behaviour
/// (§4.4).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FindValueResponse {
    Value(Value),
    CloserPeers(Vec<Peer>),
}
