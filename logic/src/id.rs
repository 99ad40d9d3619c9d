use std::fmt;

use rand::Rng;
use sha1::{Digest, Sha1};

use crate::consts::ID_LEN;

/// A 160-bit opaque identifier, shared by nodes and content.
///
/// Two ids are compared by [`Id::distance`] (bytewise XOR, read as a
/// big-endian unsigned integer) everywhere except `Ord`/`PartialOrd`, which
/// are a plain lexicographic byte comparison used only to break ties
/// deterministically when two peers sit at the same distance from a target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; ID_LEN]);

impl Id {
    pub const ZERO: Id = Id([0u8; ID_LEN]);

    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Id(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Draws a uniformly random id. Birthday collisions are assumed
    /// negligible at the expected scale of the network.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut id = [0u8; ID_LEN];
        rng.fill(&mut id);
        Id(id)
    }

    /// Derives a content identifier as the SHA-1 digest of `data`.
    ///
    /// SHA-1 is used for wire-format compatibility, not as a security
    /// property: collision resistance is not required here.
    pub fn of_content(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&digest);
        Id(id)
    }

    /// Bytewise XOR distance between two ids, itself an [`Id`] so it can be
    /// compared lexicographically (a 160-bit unsigned integer ordering).
    pub fn distance(&self, other: &Id) -> Id {
        let mut out = [0u8; ID_LEN];
        for i in 0..ID_LEN {
            out[i] = self.0[i] ^ other.0[i];
        }
        Id(out)
    }

    /// Number of leading bits shared between `self` and `other`, in
    /// `[0, 160]`. Equal ids share all 160 bits.
    pub fn shared_prefix_len(&self, other: &Id) -> u32 {
        let mut count = 0u32;
        for i in 0..ID_LEN {
            let xor = self.0[i] ^ other.0[i];
            if xor == 0 {
                count += 8;
                continue;
            }
            count += xor.leading_zeros();
            break;
        }
        count
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut id = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut id)?;
        Ok(Id(id))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.to_hex()).finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Id {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[u8; ID_LEN]>::deserialize(deserializer).map(Id)
    }
}
