use std::fmt;

use crate::consts::VALUE_LEN;

/// A fixed-length DHT value. Payloads shorter than [`VALUE_LEN`] are
/// zero-padded; callers that care about the effective length (e.g. the
/// chunk/tree codec) carry it out-of-band or in a header they define.
#[derive(Clone, PartialEq, Eq)]
pub struct Value(Box<[u8; VALUE_LEN]>);

impl Value {
    pub const LEN: usize = VALUE_LEN;

    pub fn zeroed() -> Self {
        Value(Box::new([0u8; VALUE_LEN]))
    }

    /// Builds a value from a payload no longer than [`VALUE_LEN`],
    /// zero-padding the remainder.
    pub fn from_payload(payload: &[u8]) -> Self {
        assert!(payload.len() <= VALUE_LEN, "payload exceeds value size");
        let mut bytes = [0u8; VALUE_LEN];
        bytes[..payload.len()].copy_from_slice(payload);
        Value(Box::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; VALUE_LEN] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; VALUE_LEN] {
        &mut self.0
    }

    pub fn into_bytes(self) -> Box<[u8; VALUE_LEN]> {
        self.0
    }
}

impl From<[u8; VALUE_LEN]> for Value {
    fn from(bytes: [u8; VALUE_LEN]) -> Self {
        Value(Box::new(bytes))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({} bytes)", VALUE_LEN)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(self.0.as_slice(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde_bytes::deserialize(deserializer)?;
        let arr: [u8; VALUE_LEN] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("value must be exactly 1024 bytes"))?;
        Ok(Value(Box::new(arr)))
    }
}
