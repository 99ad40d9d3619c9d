/// Size of an [`crate::Id`] in bytes (160 bits).
pub const ID_LEN: usize = 20;

/// Size of an [`crate::Id`] in bits, i.e. the number of buckets in a
/// [`crate::RoutingTable`].
pub const ID_LEN_BITS: usize = ID_LEN * 8;

/// Size of a DHT value in bytes.
pub const VALUE_LEN: usize = 1024;
