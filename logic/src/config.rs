use std::time::Duration;

/// Tunables for the routing table (§6's bucket capacity).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RoutingConfig {
    // Also called k in the original paper: bucket capacity and the size of
    // the result set returned by FIND_NODE/FIND_VALUE.
    pub bucket_size: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { bucket_size: 20 }
    }
}

/// Tunables for the local value store.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StorageConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_entries: 65536,
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Tunables for the iterative lookup engine (§4.6).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SearchConfig {
    // Also called alpha in the original paper: query concurrency per round.
    pub parallelism: usize,
    pub max_replicas: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            parallelism: 3,
            max_replicas: 5,
        }
    }
}

/// Tunables governing periodic maintenance (§4.8).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MaintenanceConfig {
    pub routing_sweep_period: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            routing_sweep_period: Duration::from_secs(60 * 10),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SystemConfig {
    pub routing: RoutingConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub maintenance: MaintenanceConfig,
}
