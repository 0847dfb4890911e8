//! Greedy aggregation of points into protected, singleton, and cluster
//! buckets, plus the policy hooks and threshold derivation that
//! parameterize it.

mod _partition;
mod criteria;

pub use _partition::{partition, ClusterGroup, DisplayItem, PartitionParams, PartitionResult};
pub use criteria::{
    default_cell_size, distance_threshold, ClusterPolicy, ClusterPosition, EngineConfig,
    DETAIL_VIEW_SPACING, WIDE_VIEW_SPACING,
};
