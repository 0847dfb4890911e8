//! Incremental clustering of geographic map markers.
//!
//! `marker-cluster` groups a dynamic set of geographic points into visual
//! clusters for rendering at varying zoom levels. Cluster membership is
//! recomputed off the caller's thread as points are added or removed or the
//! view changes, and each completed pass is reduced to an add/remove delta
//! against what the renderer currently displays, keeping redraw churn small.
//!
//! The engine never draws. It classifies points into protected, singleton,
//! and cluster buckets, diffs the outcome against the last committed visible
//! set, and hands the delta to a host callback on a single delivery thread.
//! Rendering, the host event loop, and projection/zoom derivation stay on
//! the host side of the boundary.
//!
//! ```
//! use marker_cluster::{ClusterEngine, GeoBounds, LatLng, Point, PointId, ViewState};
//!
//! let engine = ClusterEngine::default();
//! engine.on_complete(|delta| {
//!     println!("+{} -{}", delta.to_add.len(), delta.to_remove.len());
//! });
//!
//! engine.add(Point::new(PointId::new(1), LatLng::new(48.8500, 2.3500)));
//! engine.add(Point::new(PointId::new(2), LatLng::new(48.8501, 2.3501)));
//! engine.update_view(ViewState {
//!     zoom_scale: 1.0,
//!     zoom_level: 12,
//!     bounds: GeoBounds::new(48.0, 2.0, 49.0, 3.0),
//!     center: None,
//! });
//! ```

pub mod core;

pub use crate::core::diff::{diff_and_commit, display_key, Delta, DisplayKey, VisibleSet};
pub use crate::core::engine::ClusterEngine;
pub use crate::core::geometry::{GeoBounds, LatLng};
pub use crate::core::neighbors::{
    build_neighborhoods, NeighborCache, NeighborEntry, NeighborMap, PointNeighborhood,
};
pub use crate::core::partition::{
    default_cell_size, distance_threshold, partition, ClusterGroup, ClusterPolicy,
    ClusterPosition, DisplayItem, EngineConfig, PartitionParams, PartitionResult,
};
pub use crate::core::points::{DedupPolicy, Point, PointId, PointSet};
pub use crate::core::schedule::{DeltaCallback, PassContext, RecomputeScheduler, ViewState};
