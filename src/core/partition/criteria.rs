//! Policy hooks, configuration, and distance-threshold derivation.

use serde::{Deserialize, Serialize};

use crate::core::geometry::LatLng;
use crate::core::partition::ClusterGroup;
use crate::core::points::{DedupPolicy, Point};

/// Spacing constant for wide views.
pub const WIDE_VIEW_SPACING: f64 = 88.0;

/// Spacing constant for detailed views.
pub const DETAIL_VIEW_SPACING: f64 = 16.0;

/// Tiered fallback spacing used when the host declines to override.
pub fn default_cell_size(zoom_level: u32) -> f64 {
    match zoom_level {
        13..=15 => 64.0,
        16..=18 => 32.0,
        z if z >= 19 => DETAIL_VIEW_SPACING,
        _ => WIDE_VIEW_SPACING,
    }
}

/// Host-injected clustering policy: two independent function-valued hooks
/// with stated defaults, rather than an inheritable interface.
pub struct ClusterPolicy {
    should_cluster: Box<dyn Fn(&Point) -> bool + Send + Sync>,
    cell_size: Box<dyn Fn(u32) -> Option<f64> + Send + Sync>,
}

impl ClusterPolicy {
    /// The default policy: every point may cluster, and the engine's tiered
    /// cell sizes apply.
    pub fn new() -> Self {
        Self {
            should_cluster: Box::new(|_| true),
            cell_size: Box::new(|_| None),
        }
    }

    /// Overrides which points may be merged into clusters. Points the hook
    /// rejects are protected: never merged, never torn down by visibility
    /// rules.
    pub fn with_should_cluster(
        mut self,
        hook: impl Fn(&Point) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_cluster = Box::new(hook);
        self
    }

    /// Overrides the spacing constant per zoom level. Returning `None`
    /// falls back to the configured constant, then the tiered defaults.
    pub fn with_cell_size(mut self, hook: impl Fn(u32) -> Option<f64> + Send + Sync + 'static) -> Self {
        self.cell_size = Box::new(hook);
        self
    }

    pub fn should_cluster(&self, point: &Point) -> bool {
        (self.should_cluster)(point)
    }

    pub fn cell_size(&self, zoom_level: u32) -> Option<f64> {
        (self.cell_size)(zoom_level)
    }
}

impl Default for ClusterPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClusterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("ClusterPolicy")
    }
}

/// How a cluster representative's coordinate is derived from its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterPosition {
    /// Arithmetic mean of member latitudes and longitudes. No antimeridian
    /// correction.
    #[default]
    MeanCenter,
}

impl ClusterPosition {
    /// Representative coordinate for `group` under this strategy.
    pub fn position_of(self, group: &ClusterGroup) -> LatLng {
        match self {
            Self::MeanCenter => group.centroid(),
        }
    }
}

/// Engine configuration. Every field has a host-overridable default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Merged-point count that must be exceeded before a cluster forms.
    pub min_cluster_size: usize,
    /// Keep items that fell out of the result but sit outside the viewport,
    /// instead of tearing them down.
    pub retain_offscreen: bool,
    /// Fixed spacing constant k; `None` falls back to the tiered table.
    pub threshold_scale: Option<f64>,
    /// Zoom level past which clustering is suspended.
    pub max_zoom_level: u32,
    /// Cluster representative placement strategy.
    pub position_strategy: ClusterPosition,
    /// Identity notion used for point de-duplication.
    pub dedup_policy: DedupPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            retain_offscreen: true,
            threshold_scale: None,
            max_zoom_level: 20,
            position_strategy: ClusterPosition::default(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_min_cluster_size(mut self, count: usize) -> Self {
        self.min_cluster_size = count;
        self
    }

    pub fn with_retain_offscreen(mut self, retain: bool) -> Self {
        self.retain_offscreen = retain;
        self
    }

    pub fn with_threshold_scale(mut self, k: f64) -> Self {
        self.threshold_scale = Some(k);
        self
    }

    pub fn with_max_zoom_level(mut self, zoom_level: u32) -> Self {
        self.max_zoom_level = zoom_level;
        self
    }

    pub fn with_dedup_policy(mut self, dedup: DedupPolicy) -> Self {
        self.dedup_policy = dedup;
        self
    }
}

/// Distance threshold for one pass: `k / zoom_scale`, where k resolves from
/// the host's cell-size override, then the configured constant, then the
/// tiered table.
pub fn distance_threshold(
    zoom_scale: f64,
    zoom_level: u32,
    policy: &ClusterPolicy,
    config: &EngineConfig,
) -> f64 {
    let k = policy
        .cell_size(zoom_level)
        .or(config.threshold_scale)
        .unwrap_or_else(|| default_cell_size(zoom_level));
    k / zoom_scale
}
