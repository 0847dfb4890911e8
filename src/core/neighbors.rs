//! Full pairwise neighbor cache.
//!
//! Each point gets an ordered list of every other point with a precomputed
//! distance. The cache is invalidated wholesale by any point-set mutation
//! and rebuilt in one parallel sweep; it is never patched incrementally.
//! Correctness (never serving distances for a since-removed point) is
//! prioritized over recomputation cost, since rebuilds are driven only by
//! discrete edits, not by every view change.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rayon::prelude::*;

use crate::core::points::{Point, PointId};
use crate::core::{read_lock, write_lock};

/// Another point together with its cached distance from the owner, in
/// meters.
#[derive(Debug, Clone, Copy)]
pub struct NeighborEntry {
    pub point: Point,
    pub distance: f64,
}

/// A point plus all other points, ascending by distance. Distance ties are
/// broken by identifier so the ordering is deterministic.
#[derive(Debug, Clone)]
pub struct PointNeighborhood {
    pub point: Point,
    pub neighbors: Vec<NeighborEntry>,
}

impl PointNeighborhood {
    /// Neighbors whose cached distance is strictly below `threshold`.
    pub fn within(&self, threshold: f64) -> impl Iterator<Item = &NeighborEntry> + '_ {
        self.neighbors
            .iter()
            .take_while(move |entry| entry.distance < threshold)
    }
}

/// Map from a point's identifier to its neighborhood.
pub type NeighborMap = HashMap<PointId, PointNeighborhood>;

/// Computes the full O(n²) pairwise neighborhood map for `points`.
pub fn build_neighborhoods(points: &[Point]) -> NeighborMap {
    points
        .par_iter()
        .map(|&point| {
            let mut neighbors: Vec<NeighborEntry> = points
                .iter()
                .filter(|other| other.id() != point.id())
                .map(|&other| NeighborEntry {
                    point: other,
                    distance: point.position().distance_to(other.position()),
                })
                .collect();
            neighbors.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.point.id().cmp(&b.point.id()))
            });
            (
                point.id(),
                PointNeighborhood {
                    point,
                    neighbors,
                },
            )
        })
        .collect()
}

struct CacheInner {
    built_version: Option<u64>,
    map: Arc<NeighborMap>,
}

/// Version-tagged cache of every point's neighborhood.
///
/// A pass obtains the map with [`NeighborCache::get_or_build`] and publishes
/// a rebuild with [`NeighborCache::commit`] only once it knows it has not
/// been superseded, so a cancelled pass leaves the cache exactly as it found
/// it.
pub struct NeighborCache {
    inner: RwLock<CacheInner>,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                built_version: None,
                map: Arc::new(NeighborMap::new()),
            }),
        }
    }

    /// Whether the cache is stale relative to the given point-set version.
    pub fn is_dirty(&self, version: u64) -> bool {
        read_lock(&self.inner).built_version != Some(version)
    }

    /// The neighborhood map for `points` at `version`: the cached map when
    /// the version matches, otherwise a freshly computed one that has NOT
    /// been committed. The flag reports whether a rebuild happened.
    pub fn get_or_build(&self, points: &[Point], version: u64) -> (Arc<NeighborMap>, bool) {
        {
            let inner = read_lock(&self.inner);
            if inner.built_version == Some(version) {
                return (Arc::clone(&inner.map), false);
            }
        }
        (Arc::new(build_neighborhoods(points)), true)
    }

    /// Publishes a rebuilt map for `version`.
    pub fn commit(&self, version: u64, map: Arc<NeighborMap>) {
        let mut inner = write_lock(&self.inner);
        inner.built_version = Some(version);
        inner.map = map;
    }

    /// Rebuilds and commits in one step when stale. The simple entry point
    /// for hosts using the cache outside the scheduler's cancellation
    /// protocol.
    pub fn rebuild_if_dirty(&self, points: &[Point], version: u64) -> Arc<NeighborMap> {
        let (map, rebuilt) = self.get_or_build(points, version);
        if rebuilt {
            self.commit(version, Arc::clone(&map));
        }
        map
    }

    /// Ordered neighbor list for `id`; empty when the point is unknown.
    pub fn neighbors_of(&self, id: PointId) -> Vec<NeighborEntry> {
        read_lock(&self.inner)
            .map
            .get(&id)
            .map(|hood| hood.neighbors.clone())
            .unwrap_or_default()
    }
}

impl Default for NeighborCache {
    fn default() -> Self {
        Self::new()
    }
}
