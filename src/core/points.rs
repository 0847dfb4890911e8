//! Point identity and the thread-safe point collection.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::core::geometry::LatLng;
use crate::core::{read_lock, write_lock};

/// Stable opaque identifier for a point.
///
/// Identity is distinct from the coordinate: two markers at the same spot
/// are still two markers unless the host opts into coordinate
/// de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(u64);

impl PointId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for PointId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A map marker: a stable identity plus a coordinate.
///
/// Whether the point may be merged into clusters is not stored here; it is
/// asked of the injected policy at partition time, so policy changes take
/// effect on the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: PointId,
    position: LatLng,
}

impl Point {
    pub const fn new(id: PointId, position: LatLng) -> Self {
        Self { id, position }
    }

    pub const fn id(self) -> PointId {
        self.id
    }

    pub const fn position(self) -> LatLng {
        self.position
    }
}

/// Which notion of "the same point" governs de-duplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupPolicy {
    /// Points are equal when their identifiers are equal.
    #[default]
    Identifier,
    /// Points are equal when their coordinates are bitwise identical,
    /// regardless of identifier. This merges distinct markers that happen
    /// to share a spot; it exists for hosts that want snap-to-same-spot
    /// de-duplication.
    Coordinate,
}

impl DedupPolicy {
    fn matches(self, a: &Point, b: &Point) -> bool {
        match self {
            Self::Identifier => a.id() == b.id(),
            Self::Coordinate => a.position().bits() == b.position().bits(),
        }
    }
}

struct PointsInner {
    points: Vec<Point>,
    version: u64,
}

/// Thread-safe, insertion-ordered collection of input points.
///
/// Many snapshot readers may proceed concurrently; any mutation takes
/// exclusive access. Every successful mutation bumps a monotonically
/// increasing version counter, which is how downstream caches observe
/// staleness.
pub struct PointSet {
    dedup: DedupPolicy,
    inner: RwLock<PointsInner>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::with_dedup(DedupPolicy::default())
    }

    pub fn with_dedup(dedup: DedupPolicy) -> Self {
        Self {
            dedup,
            inner: RwLock::new(PointsInner {
                points: Vec::new(),
                version: 0,
            }),
        }
    }

    /// Adds a point. Returns `false` (and leaves the set unchanged) when a
    /// duplicate already exists under the active [`DedupPolicy`].
    pub fn add(&self, point: Point) -> bool {
        let mut inner = write_lock(&self.inner);
        if inner.points.iter().any(|p| self.dedup.matches(p, &point)) {
            return false;
        }
        inner.points.push(point);
        inner.version += 1;
        true
    }

    /// Removes the point matching `point` under the active [`DedupPolicy`].
    /// Returns `false` when no match was found; that is a no-op, not an
    /// error.
    pub fn remove(&self, point: &Point) -> bool {
        let mut inner = write_lock(&self.inner);
        match inner.points.iter().position(|p| self.dedup.matches(p, point)) {
            Some(index) => {
                inner.points.remove(index);
                inner.version += 1;
                true
            }
            None => false,
        }
    }

    /// Removes the point with the given identifier.
    pub fn remove_by_id(&self, id: PointId) -> bool {
        let mut inner = write_lock(&self.inner);
        match inner.points.iter().position(|p| p.id() == id) {
            Some(index) => {
                inner.points.remove(index);
                inner.version += 1;
                true
            }
            None => false,
        }
    }

    /// The points in insertion order.
    pub fn snapshot(&self) -> Vec<Point> {
        read_lock(&self.inner).points.clone()
    }

    /// The points in insertion order, plus the version the snapshot was
    /// taken at.
    pub fn versioned_snapshot(&self) -> (Vec<Point>, u64) {
        let inner = read_lock(&self.inner);
        (inner.points.clone(), inner.version)
    }

    /// Current mutation version. Bumped by every successful add or remove.
    pub fn version(&self) -> u64 {
        read_lock(&self.inner).version
    }

    pub fn len(&self) -> usize {
        read_lock(&self.inner).points.len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.inner).points.is_empty()
    }
}

impl Default for PointSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: u64, lat: f64, lng: f64) -> Point {
        Point::new(PointId::new(id), LatLng::new(lat, lng))
    }

    #[test]
    fn identifier_dedup_allows_shared_coordinates() {
        let set = PointSet::new();
        assert!(set.add(pt(1, 0.0, 0.0)));
        assert!(set.add(pt(2, 0.0, 0.0)));
        assert!(!set.add(pt(1, 5.0, 5.0)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn coordinate_dedup_merges_shared_coordinates() {
        let set = PointSet::with_dedup(DedupPolicy::Coordinate);
        assert!(set.add(pt(1, 0.0, 0.0)));
        assert!(!set.add(pt(2, 0.0, 0.0)));
        assert!(set.add(pt(3, 0.0, 1.0)));
        // Removal matches by coordinate too, whatever the identifier says.
        assert!(set.remove(&pt(9, 0.0, 1.0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn absent_remove_is_a_no_op() {
        let set = PointSet::new();
        assert!(set.add(pt(1, 0.0, 0.0)));
        assert!(!set.remove(&pt(2, 0.0, 0.0)));
        assert!(!set.remove_by_id(PointId::new(7)));
        assert_eq!(set.version(), 1);
    }

    #[test]
    fn version_bumps_only_on_successful_mutation() {
        let set = PointSet::new();
        assert_eq!(set.version(), 0);
        set.add(pt(1, 0.0, 0.0));
        assert_eq!(set.version(), 1);
        set.add(pt(1, 0.0, 0.0));
        assert_eq!(set.version(), 1);
        set.remove_by_id(PointId::new(1));
        assert_eq!(set.version(), 2);
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let set = PointSet::new();
        for id in [3, 1, 2] {
            set.add(pt(id, id as f64, 0.0));
        }
        let ids: Vec<u64> = set.snapshot().iter().map(|p| p.id().raw()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
