//! The greedy partitioning algorithm and its result types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::geometry::LatLng;
use crate::core::neighbors::NeighborMap;
use crate::core::partition::{ClusterPolicy, ClusterPosition};
use crate::core::points::{Point, PointId};

/// A group of points merged into one representative display item.
///
/// The identifier is only meaningful within the pass that produced the
/// group; it is not stable across passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGroup {
    id: usize,
    members: Vec<Point>,
}

impl ClusterGroup {
    /// Normally produced by [`partition`]; public so hosts and tests can
    /// fabricate groups directly.
    pub fn new(id: usize, members: Vec<Point>) -> Self {
        Self { id, members }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn members(&self) -> &[Point] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Arithmetic mean of member latitudes and longitudes. An approximation:
    /// no wraparound or antimeridian correction is applied.
    pub fn centroid(&self) -> LatLng {
        let count = self.members.len() as f64;
        let (lat, lng) = self
            .members
            .iter()
            .fold((0.0, 0.0), |(lat, lng), member| {
                (lat + member.position().lat, lng + member.position().lng)
            });
        LatLng::new(lat / count, lng / count)
    }

    pub(crate) fn member_ids_sorted(&self) -> Vec<PointId> {
        let mut ids: Vec<PointId> = self.members.iter().map(|m| m.id()).collect();
        ids.sort_unstable();
        ids
    }
}

/// One renderer-facing unit: a raw point, or a synthesized cluster
/// representative carrying its member points and computed coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisplayItem {
    Point(Point),
    Cluster { group: ClusterGroup, position: LatLng },
}

impl DisplayItem {
    /// Where the item is drawn.
    pub fn position(&self) -> LatLng {
        match self {
            Self::Point(point) => point.position(),
            Self::Cluster { position, .. } => *position,
        }
    }
}

/// The three disjoint buckets produced by one partition pass.
///
/// Every input point appears in exactly one bucket; under the max-zoom
/// pass-through every point lands in the singleton bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionResult {
    /// Points the policy excludes from clustering. Never merged, never
    /// removed by visibility rules.
    pub protected: Vec<Point>,
    /// Points displayed individually.
    pub singletons: Vec<Point>,
    /// Merged groups, each displayed as one representative.
    pub clusters: Vec<ClusterGroup>,
}

impl PartitionResult {
    /// Number of input points covered by the three buckets.
    pub fn point_count(&self) -> usize {
        self.protected.len()
            + self.singletons.len()
            + self.clusters.iter().map(ClusterGroup::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.protected.is_empty() && self.singletons.is_empty() && self.clusters.is_empty()
    }

    /// Flattens the buckets into renderer-facing display items, one per
    /// protected point, singleton, and cluster group.
    pub fn display_items(&self, strategy: ClusterPosition) -> Vec<DisplayItem> {
        let mut items =
            Vec::with_capacity(self.protected.len() + self.singletons.len() + self.clusters.len());
        items.extend(self.protected.iter().copied().map(DisplayItem::Point));
        items.extend(self.singletons.iter().copied().map(DisplayItem::Point));
        items.extend(self.clusters.iter().map(|group| DisplayItem::Cluster {
            position: strategy.position_of(group),
            group: group.clone(),
        }));
        items
    }
}

/// Inputs for one partition pass.
#[derive(Debug)]
pub struct PartitionParams<'a> {
    /// Maximum pairwise distance (meters) within which points may merge,
    /// exclusive.
    pub distance_threshold: f64,
    /// Merged-point count that must be exceeded before a cluster forms.
    pub min_cluster_size: usize,
    /// Zoom level past which clustering is suspended.
    pub max_zoom_level: u32,
    pub current_zoom_level: u32,
    /// Processing-order reference (typically the view center); insertion
    /// order when absent.
    pub reference: Option<LatLng>,
    pub policy: &'a ClusterPolicy,
}

/// Partitions `points` into protected points, singletons, and cluster
/// groups.
///
/// The sweep is greedy and order-dependent by design: points are processed
/// in ascending distance from `reference` (stable, so insertion order breaks
/// ties and applies when no reference is supplied), and a candidate within
/// threshold of several not-yet-used points is claimed by whichever of them
/// is processed first. No globally optimal grouping is attempted.
///
/// `neighborhoods` must have been built against the same snapshot as
/// `points`; a point missing from it simply gathers no candidates.
pub fn partition(
    points: &[Point],
    neighborhoods: &NeighborMap,
    params: &PartitionParams,
) -> PartitionResult {
    let mut result = PartitionResult::default();
    if points.is_empty() {
        return result;
    }

    // No clustering at very close zoom: every point passes through.
    if params.current_zoom_level > params.max_zoom_level {
        result.singletons.extend(points.iter().copied());
        return result;
    }

    let ordered: Vec<Point> = match params.reference {
        Some(center) => {
            let mut ordered = points.to_vec();
            ordered.sort_by(|a, b| {
                let da = center.distance_to(a.position());
                let db = center.distance_to(b.position());
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
            ordered
        }
        None => points.to_vec(),
    };

    let mut used: HashSet<PointId> = HashSet::with_capacity(points.len());
    for point in &ordered {
        if used.contains(&point.id()) {
            continue;
        }

        if !params.policy.should_cluster(point) {
            used.insert(point.id());
            result.protected.push(*point);
            continue;
        }

        // Candidates must themselves be clusterable: a protected point is
        // never claimed as a member, whatever the processing order.
        let candidates: Vec<Point> = neighborhoods
            .get(&point.id())
            .map(|hood| {
                hood.within(params.distance_threshold)
                    .filter(|entry| {
                        !used.contains(&entry.point.id())
                            && params.policy.should_cluster(&entry.point)
                    })
                    .map(|entry| entry.point)
                    .collect()
            })
            .unwrap_or_default();

        used.insert(point.id());
        used.extend(candidates.iter().map(|candidate| candidate.id()));

        if 1 + candidates.len() > params.min_cluster_size {
            let mut members = Vec::with_capacity(1 + candidates.len());
            members.push(*point);
            members.extend(candidates);
            result
                .clusters
                .push(ClusterGroup::new(result.clusters.len(), members));
        } else {
            result.singletons.push(*point);
            result.singletons.extend(candidates);
        }
    }

    result
}
