#![allow(dead_code)]

//! Utility functions for tests.

use marker_cluster::{
    build_neighborhoods, ClusterPolicy, GeoBounds, LatLng, NeighborMap, PartitionParams, Point,
    PointId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shorthand point constructor.
pub fn pt(id: u64, lat: f64, lng: f64) -> Point {
    Point::new(PointId::new(id), LatLng::new(lat, lng))
}

/// `n` points uniformly scattered over a ~10 km box around the origin.
pub fn scattered_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            pt(
                i as u64,
                rng.gen_range(-0.05..0.05),
                rng.gen_range(-0.05..0.05),
            )
        })
        .collect()
}

/// Three tight groups of five points (~1.1 m spacing within a group), with
/// the groups more than 100 km apart from each other.
pub fn three_groups() -> Vec<Point> {
    let centers = [(0.0, 0.0), (1.0, 1.0), (-1.0, 2.0)];
    let mut points = Vec::new();
    for (group, &(lat, lng)) in centers.iter().enumerate() {
        for i in 0..5 {
            let id = (group * 5 + i) as u64;
            points.push(pt(id, lat + i as f64 * 1e-5, lng));
        }
    }
    points
}

/// Partition parameters with a wide-open zoom window and no reference
/// coordinate: processing order is insertion order.
pub fn params(threshold: f64, min_cluster_size: usize, policy: &ClusterPolicy) -> PartitionParams<'_> {
    PartitionParams {
        distance_threshold: threshold,
        min_cluster_size,
        max_zoom_level: 20,
        current_zoom_level: 10,
        reference: None,
        policy,
    }
}

pub fn neighborhoods(points: &[Point]) -> NeighborMap {
    build_neighborhoods(points)
}

pub fn world() -> GeoBounds {
    GeoBounds::world()
}
