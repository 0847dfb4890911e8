//! The public facade wiring the point set, neighbor cache, partitioner,
//! differ, and scheduler together.

use std::sync::{Arc, Mutex, RwLock};

use crate::core::diff::{Delta, VisibleSet};
use crate::core::lock;
use crate::core::neighbors::{NeighborCache, NeighborEntry};
use crate::core::partition::{ClusterPolicy, DisplayItem, EngineConfig};
use crate::core::points::{Point, PointId, PointSet};
use crate::core::read_lock;
use crate::core::schedule::{PassContext, RecomputeScheduler, ViewState};

/// The clustering engine.
///
/// Point mutations and view changes are fire-and-forget: they cancel any
/// in-flight pass and, once a view is known, schedule a fresh one off the
/// caller's thread. Completion is observed only through the callback
/// registered with [`ClusterEngine::on_complete`].
pub struct ClusterEngine {
    points: Arc<PointSet>,
    cache: Arc<NeighborCache>,
    visible: Arc<RwLock<VisibleSet>>,
    scheduler: RecomputeScheduler,
    last_view: Mutex<Option<ViewState>>,
}

impl ClusterEngine {
    pub fn new(config: EngineConfig, policy: ClusterPolicy) -> Self {
        let points = Arc::new(PointSet::with_dedup(config.dedup_policy));
        let cache = Arc::new(NeighborCache::new());
        let visible = Arc::new(RwLock::new(VisibleSet::new()));
        let scheduler = RecomputeScheduler::new(PassContext {
            points: Arc::clone(&points),
            cache: Arc::clone(&cache),
            visible: Arc::clone(&visible),
            policy: Arc::new(policy),
            config,
        });
        Self {
            points,
            cache,
            visible,
            scheduler,
            last_view: Mutex::new(None),
        }
    }

    /// Registers the renderer callback. Each completed, non-superseded pass
    /// delivers its delta here, always on the same delivery thread.
    pub fn on_complete(&self, callback: impl Fn(Delta) + Send + 'static) {
        self.scheduler.on_complete(Box::new(callback));
    }

    /// Adds a point. Returns `false` on a duplicate (see
    /// [`crate::DedupPolicy`]).
    pub fn add(&self, point: Point) -> bool {
        let added = self.points.add(point);
        if added {
            self.reschedule();
        }
        added
    }

    /// Removes a matching point; `false` when absent.
    pub fn remove(&self, point: &Point) -> bool {
        let removed = self.points.remove(point);
        if removed {
            self.reschedule();
        }
        removed
    }

    /// Removes the point with the given identifier; `false` when absent.
    pub fn remove_by_id(&self, id: PointId) -> bool {
        let removed = self.points.remove_by_id(id);
        if removed {
            self.reschedule();
        }
        removed
    }

    /// Records the current view and schedules a pass for it, superseding
    /// any pass still in flight.
    pub fn update_view(&self, view: ViewState) {
        *lock(&self.last_view) = Some(view.clone());
        self.scheduler.request(view);
    }

    /// Re-runs clustering for the last known view. Returns `false` when no
    /// view has been supplied yet.
    pub fn request_recompute(&self) -> bool {
        match lock(&self.last_view).clone() {
            Some(view) => {
                self.scheduler.request(view);
                true
            }
            None => false,
        }
    }

    fn reschedule(&self) {
        match lock(&self.last_view).clone() {
            Some(view) => self.scheduler.request(view),
            None => self.scheduler.invalidate(),
        }
    }

    /// The display items last committed at the boundary.
    pub fn visible_items(&self) -> Vec<DisplayItem> {
        read_lock(&self.visible).items()
    }

    /// The current points in insertion order.
    pub fn snapshot(&self) -> Vec<Point> {
        self.points.snapshot()
    }

    /// Cached neighbor list for a point; empty when the point is unknown or
    /// no pass has built the cache yet.
    pub fn neighbors_of(&self, id: PointId) -> Vec<NeighborEntry> {
        self.cache.neighbors_of(id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), ClusterPolicy::default())
    }
}
