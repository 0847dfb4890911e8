//! Serialized, supersession-cancellable recompute scheduling.
//!
//! At most one clustering pass executes at a time, on a dedicated worker
//! thread. A new request always supersedes a still-running older one: every
//! request captures the generation counter, and the pass re-checks it at
//! coarse checkpoints, abandoning silently when it has lost. A superseded
//! pass commits nothing, so from the outside it is indistinguishable from
//! never having run. Completed deltas are delivered on a single delivery
//! thread, decoupled from the worker, so renderer calls stay serialized.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::core::diff::{diff_and_commit, Delta, VisibleSet};
use crate::core::geometry::{GeoBounds, LatLng};
use crate::core::neighbors::NeighborCache;
use crate::core::partition::{
    distance_threshold, partition, ClusterPolicy, EngineConfig, PartitionParams,
};
use crate::core::points::PointSet;
use crate::core::{lock, write_lock};

/// Host-supplied view of the map at the time of a recompute request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    /// Positive zoom scale; larger means more zoomed in.
    pub zoom_scale: f64,
    pub zoom_level: u32,
    /// Visible region, consumed by the retain-offscreen policy.
    pub bounds: GeoBounds,
    /// Optional reference coordinate for the partition processing order.
    pub center: Option<LatLng>,
}

/// Callback invoked with the delta of each completed, non-superseded pass.
pub type DeltaCallback = Box<dyn Fn(Delta) + Send + 'static>;

/// The shared state a pass reads and commits.
pub struct PassContext {
    pub points: Arc<PointSet>,
    pub cache: Arc<NeighborCache>,
    pub visible: Arc<RwLock<VisibleSet>>,
    pub policy: Arc<ClusterPolicy>,
    pub config: EngineConfig,
}

struct PassRequest {
    generation: u64,
    view: ViewState,
}

struct SchedulerShared {
    generation: AtomicU64,
    pending: Mutex<Option<PassRequest>>,
    wakeup: Condvar,
    shutdown: AtomicBool,
}

/// Serializes clustering passes and guarantees that only the latest
/// request's result is applied.
pub struct RecomputeScheduler {
    shared: Arc<SchedulerShared>,
    callback: Arc<Mutex<Option<DeltaCallback>>>,
    delta_tx: Option<Sender<Delta>>,
    worker: Option<JoinHandle<()>>,
    delivery: Option<JoinHandle<()>>,
}

impl RecomputeScheduler {
    pub fn new(ctx: PassContext) -> Self {
        let shared = Arc::new(SchedulerShared {
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
            wakeup: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let callback: Arc<Mutex<Option<DeltaCallback>>> = Arc::new(Mutex::new(None));
        let (delta_tx, delta_rx) = mpsc::channel::<Delta>();

        // The one execution context the boundary ever hears from.
        let delivery = {
            let callback = Arc::clone(&callback);
            std::thread::spawn(move || {
                while let Ok(delta) = delta_rx.recv() {
                    match lock(&callback).as_ref() {
                        Some(callback) => callback(delta),
                        None => debug!("dropping delta: no completion callback registered"),
                    }
                }
            })
        };

        let worker = {
            let shared = Arc::clone(&shared);
            let delta_tx = delta_tx.clone();
            std::thread::spawn(move || worker_loop(&shared, &ctx, &delta_tx))
        };

        Self {
            shared,
            callback,
            delta_tx: Some(delta_tx),
            worker: Some(worker),
            delivery: Some(delivery),
        }
    }

    /// Registers the completion callback, replacing any previous one.
    pub fn on_complete(&self, callback: DeltaCallback) {
        *lock(&self.callback) = Some(callback);
    }

    /// Cancels any in-flight pass and enqueues a new one for `view`. Never
    /// blocks on the computation.
    pub fn request(&self, view: ViewState) {
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        trace!("recompute requested, generation {generation}");
        let mut pending = lock(&self.shared.pending);
        *pending = Some(PassRequest { generation, view });
        self.shared.wakeup.notify_one();
    }

    /// Cancels any in-flight pass without scheduling a replacement. Used by
    /// point mutations arriving before any view is known.
    pub fn invalidate(&self) {
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for RecomputeScheduler {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wakeup.notify_all();
        drop(self.delta_tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Some(delivery) = self.delivery.take() {
            let _ = delivery.join();
        }
    }
}

fn worker_loop(shared: &SchedulerShared, ctx: &PassContext, delta_tx: &Sender<Delta>) {
    loop {
        let request = {
            let mut pending = lock(&shared.pending);
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                match pending.take() {
                    Some(request) => break request,
                    None => {
                        pending = shared
                            .wakeup
                            .wait(pending)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                }
            }
        };
        if let Some(delta) = run_pass(shared, ctx, &request) {
            if delta_tx.send(delta).is_err() {
                return;
            }
        }
    }
}

/// One clustering pass with cooperative cancellation checkpoints. Returns
/// `None` when superseded; a superseded pass leaves the neighbor cache and
/// the committed visible set exactly as it found them.
fn run_pass(shared: &SchedulerShared, ctx: &PassContext, request: &PassRequest) -> Option<Delta> {
    let still_wanted = || shared.generation.load(Ordering::Acquire) == request.generation;
    if !still_wanted() {
        trace!("pass {} superseded before start", request.generation);
        return None;
    }

    let (snapshot, version) = ctx.points.versioned_snapshot();
    let (neighborhoods, rebuilt) = ctx.cache.get_or_build(&snapshot, version);
    if !still_wanted() {
        trace!("pass {} superseded after neighbor rebuild", request.generation);
        return None;
    }

    let threshold = distance_threshold(
        request.view.zoom_scale,
        request.view.zoom_level,
        &ctx.policy,
        &ctx.config,
    );
    let params = PartitionParams {
        distance_threshold: threshold,
        min_cluster_size: ctx.config.min_cluster_size,
        max_zoom_level: ctx.config.max_zoom_level,
        current_zoom_level: request.view.zoom_level,
        reference: request.view.center,
        policy: &ctx.policy,
    };
    let result = partition(&snapshot, &neighborhoods, &params);
    if !still_wanted() {
        trace!("pass {} superseded after partition", request.generation);
        return None;
    }

    let items = result.display_items(ctx.config.position_strategy);
    let mut visible = write_lock(&ctx.visible);
    // Last checkpoint. A supersession arriving after this point races the
    // commit and may deliver a valid-but-outdated result; the next pass
    // corrects it.
    if !still_wanted() {
        trace!("pass {} superseded before commit", request.generation);
        return None;
    }
    if rebuilt {
        ctx.cache.commit(version, Arc::clone(&neighborhoods));
    }
    let delta = diff_and_commit(
        &mut visible,
        items,
        ctx.config.retain_offscreen,
        Some(&request.view.bounds),
    );
    debug!(
        "pass {} committed: +{} -{} ({} visible)",
        request.generation,
        delta.to_add.len(),
        delta.to_remove.len(),
        visible.len()
    );
    Some(delta)
}
