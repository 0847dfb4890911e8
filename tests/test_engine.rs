use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use marker_cluster::{
    ClusterEngine, ClusterPolicy, Delta, DisplayItem, EngineConfig, PointId, ViewState,
};

mod utils;

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn view(zoom_level: u32) -> ViewState {
    ViewState {
        zoom_scale: 1.0,
        zoom_level,
        bounds: utils::world(),
        center: None,
    }
}

fn engine_with_channel(
    config: EngineConfig,
    policy: ClusterPolicy,
) -> (ClusterEngine, mpsc::Receiver<Delta>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = ClusterEngine::new(config, policy);
    let (tx, rx) = mpsc::channel();
    engine.on_complete(move |delta| {
        let _ = tx.send(delta);
    });
    (engine, rx)
}

#[test]
fn end_to_end_cluster_and_deltas() {
    let config = EngineConfig::default().with_min_cluster_size(1);
    let (engine, rx) = engine_with_channel(config, ClusterPolicy::default());

    assert!(engine.add(utils::pt(1, 0.0, 0.0)));
    assert!(engine.add(utils::pt(2, 0.0, 0.0001)));
    assert!(engine.add(utils::pt(3, 50.0, 50.0)));
    assert!(!engine.add(utils::pt(1, 9.0, 9.0)));

    // Zoom 12 resolves to the wide-view spacing: 88 m, enough to merge the
    // ~11 m pair and leave the outlier alone.
    engine.update_view(view(12));
    let delta = rx.recv_timeout(RECV_TIMEOUT).expect("first pass delivers");

    assert_eq!(delta.to_add.len(), 2);
    assert!(delta.to_remove.is_empty());
    let cluster = delta
        .to_add
        .iter()
        .find_map(|item| match item {
            DisplayItem::Cluster { group, .. } => Some(group),
            DisplayItem::Point(_) => None,
        })
        .expect("one cluster representative");
    let mut members: Vec<u64> = cluster.members().iter().map(|p| p.id().raw()).collect();
    members.sort_unstable();
    assert_eq!(members, vec![1, 2]);
    assert_eq!(engine.visible_items().len(), 2);

    // The committed pass also published the neighbor cache.
    assert_eq!(engine.neighbors_of(PointId::new(1)).len(), 2);
    assert!(engine.neighbors_of(PointId::new(99)).is_empty());

    // A later mutation triggers a fresh pass against the recorded view.
    assert!(engine.add(utils::pt(4, 10.0, 10.0)));
    let delta = rx.recv_timeout(RECV_TIMEOUT).expect("second pass delivers");
    assert_eq!(delta.to_add.len(), 1);
    assert!(delta.to_remove.is_empty());
    assert_eq!(engine.visible_items().len(), 3);

    // Removal tears the marker down (the world viewport keeps everything
    // on-screen, so retention does not apply).
    assert!(engine.remove_by_id(PointId::new(4)));
    let delta = rx.recv_timeout(RECV_TIMEOUT).expect("third pass delivers");
    assert!(delta.to_add.is_empty());
    assert_eq!(delta.to_remove.len(), 1);
    assert_eq!(engine.visible_items().len(), 2);
}

#[test]
fn past_max_zoom_delivers_only_singletons() {
    let config = EngineConfig::default()
        .with_min_cluster_size(1)
        .with_max_zoom_level(20);
    let (engine, rx) = engine_with_channel(config, ClusterPolicy::default());

    engine.add(utils::pt(1, 0.0, 0.0));
    engine.add(utils::pt(2, 0.0, 0.0001));
    engine.update_view(view(21));

    let delta = rx.recv_timeout(RECV_TIMEOUT).expect("pass delivers");
    assert_eq!(delta.to_add.len(), 2);
    assert!(delta
        .to_add
        .iter()
        .all(|item| matches!(item, DisplayItem::Point(_))));
}

#[test]
fn mutations_without_a_view_stay_silent() {
    let (engine, rx) = engine_with_channel(EngineConfig::default(), ClusterPolicy::default());
    assert!(engine.add(utils::pt(1, 0.0, 0.0)));
    assert!(!engine.request_recompute());
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    assert_eq!(engine.visible_items().len(), 0);
}

#[test]
fn superseded_pass_is_never_delivered() {
    // The policy hook doubles as a brake: while `hold` is set, any pass is
    // stuck inside partitioning, past the point where the neighbor cache
    // was read but before any commit checkpoint.
    let hold = Arc::new(AtomicBool::new(true));
    let brake = Arc::clone(&hold);
    let policy = ClusterPolicy::new().with_should_cluster(move |_| {
        let start = Instant::now();
        while brake.load(Ordering::Acquire) && start.elapsed() < Duration::from_secs(5) {
            std::thread::yield_now();
        }
        true
    });
    let config = EngineConfig::default().with_min_cluster_size(1);
    let (engine, rx) = engine_with_channel(config, policy);

    engine.add(utils::pt(1, 0.0, 0.0));
    engine.add(utils::pt(2, 0.0, 0.0001));
    engine.add(utils::pt(3, 50.0, 50.0));

    // Nothing has been committed while the first request is either stuck
    // behind the brake or not yet started.
    engine.update_view(view(12));
    assert_eq!(engine.visible_items().len(), 0);

    // Supersede it, then release the brake.
    engine.update_view(view(12));
    hold.store(false, Ordering::Release);

    // Exactly one delta arrives: the superseded pass committed nothing.
    let delta = rx.recv_timeout(RECV_TIMEOUT).expect("winning pass delivers");
    assert_eq!(delta.to_add.len(), 2);
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    assert_eq!(engine.visible_items().len(), 2);
}

#[test]
fn engine_shuts_down_cleanly_mid_request() {
    let (engine, _rx) = engine_with_channel(
        EngineConfig::default(),
        ClusterPolicy::default(),
    );
    for point in utils::scattered_points(200, 3) {
        engine.add(point);
    }
    engine.update_view(view(14));
    drop(engine);
}
