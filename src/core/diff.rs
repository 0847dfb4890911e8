//! Symmetric difference between the committed visible set and a fresh
//! partition result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::geometry::GeoBounds;
use crate::core::partition::DisplayItem;
use crate::core::points::PointId;

/// Identity key for a display item.
///
/// Points key by identifier. Two cluster representatives are equal only
/// when their member sets and derived coordinate match; cluster ids are
/// per-pass and take no part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayKey {
    Point(PointId),
    Cluster {
        members: Vec<PointId>,
        position_bits: (u64, u64),
    },
}

/// The identity key under which `item` is diffed.
pub fn display_key(item: &DisplayItem) -> DisplayKey {
    match item {
        DisplayItem::Point(point) => DisplayKey::Point(point.id()),
        DisplayItem::Cluster { group, position } => DisplayKey::Cluster {
            members: group.member_ids_sorted(),
            position_bits: position.bits(),
        },
    }
}

/// Add/remove delta handed to the renderer boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub to_add: Vec<DisplayItem>,
    pub to_remove: Vec<DisplayItem>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// The display items last committed at the renderer boundary.
#[derive(Debug, Default)]
pub struct VisibleSet {
    items: HashMap<DisplayKey, DisplayItem>,
}

impl VisibleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &DisplayKey) -> bool {
        self.items.contains_key(key)
    }

    /// The committed items, in no particular order.
    pub fn items(&self) -> Vec<DisplayItem> {
        self.items.values().cloned().collect()
    }
}

/// Diffs `next` against `visible` and commits the outcome in the same
/// operation, so the read and the update are atomic with respect to other
/// diff calls (the caller holds exclusive access to `visible`).
///
/// `to_add` holds items of `next` absent from `visible`; `to_remove` holds
/// items of `visible` absent from `next`. With `retain_offscreen`, an item
/// slated for removal whose position falls outside `viewport` is exempted:
/// it stays committed and displayed off-screen rather than being torn down,
/// trading a little render overhead for less churn while panning.
pub fn diff_and_commit(
    visible: &mut VisibleSet,
    next: Vec<DisplayItem>,
    retain_offscreen: bool,
    viewport: Option<&GeoBounds>,
) -> Delta {
    let mut committed: HashMap<DisplayKey, DisplayItem> = next
        .into_iter()
        .map(|item| (display_key(&item), item))
        .collect();

    let to_add: Vec<DisplayItem> = committed
        .iter()
        .filter(|(key, _)| !visible.items.contains_key(*key))
        .map(|(_, item)| item.clone())
        .collect();

    let mut to_remove = Vec::new();
    for (key, item) in visible.items.drain() {
        if committed.contains_key(&key) {
            continue;
        }
        let retain = retain_offscreen
            && viewport.map_or(false, |bounds| !bounds.contains(item.position()));
        if retain {
            committed.insert(key, item);
        } else {
            to_remove.push(item);
        }
    }

    visible.items = committed;
    Delta { to_add, to_remove }
}
