//! Threshold-crossing detection over measured visibility ratios, and the
//! tracker that turns crossings into the visible set and tail signals.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::api::ItemId;

pub const VISIBLE_RATIO: f32 = 0.5;

/// How many items to admit when the tail comes into view, keyed on how many
/// have been admitted so far. Small at startup, a larger batch every tenth.
pub fn admission_batch(total_admitted: u64) -> usize {
    match total_admitted {
        0 => 1,
        1..=4 => 2,
        n if n % 10 == 0 => 5,
        _ => 3,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: ItemId,
    pub ratio: f32,
    pub is_intersecting: bool,
}

/// Reports observed targets when they cross a ratio threshold.
///
/// Like a browser intersection observer, a newly observed target is reported
/// on its first measurement whatever its state, and afterwards only when it
/// crosses the threshold.
pub struct IntersectionObserver {
    threshold: f32,
    strict: bool,
    targets: HashMap<ItemId, Option<bool>>,
}

impl IntersectionObserver {
    /// Intersecting when `ratio >= threshold`.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            strict: false,
            targets: HashMap::new(),
        }
    }

    /// Intersecting when `ratio > threshold`.
    pub fn strict(threshold: f32) -> Self {
        Self {
            strict: true,
            ..Self::new(threshold)
        }
    }

    pub fn observe(&mut self, id: ItemId) {
        self.targets.insert(id, None);
    }

    pub fn unobserve(&mut self, id: &ItemId) {
        self.targets.remove(id);
    }

    pub fn is_observed(&self, id: &ItemId) -> bool {
        self.targets.contains_key(id)
    }

    fn meets(&self, ratio: f32) -> bool {
        if self.strict {
            ratio > self.threshold
        } else {
            ratio >= self.threshold
        }
    }

    /// Entries come back in the order of `ratios`. Unobserved ids are ignored.
    pub fn measure(&mut self, ratios: &[(ItemId, f32)]) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        for (id, ratio) in ratios {
            let is_intersecting = self.meets(*ratio);
            let Some(last) = self.targets.get_mut(id) else {
                continue;
            };
            if *last != Some(is_intersecting) {
                *last = Some(is_intersecting);
                entries.push(IntersectionEntry {
                    id: id.clone(),
                    ratio: *ratio,
                    is_intersecting,
                });
            }
        }
        entries
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Observation {
    pub entered: Vec<ItemId>,
    pub left: Vec<ItemId>,
    /// The current tail entered the visible set this round.
    pub tail_reached: bool,
}

/// Owns the visible set. Nothing else mutates it.
pub struct VisibilityTracker {
    observer: IntersectionObserver,
    visible: HashSet<ItemId>,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(VISIBLE_RATIO)
    }
}

impl VisibilityTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            observer: IntersectionObserver::new(threshold),
            visible: HashSet::new(),
        }
    }

    pub fn register(&mut self, id: ItemId) {
        self.observer.observe(id);
    }

    pub fn unregister(&mut self, id: &ItemId) {
        self.observer.unobserve(id);
        self.visible.remove(id);
    }

    pub fn is_registered(&self, id: &ItemId) -> bool {
        self.observer.is_observed(id)
    }

    pub fn is_visible(&self, id: &ItemId) -> bool {
        self.visible.contains(id)
    }

    pub fn visible(&self) -> &HashSet<ItemId> {
        &self.visible
    }

    /// Push-style notification for a single target. Returns true when the
    /// target entered visibility and is the tail.
    pub fn on_visibility_change(
        &mut self,
        id: &ItemId,
        visible: bool,
        is_tail: impl Fn(&ItemId) -> bool,
    ) -> bool {
        if visible {
            let newly = self.visible.insert(id.clone());
            trace!(%id, newly, "entered");
            newly && is_tail(id)
        } else {
            self.visible.remove(id);
            trace!(%id, "left");
            false
        }
    }

    /// Measure a round of ratios and apply the crossings in delivery order.
    pub fn observe(
        &mut self,
        ratios: &[(ItemId, f32)],
        is_tail: impl Fn(&ItemId) -> bool,
    ) -> Observation {
        let mut observation = Observation::default();
        for entry in self.observer.measure(ratios) {
            let was_visible = self.visible.contains(&entry.id);
            if self.on_visibility_change(&entry.id, entry.is_intersecting, &is_tail) {
                observation.tail_reached = true;
            }
            match (was_visible, entry.is_intersecting) {
                (false, true) => observation.entered.push(entry.id),
                (true, false) => observation.left.push(entry.id),
                _ => {}
            }
        }
        observation
    }
}
