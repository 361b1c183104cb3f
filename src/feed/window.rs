//! The bounded, ordered set of rendered items.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::api::{FeedItem, ItemId};
use crate::feed::cache::PrefetchCache;
use crate::feed::visibility::VisibilityTracker;
use crate::likes::LikeInteractionHandler;
use crate::playback::MediaPlaybackCoordinator;
use crate::surface::{NodeId, RenderSurface};

pub const DEFAULT_MAX_ITEMS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRecord {
    pub item: FeedItem,
    pub node: NodeId,
    /// Admission order; lower is older.
    pub admitted_at: u64,
}

/// The components that admission and eviction register with and release.
pub struct Collaborators<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub visibility: &'a mut VisibilityTracker,
    pub playback: &'a mut MediaPlaybackCoordinator,
    pub likes: &'a mut LikeInteractionHandler,
}

#[derive(Debug, Default, PartialEq)]
pub struct AdmitReport {
    pub admitted: Vec<ItemId>,
    /// Popped from the cache but already admitted earlier this session.
    pub skipped: usize,
    pub evicted: Vec<ItemId>,
}

pub struct FeedWindow {
    records: BTreeMap<u64, RenderedRecord>,
    ordinals: HashMap<ItemId, u64>,
    admitted: HashSet<ItemId>,
    next_ordinal: u64,
    max_items: usize,
}

impl FeedWindow {
    pub fn new(max_items: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            ordinals: HashMap::new(),
            admitted: HashSet::new(),
            next_ordinal: 0,
            max_items: max_items.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Records in admission order.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &RenderedRecord> {
        self.records.values()
    }

    pub fn get(&self, id: &ItemId) -> Option<&RenderedRecord> {
        self.ordinals.get(id).and_then(|o| self.records.get(o))
    }

    /// Write a settled like onto the rendered item. False if it was evicted.
    pub fn set_like(&mut self, id: &ItemId, liked: bool, like_count: u64) -> bool {
        let Some(record) = self.ordinals.get(id).and_then(|o| self.records.get_mut(o)) else {
            return false;
        };
        record.item.liked = liked;
        record.item.like_count = like_count;
        true
    }

    /// Currently rendered.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ordinals.contains_key(id)
    }

    /// Rendered at some point this session, possibly evicted since.
    pub fn has_admitted(&self, id: &ItemId) -> bool {
        self.admitted.contains(id)
    }

    pub fn total_admitted(&self) -> u64 {
        self.admitted.len() as u64
    }

    pub fn tail(&self) -> Option<&RenderedRecord> {
        self.records.values().next_back()
    }

    pub fn is_tail(&self, id: &ItemId) -> bool {
        self.tail().is_some_and(|r| &r.item.id == id)
    }

    /// Move up to `max_batch` items from the front of `cache` into the
    /// window, then evict down to the cap.
    pub fn admit_from_cache(
        &mut self,
        cache: &mut PrefetchCache,
        max_batch: usize,
        c: &mut Collaborators<'_>,
    ) -> AdmitReport {
        let mut report = AdmitReport::default();
        for _ in 0..max_batch {
            let Some(item) = cache.pop_front() else {
                break;
            };
            if self.admitted.contains(&item.id) {
                debug!(id = %item.id, "skipping already admitted item");
                report.skipped += 1;
                continue;
            }

            let ordinal = self.next_ordinal;
            self.next_ordinal += 1;
            let node = c.surface.attach(&item);
            c.visibility.register(item.id.clone());
            if item.is_video() {
                c.playback.register(item.id.clone());
            }
            c.likes.track(&item);

            self.admitted.insert(item.id.clone());
            self.ordinals.insert(item.id.clone(), ordinal);
            report.admitted.push(item.id.clone());
            self.records.insert(
                ordinal,
                RenderedRecord {
                    item,
                    node,
                    admitted_at: ordinal,
                },
            );
        }
        if !report.admitted.is_empty() {
            c.surface.after_batch();
            debug!(
                admitted = report.admitted.len(),
                skipped = report.skipped,
                window = self.records.len(),
                "admitted batch"
            );
        }
        report.evicted = self.evict_if_needed(c);
        report
    }

    /// Remove the oldest non-visible records until the window is within its
    /// cap. Visible records and the tail are never removed, so the window
    /// can stay over the cap while they are on screen.
    pub fn evict_if_needed(&mut self, c: &mut Collaborators<'_>) -> Vec<ItemId> {
        let mut evicted = Vec::new();
        while self.records.len() > self.max_items {
            let tail = self.records.keys().next_back().copied();
            let candidate = self
                .records
                .values()
                .find(|r| Some(r.admitted_at) != tail && !c.visibility.is_visible(&r.item.id))
                .map(|r| r.admitted_at);
            let Some(ordinal) = candidate else {
                debug!(window = self.records.len(), "over cap but nothing evictable");
                break;
            };
            if let Some(record) = self.records.remove(&ordinal) {
                self.release(&record, c);
                evicted.push(record.item.id);
            }
        }
        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), window = self.records.len(), "evicted");
        }
        evicted
    }

    fn release(&mut self, record: &RenderedRecord, c: &mut Collaborators<'_>) {
        let id = &record.item.id;
        self.ordinals.remove(id);
        c.surface.detach(record.node);
        c.visibility.unregister(id);
        if record.item.is_video() {
            c.playback.unregister(id);
        }
        c.likes.forget(id);
    }

    /// Detach everything. Ids stay marked as admitted.
    pub fn clear(&mut self, c: &mut Collaborators<'_>) {
        let records = std::mem::take(&mut self.records);
        for record in records.values() {
            self.release(record, c);
        }
    }
}
