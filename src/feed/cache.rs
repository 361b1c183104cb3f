//! Items fetched from the server but not yet admitted to the window.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{ApiError, FeedItem, FeedPage, ItemId};

/// How many items to ask the server for, given how full the buffer is.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Size of the very first request of a session.
    pub startup_batch: usize,
    /// `(below, request)` pairs in ascending `below` order: a buffer holding
    /// fewer than `below` items requests `request` more.
    steps: Vec<(usize, usize)>,
    pub low_water: usize,
    pub retry_delay: Duration,
    /// Consecutive retries allowed before waiting for the next trigger.
    pub max_retries: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            startup_batch: 1,
            steps: vec![(2, 6), (5, 4), (8, 2), (10, 1)],
            low_water: 8,
            retry_delay: Duration::from_millis(1500),
            max_retries: 3,
        }
    }
}

impl FetchPolicy {
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Non-increasing in `cache_len`; zero from the high-water mark up.
    pub fn request_size(&self, cache_len: usize) -> usize {
        self.steps
            .iter()
            .find(|(below, _)| cache_len < *below)
            .map(|(_, request)| *request)
            .unwrap_or(0)
    }

    pub fn high_water(&self) -> usize {
        self.steps.last().map(|(below, _)| *below).unwrap_or(0)
    }
}

/// Why a fill was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Startup, the tail coming into view, or a starved feed. Restores the
    /// retry budget.
    Demand,
    /// A scheduled retry fired.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDecision {
    /// A fetch is outstanding; nothing was issued.
    InFlight,
    /// The server said there is nothing more.
    Exhausted,
    /// The buffer is full enough.
    Saturated,
    /// Issue one fetch for this many items.
    Fetch(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Appended {
        added: usize,
        retry_after: Option<Duration>,
    },
    Exhausted {
        added: usize,
    },
    Failed {
        retry_after: Option<Duration>,
    },
}

pub struct PrefetchCache {
    policy: FetchPolicy,
    buffer: VecDeque<FeedItem>,
    buffered_ids: HashSet<ItemId>,
    in_flight: Option<usize>,
    started: bool,
    exhausted: bool,
    retry_pending: bool,
    consecutive_retries: u32,
}

impl PrefetchCache {
    pub fn new(policy: FetchPolicy) -> Self {
        Self {
            policy,
            buffer: VecDeque::new(),
            buffered_ids: HashSet::new(),
            in_flight: None,
            started: false,
            exhausted: false,
            retry_pending: false,
            consecutive_retries: 0,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.buffered_ids.contains(id)
    }

    /// Nothing outstanding, no retry scheduled, and the feed still open.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && !self.retry_pending && !self.exhausted
    }

    /// Decide whether to fetch, and if so claim the in-flight slot.
    ///
    /// The caller must hand the result of the fetch back through
    /// [`complete_fetch`](Self::complete_fetch) exactly once.
    pub fn ensure_filled(&mut self, trigger: Trigger) -> FillDecision {
        if self.in_flight.is_some() {
            return FillDecision::InFlight;
        }
        if self.exhausted {
            return FillDecision::Exhausted;
        }
        if trigger == Trigger::Demand && self.consecutive_retries > 0 {
            debug!(spent = self.consecutive_retries, "retry budget restored");
            self.consecutive_retries = 0;
        }
        let count = if self.started {
            self.policy.request_size(self.buffer.len())
        } else {
            self.policy.startup_batch
        };
        if count == 0 {
            return FillDecision::Saturated;
        }
        self.started = true;
        self.in_flight = Some(count);
        debug!(count, buffered = self.buffer.len(), "requesting items");
        FillDecision::Fetch(count)
    }

    /// Apply the result of the outstanding fetch.
    ///
    /// Ids already buffered or already admitted (per `already_admitted`) are
    /// dropped so no id is ever both buffered and rendered.
    pub fn complete_fetch(
        &mut self,
        result: Result<FeedPage, ApiError>,
        already_admitted: impl Fn(&ItemId) -> bool,
    ) -> FetchOutcome {
        let requested = self.in_flight.take();
        match result {
            Ok(page) => {
                let received = page.items.len();
                let mut added = 0;
                for item in page.items {
                    if self.buffered_ids.contains(&item.id) || already_admitted(&item.id) {
                        continue;
                    }
                    self.buffered_ids.insert(item.id.clone());
                    self.buffer.push_back(item);
                    added += 1;
                }
                debug!(
                    ?requested,
                    received,
                    added,
                    buffered = self.buffer.len(),
                    "fetch applied"
                );
                if added > 0 {
                    self.consecutive_retries = 0;
                }
                if !page.has_more {
                    self.exhausted = true;
                    return FetchOutcome::Exhausted { added };
                }
                FetchOutcome::Appended {
                    added,
                    retry_after: self.schedule_retry(),
                }
            }
            Err(e) => {
                warn!(?requested, error = %e, "feed fetch failed");
                FetchOutcome::Failed {
                    retry_after: self.schedule_retry(),
                }
            }
        }
    }

    fn schedule_retry(&mut self) -> Option<Duration> {
        if self.buffer.len() >= self.policy.low_water
            || self.retry_pending
            || self.consecutive_retries >= self.policy.max_retries
        {
            return None;
        }
        self.retry_pending = true;
        self.consecutive_retries += 1;
        Some(self.policy.retry_delay)
    }

    /// The retry timer fired; the caller follows up with `ensure_filled`.
    pub fn retry_due(&mut self) {
        self.retry_pending = false;
    }

    /// Oldest-fetched item first.
    pub fn pop_front(&mut self) -> Option<FeedItem> {
        let item = self.buffer.pop_front()?;
        self.buffered_ids.remove(&item.id);
        Some(item)
    }
}
