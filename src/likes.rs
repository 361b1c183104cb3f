//! Optimistic like toggles and the double-tap gesture.
//!
//! A toggle is two-phase: [`LikeInteractionHandler::toggle_like`] flips the
//! local state and hands back a [`LikeTicket`] (pending), and
//! [`LikeInteractionHandler::settle`] resolves the ticket with the server's
//! answer into a [`Settlement`] (confirmed or rolled back).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::api::{ApiError, FeedItem, ItemId, LikeResponse};
use crate::time::Clock;

pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
pub const LIKE_ANIMATION: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    Single,
    Double,
}

/// Pairs taps on the same item that land within [`DOUBLE_TAP_WINDOW`].
#[derive(Debug, Default)]
pub struct TapRecognizer {
    last: Option<(ItemId, Instant)>,
}

impl TapRecognizer {
    pub fn tap(&mut self, id: &ItemId, now: Instant) -> Tap {
        match &self.last {
            Some((last_id, at))
                if last_id == id && now.saturating_duration_since(*at) <= DOUBLE_TAP_WINDOW =>
            {
                // A third tap starts a new pair rather than completing another.
                self.last = None;
                Tap::Double
            }
            _ => {
                self.last = Some((id.clone(), now));
                Tap::Single
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
    pending: Option<u64>,
}

impl LikeState {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// An in-flight toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeTicket {
    pub id: ItemId,
    seq: u64,
    previous_liked: bool,
    previous_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The server's declared action now holds.
    Confirmed { liked: bool },
    /// The request failed and the pre-toggle state was restored.
    RolledBack { liked: bool },
    /// The request failed but a newer toggle owns the state now.
    Superseded,
    /// The item left the window before the response arrived.
    Dropped,
}

pub struct LikeInteractionHandler {
    clock: Arc<dyn Clock>,
    items: HashMap<ItemId, LikeState>,
    taps: TapRecognizer,
    animations: Vec<(ItemId, Instant)>,
    next_seq: u64,
}

impl LikeInteractionHandler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            items: HashMap::new(),
            taps: TapRecognizer::default(),
            animations: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn track(&mut self, item: &FeedItem) {
        self.items.insert(
            item.id.clone(),
            LikeState {
                liked: item.liked,
                like_count: item.like_count,
                pending: None,
            },
        );
    }

    pub fn forget(&mut self, id: &ItemId) {
        self.items.remove(id);
        self.animations.retain(|(animated, _)| animated != id);
    }

    pub fn state(&self, id: &ItemId) -> Option<LikeState> {
        self.items.get(id).copied()
    }

    /// Optimistically flip the liked state. Returns `None` for untracked ids.
    pub fn toggle_like(&mut self, id: &ItemId) -> Option<LikeTicket> {
        let now = self.clock.now();
        let state = self.items.get_mut(id)?;
        let ticket = LikeTicket {
            id: id.clone(),
            seq: self.next_seq,
            previous_liked: state.liked,
            previous_count: state.like_count,
        };
        self.next_seq += 1;

        state.liked = !state.liked;
        state.like_count = adjust_count(state.like_count, state.liked);
        state.pending = Some(ticket.seq);
        if state.liked {
            self.animations.push((id.clone(), now));
        }
        debug!(%id, liked = state.liked, "like toggled");
        Some(ticket)
    }

    /// A tap on the item's media. The second tap of a double-tap toggles.
    pub fn tap(&mut self, id: &ItemId) -> Option<LikeTicket> {
        match self.taps.tap(id, self.clock.now()) {
            Tap::Double => self.toggle_like(id),
            Tap::Single => None,
        }
    }

    pub fn settle(
        &mut self,
        ticket: LikeTicket,
        result: Result<LikeResponse, ApiError>,
    ) -> Settlement {
        let Some(state) = self.items.get_mut(&ticket.id) else {
            return Settlement::Dropped;
        };
        let latest = state.pending == Some(ticket.seq);
        if latest {
            state.pending = None;
        }

        let action = match result {
            Ok(response) if response.is_success() => response.action.map(|a| (a, response.likes)),
            Ok(response) => {
                warn!(id = %ticket.id, status = %response.status, "like rejected");
                None
            }
            Err(e) => {
                warn!(id = %ticket.id, error = %e, "like failed");
                None
            }
        };

        match action {
            Some((action, likes)) => {
                let liked = action.is_liked();
                if state.liked != liked {
                    state.like_count = adjust_count(state.like_count, liked);
                }
                state.liked = liked;
                if let Some(likes) = likes {
                    state.like_count = likes;
                }
                Settlement::Confirmed { liked }
            }
            None if latest => {
                state.liked = ticket.previous_liked;
                state.like_count = ticket.previous_count;
                Settlement::RolledBack {
                    liked: state.liked,
                }
            }
            None => Settlement::Superseded,
        }
    }

    pub fn is_animating(&self, id: &ItemId) -> bool {
        let now = self.clock.now();
        self.animations
            .iter()
            .any(|(animated, at)| animated == id && now.saturating_duration_since(*at) < LIKE_ANIMATION)
    }

    pub fn active_animations(&self) -> usize {
        let now = self.clock.now();
        self.animations
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(*at) < LIKE_ANIMATION)
            .count()
    }

    /// Drop finished animations.
    pub fn prune_animations(&mut self) {
        let now = self.clock.now();
        self.animations
            .retain(|(_, at)| now.saturating_duration_since(*at) < LIKE_ANIMATION);
    }
}

fn adjust_count(count: u64, liked: bool) -> u64 {
    if liked {
        count + 1
    } else {
        count.saturating_sub(1)
    }
}
