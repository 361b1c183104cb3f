//! One feed session: the prefetch cache, the rendered window and the
//! components hanging off it, wired to the network and the viewport.
//!
//! All state lives on the UI task. Network calls and retry timers run as
//! spawned tasks that report back through [`AsyncResult`]; results carrying
//! an older generation belong to a torn-down session and are dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, FeedClient, FeedItem, FeedPage, ItemId, LikeResponse};
use crate::app::DebugState;
use crate::feed::cache::{FetchOutcome, FetchPolicy, FillDecision, PrefetchCache, Trigger};
use crate::feed::viewport::{self, Placement, Viewport};
use crate::feed::visibility::{VisibilityTracker, admission_batch};
use crate::feed::window::{AdmitReport, Collaborators, DEFAULT_MAX_ITEMS, FeedWindow};
use crate::likes::{LikeInteractionHandler, LikeTicket, Settlement};
use crate::playback::{MediaPlaybackCoordinator, PlaybackBackend};
use crate::surface::RenderSurface;
use crate::time::Clock;

/// Observe/admit rounds per input before handing control back.
const MAX_PUMP_ROUNDS: usize = 8;

pub enum AsyncResult {
    Feed {
        generation: u64,
        task_id: u64,
        result: Result<FeedPage, ApiError>,
    },
    Like {
        generation: u64,
        task_id: u64,
        ticket: LikeTicket,
        result: Result<LikeResponse, ApiError>,
    },
    Mute {
        generation: u64,
        task_id: u64,
        muted: bool,
        result: Result<(), ApiError>,
    },
    RetryFill {
        generation: u64,
    },
}

impl AsyncResult {
    pub fn generation(&self) -> u64 {
        match self {
            AsyncResult::Feed { generation, .. }
            | AsyncResult::Like { generation, .. }
            | AsyncResult::Mute { generation, .. }
            | AsyncResult::RetryFill { generation } => *generation,
        }
    }

    fn task_id(&self) -> Option<u64> {
        match self {
            AsyncResult::Feed { task_id, .. }
            | AsyncResult::Like { task_id, .. }
            | AsyncResult::Mute { task_id, .. } => Some(*task_id),
            AsyncResult::RetryFill { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// There is nowhere to render the feed.
    MissingContainer,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MissingContainer => {
                write!(f, "feed container not found: the window is too small")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_items: usize,
    pub policy: FetchPolicy,
    pub start_muted: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            policy: FetchPolicy::default(),
            start_muted: true,
        }
    }
}

/// Everything a session needs from its host.
pub struct SessionParts {
    pub client: FeedClient,
    pub surface: Box<dyn RenderSurface>,
    pub player: Box<dyn PlaybackBackend>,
    pub clock: Arc<dyn Clock>,
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub generation: u64,
    pub viewport_rows: usize,
    pub debug: DebugState,
}

pub struct FeedSession {
    client: FeedClient,
    cache: PrefetchCache,
    window: FeedWindow,
    visibility: VisibilityTracker,
    playback: MediaPlaybackCoordinator,
    likes: LikeInteractionHandler,
    surface: Box<dyn RenderSurface>,
    viewport: Viewport,
    layout: Vec<Placement>,
    focused: Option<ItemId>,
    result_tx: mpsc::Sender<AsyncResult>,
    generation: u64,
    timers: CancellationToken,
    last_error: Option<String>,
    pub debug: DebugState,
}

impl FeedSession {
    /// Validate the host and issue the startup fetch.
    pub fn start(parts: SessionParts, config: SessionConfig) -> Result<Self, SessionError> {
        if !parts.surface.container_present() {
            error!("feed container missing, not starting");
            return Err(SessionError::MissingContainer);
        }
        let mut session = Self {
            client: parts.client,
            cache: PrefetchCache::new(config.policy),
            window: FeedWindow::new(config.max_items),
            visibility: VisibilityTracker::default(),
            playback: MediaPlaybackCoordinator::new(parts.player, config.start_muted),
            likes: LikeInteractionHandler::new(parts.clock),
            surface: parts.surface,
            viewport: Viewport::new(parts.viewport_rows),
            layout: Vec::new(),
            focused: None,
            result_tx: parts.result_tx,
            generation: parts.generation,
            timers: CancellationToken::new(),
            last_error: None,
            debug: parts.debug,
        };
        info!(
            generation = session.generation,
            max_items = session.window.max_items(),
            base = session.client.base(),
            "feed session started"
        );
        session.fill(Trigger::Demand);
        Ok(session)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn window(&self) -> &FeedWindow {
        &self.window
    }

    pub fn cache(&self) -> &PrefetchCache {
        &self.cache
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    pub fn playback(&self) -> &MediaPlaybackCoordinator {
        &self.playback
    }

    pub fn likes(&self) -> &LikeInteractionHandler {
        &self.likes
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn layout(&self) -> &[Placement] {
        &self.layout
    }

    pub fn focused(&self) -> Option<&ItemId> {
        self.focused.as_ref()
    }

    pub fn focused_item(&self) -> Option<&FeedItem> {
        let id = self.focused.as_ref()?;
        self.window.get(id).map(|r| &r.item)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Nothing rendered yet and a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.window.is_empty() && self.cache.is_in_flight()
    }

    /// Absolute link to an item's media.
    pub fn media_link(&self, item: &FeedItem) -> String {
        if item.media_url.starts_with('/') {
            format!("{}{}", self.client.base(), item.media_url)
        } else {
            item.media_url.clone()
        }
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        if result.generation() != self.generation {
            if let Some(task_id) = result.task_id() {
                self.debug.end_task(task_id, "discarded (stale)");
            }
            return;
        }
        match result {
            AsyncResult::Feed {
                task_id, result, ..
            } => self.on_feed(task_id, result),
            AsyncResult::Like {
                task_id,
                ticket,
                result,
                ..
            } => self.on_like(task_id, ticket, result),
            AsyncResult::Mute {
                task_id,
                muted,
                result,
                ..
            } => match result {
                Ok(()) => self.debug.end_task(task_id, "completed"),
                Err(e) => {
                    // The local mute state stands either way.
                    warn!(muted, error = %e, "failed to persist mute preference");
                    self.debug.end_task(task_id, "failed");
                }
            },
            AsyncResult::RetryFill { .. } => {
                self.cache.retry_due();
                self.fill(Trigger::Retry);
            }
        }
    }

    fn on_feed(&mut self, task_id: u64, result: Result<FeedPage, ApiError>) {
        let failure = result.as_ref().err().map(ApiError::user_message);
        let outcome = self
            .cache
            .complete_fetch(result, |id| self.window.has_admitted(id));
        match outcome {
            FetchOutcome::Appended { added, retry_after } => {
                self.debug.end_task(task_id, "completed");
                debug!(added, buffered = self.cache.len(), "feed fetch completed");
                if let Some(delay) = retry_after {
                    self.schedule_retry(delay);
                }
            }
            FetchOutcome::Exhausted { added } => {
                self.debug.end_task(task_id, "completed (end of feed)");
                info!(added, "feed exhausted");
            }
            FetchOutcome::Failed { retry_after } => {
                self.debug.end_task(task_id, "failed");
                self.last_error = failure;
                if let Some(delay) = retry_after {
                    self.schedule_retry(delay);
                }
            }
        }

        if self.window.is_empty() || self.tail_visible() {
            self.admit(admission_batch(self.window.total_admitted()));
        }
        self.pump();
    }

    fn on_like(
        &mut self,
        task_id: u64,
        ticket: LikeTicket,
        result: Result<LikeResponse, ApiError>,
    ) {
        let failure = result.as_ref().err().map(ApiError::user_message);
        let id = ticket.id.clone();
        match self.likes.settle(ticket, result) {
            Settlement::Confirmed { liked } => {
                debug!(%id, liked, "like confirmed");
                self.sync_like(&id);
                self.debug.end_task(task_id, "completed");
            }
            Settlement::RolledBack { liked } => {
                debug!(%id, liked, "like rolled back");
                self.sync_like(&id);
                self.debug.end_task(task_id, "failed");
                self.last_error = Some(failure.unwrap_or_else(|| "Couldn't save like.".into()));
            }
            Settlement::Superseded => self.debug.end_task(task_id, "superseded"),
            Settlement::Dropped => self.debug.end_task(task_id, "discarded (evicted)"),
        }
    }

    /// Copy the handler's like state onto the rendered item.
    fn sync_like(&mut self, id: &ItemId) {
        if let Some(state) = self.likes.state(id) {
            self.window.set_like(id, state.liked, state.like_count);
        }
    }

    fn tail_visible(&self) -> bool {
        self.window
            .tail()
            .is_some_and(|r| self.visibility.is_visible(&r.item.id))
    }

    /// Ask the cache whether to fetch, and fetch if so.
    pub fn fill(&mut self, trigger: Trigger) {
        match self.cache.ensure_filled(trigger) {
            FillDecision::Fetch(count) => self.spawn_fetch(count),
            decision => debug!(?decision, buffered = self.cache.len(), "no fetch"),
        }
    }

    fn spawn_fetch(&mut self, count: usize) {
        let task_id = self.debug.start_task(format!("Fetch {count} items"));
        let client = self.client.clone();
        let tx = self.result_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = client.fetch_feed(count).await;
            let _ = tx
                .send(AsyncResult::Feed {
                    generation,
                    task_id,
                    result,
                })
                .await;
        });
    }

    fn schedule_retry(&mut self, delay: Duration) {
        debug!(?delay, "scheduling refill");
        let cancel = self.timers.clone();
        let tx = self.result_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(AsyncResult::RetryFill { generation }).await;
                }
            }
        });
    }

    fn spawn_like(&mut self, ticket: LikeTicket) {
        let task_id = self.debug.start_task(format!("Like {}", ticket.id));
        let client = self.client.clone();
        let tx = self.result_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = client.toggle_like(&ticket.id).await;
            let _ = tx
                .send(AsyncResult::Like {
                    generation,
                    task_id,
                    ticket,
                    result,
                })
                .await;
        });
    }

    fn spawn_mute(&mut self, muted: bool) {
        let task_id = self.debug.start_task(format!("Save mute={muted}"));
        let client = self.client.clone();
        let tx = self.result_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = client.set_mute(muted).await;
            let _ = tx
                .send(AsyncResult::Mute {
                    generation,
                    task_id,
                    muted,
                    result,
                })
                .await;
        });
    }

    /// Admit a batch while keeping the content under the viewport still.
    fn admit(&mut self, batch: usize) -> AdmitReport {
        let anchor = self.viewport.anchor(&self.layout);
        let mut c = Collaborators {
            surface: &mut *self.surface,
            visibility: &mut self.visibility,
            playback: &mut self.playback,
            likes: &mut self.likes,
        };
        let report = self.window.admit_from_cache(&mut self.cache, batch, &mut c);
        self.layout = viewport::layout(self.window.records());
        if let Some(anchor) = anchor {
            self.viewport.restore(anchor, &self.layout);
        }
        report
    }

    /// Measure the viewport and react: tail in view means fill the cache and
    /// admit the next batch, which may bring a new tail into view.
    fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let ratios = self.viewport.ratios(&self.layout);
            let observation = self
                .visibility
                .observe(&ratios, |id| self.window.is_tail(id));
            self.playback.observe(&ratios);
            self.focused = self
                .viewport
                .focused(&self.layout)
                .map(|p| p.id.clone());

            if !observation.tail_reached {
                break;
            }
            self.fill(Trigger::Demand);
            let report = self.admit(admission_batch(self.window.total_admitted()));
            if report.admitted.is_empty() {
                break;
            }
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.viewport
            .scroll_by(delta, viewport::content_rows(&self.layout));
        self.pump();
        self.rearm_if_starved();
    }

    pub fn page_down(&mut self) {
        let rows = self.viewport.rows().max(1);
        self.scroll_by(rows as isize);
    }

    pub fn page_up(&mut self) {
        let rows = self.viewport.rows().max(1);
        self.scroll_by(-(rows as isize));
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.scroll_to_top();
        self.pump();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport
            .scroll_to_bottom(viewport::content_rows(&self.layout));
        self.pump();
    }

    pub fn resize(&mut self, rows: usize) {
        if rows == self.viewport.rows() {
            return;
        }
        self.viewport
            .set_rows(rows, viewport::content_rows(&self.layout));
        self.pump();
    }

    /// A tap on the focused card. The second of two quick taps likes it.
    pub fn tap_focused(&mut self) {
        let Some(id) = self.focused.clone() else {
            return;
        };
        if let Some(ticket) = self.likes.tap(&id) {
            self.sync_like(&id);
            self.spawn_like(ticket);
        }
    }

    pub fn like_focused(&mut self) {
        let Some(id) = self.focused.clone() else {
            return;
        };
        if let Some(ticket) = self.likes.toggle_like(&id) {
            self.sync_like(&id);
            self.spawn_like(ticket);
        }
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.playback.toggle_global_mute();
        self.spawn_mute(muted);
    }

    /// The focused video's own mute control.
    pub fn tap_focused_video(&mut self) {
        let Some(id) = self.focused.clone() else {
            return;
        };
        if let Some(muted) = self.playback.tap_video(&id) {
            self.spawn_mute(muted);
        }
    }

    pub fn toggle_play_focused(&mut self) {
        if let Some(id) = self.focused.clone() {
            self.playback.toggle_play(&id);
        }
    }

    /// Periodic housekeeping between inputs.
    pub fn tick(&mut self) {
        self.likes.prune_animations();
        self.rearm_if_starved();
    }

    /// Nothing left to show and nothing on the way: the retry budget ran out
    /// while the user waits at the end. Start a fresh fill.
    fn rearm_if_starved(&mut self) {
        let waiting = self.window.is_empty() || self.tail_visible();
        if waiting && self.cache.is_empty() && self.cache.is_idle() {
            debug!(rendered = self.window.len(), "feed starved, refilling");
            self.fill(Trigger::Demand);
        }
    }

    /// Detach everything and stop pending timers. Results still in flight
    /// are discarded by generation when they arrive.
    pub fn teardown(&mut self) {
        self.timers.cancel();
        let mut c = Collaborators {
            surface: &mut *self.surface,
            visibility: &mut self.visibility,
            playback: &mut self.playback,
            likes: &mut self.likes,
        };
        self.window.clear(&mut c);
        self.layout.clear();
        self.focused = None;
        info!(
            generation = self.generation,
            admitted = self.window.total_admitted(),
            "feed session torn down"
        );
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.timers.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::VideoPhase;
    use crate::test_utils::{mock_feed, next_result, test_session};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn requested_counts(requests: &[wiremock::Request]) -> Vec<String> {
        requests
            .iter()
            .filter(|r| r.url.path() == "/api/feed")
            .filter_map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "count")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }

    #[tokio::test]
    async fn missing_container_aborts_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut parts, _rx) = crate::test_utils::session_parts(&server.uri(), 40);
        parts.surface = Box::new(crate::surface::TerminalSurface::new(2));
        let result = FeedSession::start(parts, SessionConfig::default());

        assert!(matches!(result, Err(SessionError::MissingContainer)));
    }

    #[tokio::test]
    async fn startup_renders_one_item_then_prefetches() {
        let server = mock_feed(0).await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        assert!(session.is_loading());

        let first = next_result(&mut rx).await;
        session.handle_async_result(first);

        assert_eq!(session.window().len(), 1);
        let only = session.window().tail().unwrap().item.id.clone();
        assert!(session.visibility().is_visible(&only));
        assert_eq!(session.focused(), Some(&only));
        // The tail came into view, so the next fetch is already out.
        assert!(session.cache().is_in_flight());

        let second = next_result(&mut rx).await;
        session.handle_async_result(second);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requested_counts(&requests)[..2], ["1", "6"]);
        assert!(session.window().len() > 1);
    }

    #[tokio::test]
    async fn failed_fetch_surfaces_error_and_retries_later() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (parts, mut rx) = crate::test_utils::session_parts(&server.uri(), 40);
        let config = SessionConfig {
            policy: FetchPolicy::default().with_retry_delay(Duration::from_millis(10)),
            ..SessionConfig::default()
        };
        let mut session = FeedSession::start(parts, config).unwrap();

        let failed = next_result(&mut rx).await;
        session.handle_async_result(failed);
        assert!(session.last_error().is_some());
        assert!(session.window().is_empty());

        let retry = next_result(&mut rx).await;
        assert!(matches!(retry, AsyncResult::RetryFill { .. }));
        session.handle_async_result(retry);
        assert!(session.cache().is_in_flight());
    }

    #[tokio::test]
    async fn feed_recovers_after_outage_outlasts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(4)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "back",
                    "media_type": "image",
                    "media_url": "/media/back",
                    "username": "server",
                    "like_count": 0,
                    "liked": false
                }],
                "hasMore": true
            })))
            .mount(&server)
            .await;

        let (parts, mut rx) = crate::test_utils::session_parts(&server.uri(), 40);
        let config = SessionConfig {
            policy: FetchPolicy::default().with_retry_delay(Duration::from_millis(10)),
            ..SessionConfig::default()
        };
        let mut session = FeedSession::start(parts, config).unwrap();

        // Startup fetch, then three retries, each answered by a failure.
        for _ in 0..7 {
            let result = next_result(&mut rx).await;
            session.handle_async_result(result);
        }
        assert!(session.window().is_empty());
        assert!(!session.cache().is_in_flight());
        assert!(session.cache().is_idle());

        session.tick();
        assert!(session.cache().is_in_flight());

        let result = next_result(&mut rx).await;
        assert!(matches!(result, AsyncResult::Feed { .. }));
        session.handle_async_result(result);

        assert!(session.window().contains(&ItemId::new("back")));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requested_counts(&requests).len(), 5);
    }

    #[tokio::test]
    async fn confirmed_like_updates_rendered_item() {
        let server = mock_feed(0).await;
        Mock::given(method("POST"))
            .and(path_regex("^/api/like/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "action": "liked",
                "likes": 9
            })))
            .mount(&server)
            .await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        let first = next_result(&mut rx).await;
        session.handle_async_result(first);
        let id = session.focused().cloned().unwrap();

        session.like_focused();
        let optimistic = &session.window().get(&id).unwrap().item;
        assert!(optimistic.liked);
        assert_eq!(optimistic.like_count, 1);

        loop {
            let result = next_result(&mut rx).await;
            let is_like = matches!(result, AsyncResult::Like { .. });
            session.handle_async_result(result);
            if is_like {
                break;
            }
        }
        let item = &session.window().get(&id).unwrap().item;
        assert!(item.liked);
        assert_eq!(item.like_count, 9);
    }

    #[tokio::test]
    async fn scrolling_keeps_window_within_cap() {
        let server = mock_feed(0).await;
        let (mut session, mut rx) = test_session(&server.uri(), 8, 5);

        for _ in 0..30 {
            session.scroll_to_bottom();
            if session.cache().is_in_flight() {
                let result = next_result(&mut rx).await;
                session.handle_async_result(result);
            }
            assert!(session.window().len() <= 5);
            for id in session.visibility().visible() {
                assert!(session.window().contains(id));
            }
        }
        assert!(session.window().total_admitted() > 10);
    }

    #[tokio::test]
    async fn at_most_one_video_plays_while_scrolling() {
        let server = mock_feed(1).await;
        let (mut session, mut rx) = test_session(&server.uri(), 12, 20);

        for step in 0..40 {
            if step % 3 == 0 {
                session.scroll_to_bottom();
            } else {
                session.scroll_by(-2);
            }
            if session.cache().is_in_flight() {
                let result = next_result(&mut rx).await;
                session.handle_async_result(result);
            }
            assert!(session.playback().playing_count() <= 1);
        }
        let playing: Vec<_> = session
            .playback()
            .videos()
            .filter(|(_, s)| s.phase == VideoPhase::Playing)
            .collect();
        assert!(playing.len() <= 1);
    }

    #[tokio::test]
    async fn failed_like_rolls_back_after_optimistic_flip() {
        let server = mock_feed(0).await;
        Mock::given(method("POST"))
            .and(path_regex("^/api/like/.*$"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        let first = next_result(&mut rx).await;
        session.handle_async_result(first);
        let id = session.focused().cloned().unwrap();

        session.like_focused();
        assert!(session.likes().state(&id).unwrap().liked);
        assert!(session.likes().state(&id).unwrap().is_pending());

        loop {
            let result = next_result(&mut rx).await;
            let is_like = matches!(result, AsyncResult::Like { .. });
            session.handle_async_result(result);
            if is_like {
                break;
            }
        }
        let state = session.likes().state(&id).unwrap();
        assert!(!state.liked);
        assert!(!state.is_pending());
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn confirmed_like_takes_server_count() {
        let server = mock_feed(0).await;
        Mock::given(method("POST"))
            .and(path_regex("^/api/like/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "action": "liked",
                "likes": 42
            })))
            .mount(&server)
            .await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        let first = next_result(&mut rx).await;
        session.handle_async_result(first);
        let id = session.focused().cloned().unwrap();

        session.like_focused();
        loop {
            let result = next_result(&mut rx).await;
            let is_like = matches!(result, AsyncResult::Like { .. });
            session.handle_async_result(result);
            if is_like {
                break;
            }
        }
        let state = session.likes().state(&id).unwrap();
        assert!(state.liked);
        assert_eq!(state.like_count, 42);
    }

    #[tokio::test]
    async fn mute_failure_keeps_local_state() {
        let server = mock_feed(0).await;
        Mock::given(method("POST"))
            .and(path("/api/mute"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        assert!(session.playback().is_muted());

        session.toggle_mute();
        assert!(!session.playback().is_muted());

        loop {
            let result = next_result(&mut rx).await;
            let is_mute = matches!(result, AsyncResult::Mute { .. });
            session.handle_async_result(result);
            if is_mute {
                break;
            }
        }
        assert!(!session.playback().is_muted());
    }

    #[tokio::test]
    async fn stale_results_are_ignored() {
        let server = mock_feed(0).await;
        let (mut session, _rx) = test_session(&server.uri(), 40, 20);

        session.handle_async_result(AsyncResult::Feed {
            generation: session.generation() + 1,
            task_id: 99,
            result: Ok(FeedPage {
                items: vec![crate::test_utils::FeedItemBuilder::new().id("old").build()],
                has_more: true,
            }),
        });

        assert!(session.window().is_empty());
        assert_eq!(session.cache().len(), 0);
    }

    #[tokio::test]
    async fn teardown_releases_everything() {
        let server = mock_feed(1).await;
        let (mut session, mut rx) = test_session(&server.uri(), 40, 20);
        let first = next_result(&mut rx).await;
        session.handle_async_result(first);
        assert!(!session.window().is_empty());

        session.teardown();

        assert!(session.window().is_empty());
        assert!(session.visibility().visible().is_empty());
        assert_eq!(session.playback().videos().count(), 0);
        assert!(session.focused().is_none());
    }

    #[tokio::test]
    async fn media_links_are_resolved_against_the_server() {
        let server = mock_feed(0).await;
        let (session, _rx) = test_session(&server.uri(), 40, 20);
        let item = crate::test_utils::FeedItemBuilder::new()
            .url("/media/cat.jpg")
            .build();
        assert_eq!(
            session.media_link(&item),
            format!("{}/media/cat.jpg", server.uri())
        );
    }
}
