use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::api::{FeedClient, FeedItem, FeedPage, ItemId, MediaType};
use crate::app::{App, DebugState};
use crate::feed::cache::{FetchPolicy, PrefetchCache};
use crate::feed::visibility::VisibilityTracker;
use crate::feed::window::{AdmitReport, Collaborators, DEFAULT_MAX_ITEMS, FeedWindow};
use crate::likes::LikeInteractionHandler;
use crate::playback::{
    AutoplayPolicy, MediaPlaybackCoordinator, PlaybackBackend, PlaybackRejected, SimulatedPlayer,
};
use crate::session::{AsyncResult, FeedSession, SessionConfig, SessionParts};
use crate::surface::{NodeId, RenderSurface, TerminalSurface};
use crate::theme::{Theme, ThemeVariant};
use crate::time::{ManualClock, system_clock};

pub struct FeedItemBuilder {
    id: String,
    media_type: MediaType,
    media_url: String,
    username: String,
    like_count: u64,
    liked: bool,
}

impl Default for FeedItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl FeedItemBuilder {
    pub fn new() -> Self {
        Self {
            id: "1".to_string(),
            media_type: MediaType::Image,
            media_url: "/media/1".to_string(),
            username: "tester".to_string(),
            like_count: 0,
            liked: false,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn video(self) -> Self {
        self.media_type(MediaType::Video)
    }

    pub fn url(mut self, url: &str) -> Self {
        self.media_url = url.to_string();
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn like_count(mut self, count: u64) -> Self {
        self.like_count = count;
        self
    }

    pub fn liked(mut self) -> Self {
        self.liked = true;
        self
    }

    pub fn build(self) -> FeedItem {
        FeedItem {
            id: ItemId::new(self.id),
            media_type: self.media_type,
            media_url: self.media_url,
            username: self.username,
            like_count: self.like_count,
            liked: self.liked,
        }
    }
}

pub fn page(items: Vec<FeedItem>, has_more: bool) -> FeedPage {
    FeedPage { items, has_more }
}

/// Image items with the given ids.
pub fn images(ids: &[&str]) -> Vec<FeedItem> {
    ids.iter()
        .map(|id| FeedItemBuilder::new().id(id).build())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCall {
    Play(ItemId),
    Pause(ItemId),
    SetMuted(ItemId, bool),
    ShowControls(ItemId),
}

/// Backend that accepts every play request and records what it was asked.
pub struct RecordingPlayer {
    calls: Rc<RefCell<Vec<PlayerCall>>>,
}

impl RecordingPlayer {
    pub fn new() -> (Self, Rc<RefCell<Vec<PlayerCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl PlaybackBackend for RecordingPlayer {
    fn play(&mut self, id: &ItemId, _user_initiated: bool) -> Result<(), PlaybackRejected> {
        self.calls.borrow_mut().push(PlayerCall::Play(id.clone()));
        Ok(())
    }

    fn pause(&mut self, id: &ItemId) {
        self.calls.borrow_mut().push(PlayerCall::Pause(id.clone()));
    }

    fn set_muted(&mut self, id: &ItemId, muted: bool) {
        self.calls
            .borrow_mut()
            .push(PlayerCall::SetMuted(id.clone(), muted));
    }

    fn show_controls(&mut self, id: &ItemId) {
        self.calls
            .borrow_mut()
            .push(PlayerCall::ShowControls(id.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Attach(ItemId),
    Detach(NodeId),
    BatchDone,
}

/// Surface that always has a container and logs node operations.
#[derive(Default)]
pub struct RecordingSurface {
    next_node: u64,
    events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }
}

impl RenderSurface for RecordingSurface {
    fn container_present(&self) -> bool {
        true
    }

    fn attach(&mut self, item: &FeedItem) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.events.push(SurfaceEvent::Attach(item.id.clone()));
        node
    }

    fn detach(&mut self, node: NodeId) {
        self.events.push(SurfaceEvent::Detach(node));
    }

    fn after_batch(&mut self) {
        self.events.push(SurfaceEvent::BatchDone);
    }
}

/// A window with all of its collaborators, driven synchronously.
pub struct Harness {
    pub window: FeedWindow,
    pub cache: PrefetchCache,
    pub surface: RecordingSurface,
    pub visibility: VisibilityTracker,
    pub playback: MediaPlaybackCoordinator,
    pub likes: LikeInteractionHandler,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_MAX_ITEMS)
    }

    pub fn with_cap(max_items: usize) -> Self {
        Self {
            window: FeedWindow::new(max_items),
            cache: PrefetchCache::new(FetchPolicy::default()),
            surface: RecordingSurface::default(),
            visibility: VisibilityTracker::default(),
            playback: MediaPlaybackCoordinator::new(
                Box::new(SimulatedPlayer::new(AutoplayPolicy::Allowed)),
                true,
            ),
            likes: LikeInteractionHandler::new(ManualClock::new()),
        }
    }

    /// Append image items to the cache as if the server had sent them.
    pub fn buffer(&mut self, ids: &[&str]) {
        self.cache.complete_fetch(Ok(page(images(ids), true)), |_| false);
    }

    pub fn push(&mut self, item: FeedItem) {
        self.cache.complete_fetch(Ok(page(vec![item], true)), |_| false);
    }

    pub fn admit(&mut self, max_batch: usize) -> AdmitReport {
        let mut c = Collaborators {
            surface: &mut self.surface,
            visibility: &mut self.visibility,
            playback: &mut self.playback,
            likes: &mut self.likes,
        };
        self.window.admit_from_cache(&mut self.cache, max_batch, &mut c)
    }

    /// Make exactly `ids` visible among the rendered records.
    pub fn set_visible(&mut self, ids: &[ItemId]) {
        let ratios: Vec<(ItemId, f32)> = self
            .window
            .records()
            .map(|r| {
                let ratio = if ids.contains(&r.item.id) { 1.0 } else { 0.0 };
                (r.item.id.clone(), ratio)
            })
            .collect();
        self.visibility.observe(&ratios, |_| false);
    }

    pub fn clear(&mut self) {
        let mut c = Collaborators {
            surface: &mut self.surface,
            visibility: &mut self.visibility,
            playback: &mut self.playback,
            likes: &mut self.likes,
        };
        self.window.clear(&mut c);
    }
}

/// Feed server that hands out `count` fresh items per request forever.
/// With `video_every` of n > 0, every n-th item is a video.
pub async fn mock_feed(video_every: usize) -> MockServer {
    let server = MockServer::start().await;
    let next = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(move |req: &Request| {
            let count = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "count")
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(1);
            let items: Vec<_> = (0..count)
                .map(|_| {
                    let n = next.fetch_add(1, Ordering::SeqCst);
                    let is_video = video_every > 0 && n % video_every == 0;
                    json!({
                        "id": n,
                        "media_type": if is_video { "video" } else { "image" },
                        "media_url": format!("/media/{n}"),
                        "username": "server",
                        "like_count": 0,
                        "liked": false
                    })
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "items": items, "hasMore": true }))
        })
        .mount(&server)
        .await;
    server
}

pub fn session_parts(base: &str, rows: usize) -> (SessionParts, mpsc::Receiver<AsyncResult>) {
    let (result_tx, result_rx) = mpsc::channel(32);
    let parts = SessionParts {
        client: FeedClient::with_base(base).unwrap(),
        surface: Box::new(TerminalSurface::new(rows as u16)),
        player: Box::new(SimulatedPlayer::new(AutoplayPolicy::Allowed)),
        clock: system_clock(),
        result_tx,
        generation: 0,
        viewport_rows: rows,
        debug: DebugState::new(),
    };
    (parts, result_rx)
}

/// A started session whose refill timers never fire during a test.
pub fn test_session(
    base: &str,
    rows: usize,
    max_items: usize,
) -> (FeedSession, mpsc::Receiver<AsyncResult>) {
    let (parts, rx) = session_parts(base, rows);
    let config = SessionConfig {
        max_items,
        policy: FetchPolicy::default().with_retry_delay(Duration::from_secs(600)),
        ..SessionConfig::default()
    };
    let session = FeedSession::start(parts, config).unwrap();
    (session, rx)
}

pub async fn next_result(rx: &mut mpsc::Receiver<AsyncResult>) -> AsyncResult {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a result")
        .expect("result channel closed")
}

/// Builds an [`App`] with a live session seeded from a fake first page.
/// Must run inside a tokio runtime; the session's own follow-up fetches go
/// to an unroutable address and are never handled.
pub struct TestAppBuilder {
    items: Vec<FeedItem>,
    rows: u16,
    help_overlay: bool,
    show_debug: bool,
    theme: Theme,
    start: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            rows: 30,
            help_overlay: false,
            show_debug: false,
            theme: Theme::for_variant(ThemeVariant::Dark),
            start: true,
        }
    }

    pub fn with_items(mut self, items: Vec<FeedItem>) -> Self {
        self.items = items;
        self
    }

    pub fn rows(mut self, rows: u16) -> Self {
        self.rows = rows;
        self
    }

    pub fn help_overlay(mut self) -> Self {
        self.help_overlay = true;
        self
    }

    pub fn show_debug(mut self) -> Self {
        self.show_debug = true;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Leave the app without a session, as before the first resize.
    pub fn no_session(mut self) -> Self {
        self.start = false;
        self
    }

    pub fn build(self) -> App {
        let client = FeedClient::with_base("http://127.0.0.1:9").unwrap();
        let mut app = App::new(
            client,
            SessionConfig::default(),
            AutoplayPolicy::Allowed,
            self.theme,
        );
        app.help_overlay = self.help_overlay;
        app.show_debug = self.show_debug;
        if !self.start {
            return app;
        }
        app.start_session(self.rows);
        if let Some(session) = app.session.as_mut() {
            let generation = session.generation();
            session.handle_async_result(AsyncResult::Feed {
                generation,
                task_id: 0,
                result: Ok(page(self.items, true)),
            });
        }
        app
    }
}
