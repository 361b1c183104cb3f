use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::FeedClient;
use crate::playback::{AutoplayPolicy, SimulatedPlayer};
use crate::session::{AsyncResult, FeedSession, SessionConfig, SessionParts};
use crate::surface::TerminalSurface;
use crate::theme::Theme;
use crate::time::Clock;

/// Rows moved by a single line scroll.
const SCROLL_STEP: isize = 2;

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Debug panel state: task tracking and log messages.
#[derive(Debug, Default)]
pub struct DebugState {
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push_back(LogEntry {
            message: msg.into(),
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    ScrollTop,
    ScrollBottom,
    Tap,
    Like,
    ToggleMute,
    TapVideo,
    TogglePlay,
    OpenMedia,
    Refresh,
    ToggleHelp,
    ToggleDebug,
    Quit,
    /// Rows available to the feed pane.
    Resize(u16),
    Tick,
}

pub struct App {
    pub session: Option<FeedSession>,
    pub client: FeedClient,
    pub config: SessionConfig,
    pub autoplay: AutoplayPolicy,
    pub theme: Theme,
    pub clock: Arc<dyn Clock>,
    pub should_quit: bool,
    pub help_overlay: bool,
    pub show_debug: bool,
    // Async task management
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub result_rx: mpsc::Receiver<AsyncResult>,
    pub generation: u64,
    pub pane_rows: Option<u16>,
    /// Why the last session failed to start.
    pub startup_error: Option<String>,
}

impl App {
    pub fn new(
        client: FeedClient,
        config: SessionConfig,
        autoplay: AutoplayPolicy,
        theme: Theme,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel(32);
        Self {
            session: None,
            client,
            config,
            autoplay,
            theme,
            clock: crate::time::system_clock(),
            should_quit: false,
            help_overlay: false,
            show_debug: false,
            result_tx,
            result_rx,
            generation: 0,
            pane_rows: None,
            startup_error: None,
        }
    }

    /// Tear down any running session and start a fresh one in a pane of
    /// `rows` rows. Results from the old session are discarded by generation.
    pub fn start_session(&mut self, rows: u16) {
        let debug = match self.session.take() {
            Some(mut old) => {
                old.teardown();
                std::mem::take(&mut old.debug)
            }
            None => DebugState::new(),
        };
        self.generation += 1;
        self.pane_rows = Some(rows);

        let parts = SessionParts {
            client: self.client.clone(),
            surface: Box::new(TerminalSurface::new(rows)),
            player: Box::new(SimulatedPlayer::new(self.autoplay)),
            clock: self.clock.clone(),
            result_tx: self.result_tx.clone(),
            generation: self.generation,
            viewport_rows: usize::from(rows),
            debug,
        };
        match FeedSession::start(parts, self.config.clone()) {
            Ok(session) => {
                self.session = Some(session);
                self.startup_error = None;
            }
            Err(e) => {
                self.startup_error = Some(e.to_string());
            }
        }
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        match self.session.as_mut() {
            Some(session) => session.handle_async_result(result),
            None => debug!(
                generation = result.generation(),
                "no session, dropping result"
            ),
        }
    }

    pub fn update(&mut self, msg: Message) {
        if !matches!(msg, Message::Tick | Message::Resize(_))
            && let Some(session) = self.session.as_mut()
        {
            session.clear_error();
        }

        match msg {
            Message::Quit => self.should_quit = true,
            Message::ToggleHelp => self.help_overlay = !self.help_overlay,
            Message::ToggleDebug => self.show_debug = !self.show_debug,
            Message::Refresh => {
                if let Some(rows) = self.pane_rows {
                    self.start_session(rows);
                }
            }
            Message::Resize(rows) => self.resize(rows),
            Message::OpenMedia => self.open_media(),
            msg => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match msg {
                    Message::ScrollDown => session.scroll_by(SCROLL_STEP),
                    Message::ScrollUp => session.scroll_by(-SCROLL_STEP),
                    Message::PageDown => session.page_down(),
                    Message::PageUp => session.page_up(),
                    Message::ScrollTop => session.scroll_to_top(),
                    Message::ScrollBottom => session.scroll_to_bottom(),
                    Message::Tap => session.tap_focused(),
                    Message::Like => session.like_focused(),
                    Message::ToggleMute => session.toggle_mute(),
                    Message::TapVideo => session.tap_focused_video(),
                    Message::TogglePlay => session.toggle_play_focused(),
                    Message::Tick => session.tick(),
                    _ => {}
                }
            }
        }
    }

    fn resize(&mut self, rows: u16) {
        if self.pane_rows == Some(rows) && self.session.is_some() {
            return;
        }
        match self.session.as_mut() {
            Some(session) => {
                self.pane_rows = Some(rows);
                session.resize(usize::from(rows));
            }
            // First layout, or the last start found no room for the feed.
            None => self.start_session(rows),
        }
    }

    fn open_media(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(link) = session.focused_item().map(|item| session.media_link(item)) else {
            return;
        };
        if let Err(e) = open::that(&link) {
            warn!(%link, error = %e, "failed to open media");
            session.set_error(format!("Couldn't open {link}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ItemId;
    use crate::test_utils::{FeedItemBuilder, TestAppBuilder, images};

    #[tokio::test]
    async fn first_resize_starts_the_session() {
        let mut app = TestAppBuilder::new().no_session().build();
        assert!(app.session.is_none());

        app.update(Message::Resize(30));

        assert!(app.session.is_some());
        assert_eq!(app.generation, 1);
        assert_eq!(app.pane_rows, Some(30));
    }

    #[tokio::test]
    async fn tiny_pane_reports_missing_container_and_recovers() {
        let mut app = TestAppBuilder::new().no_session().build();

        app.update(Message::Resize(2));
        assert!(app.session.is_none());
        assert!(app.startup_error.as_deref().unwrap().contains("container"));

        app.update(Message::Resize(30));
        assert!(app.session.is_some());
        assert!(app.startup_error.is_none());
    }

    #[tokio::test]
    async fn refresh_bumps_generation_and_drops_old_results() {
        let mut app = TestAppBuilder::new()
            .with_items(images(&["a", "b"]))
            .build();
        let old_generation = app.generation;
        assert!(!app.session.as_ref().unwrap().window().is_empty());

        app.update(Message::Refresh);

        assert_eq!(app.generation, old_generation + 1);
        let session = app.session.as_ref().unwrap();
        assert!(session.window().is_empty());

        app.handle_async_result(AsyncResult::Feed {
            generation: old_generation,
            task_id: 0,
            result: Ok(crate::test_utils::page(images(&["late"]), true)),
        });
        assert!(app.session.as_ref().unwrap().window().is_empty());
    }

    #[tokio::test]
    async fn double_tap_likes_focused_item() {
        let mut app = TestAppBuilder::new()
            .with_items(vec![FeedItemBuilder::new().id("x").like_count(3).build()])
            .build();

        app.update(Message::Tap);
        app.update(Message::Tap);

        let state = app
            .session
            .as_ref()
            .unwrap()
            .likes()
            .state(&ItemId::new("x"))
            .unwrap();
        assert!(state.liked);
        assert_eq!(state.like_count, 4);
    }

    #[tokio::test]
    async fn mute_key_flips_global_mute() {
        let mut app = TestAppBuilder::new()
            .with_items(vec![FeedItemBuilder::new().id("v").video().build()])
            .build();
        assert!(app.session.as_ref().unwrap().playback().is_muted());

        app.update(Message::ToggleMute);

        assert!(!app.session.as_ref().unwrap().playback().is_muted());
    }

    #[tokio::test]
    async fn overlays_toggle() {
        let mut app = TestAppBuilder::new().build();
        app.update(Message::ToggleHelp);
        assert!(app.help_overlay);
        app.update(Message::ToggleDebug);
        assert!(app.show_debug);
        app.update(Message::ToggleHelp);
        assert!(!app.help_overlay);
    }

    #[tokio::test]
    async fn quit_sets_flag() {
        let mut app = TestAppBuilder::new().build();
        app.update(Message::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn debug_state_tracks_tasks() {
        let mut debug = DebugState::new();
        let id = debug.start_task("Fetch 6 items");
        assert_eq!(debug.running_tasks.len(), 1);

        debug.end_task(id, "completed");
        assert!(debug.running_tasks.is_empty());
        assert!(debug.log.back().unwrap().message.contains("completed"));
    }

    #[test]
    fn debug_log_is_bounded() {
        let mut debug = DebugState::new();
        for i in 0..80 {
            debug.log(format!("entry {i}"));
        }
        assert_eq!(debug.log.len(), DebugState::MAX_LOG_ENTRIES);
    }
}
