//! Single-active-video playback and the shared mute flag.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::ItemId;
use crate::feed::visibility::IntersectionObserver;

/// A video plays only when more than this fraction of it is on screen.
pub const PLAY_RATIO: f32 = 0.8;

/// The environment refused to start playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRejected {
    pub reason: String,
}

impl fmt::Display for PlaybackRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback rejected: {}", self.reason)
    }
}

impl std::error::Error for PlaybackRejected {}

/// The media elements the coordinator drives.
pub trait PlaybackBackend {
    /// `user_initiated` is true when a direct user gesture asked for playback.
    fn play(&mut self, id: &ItemId, user_initiated: bool) -> Result<(), PlaybackRejected>;
    fn pause(&mut self, id: &ItemId);
    fn set_muted(&mut self, id: &ItemId, muted: bool);
    fn show_controls(&mut self, id: &ItemId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoplayPolicy {
    Allowed,
    /// Only muted videos may start without a gesture.
    #[default]
    MutedOnly,
    Blocked,
}

/// Backend for the terminal, where there is no decoder: it tracks element
/// state and applies an autoplay policy the way a browser would.
pub struct SimulatedPlayer {
    policy: AutoplayPolicy,
    muted: HashMap<ItemId, bool>,
}

impl SimulatedPlayer {
    pub fn new(policy: AutoplayPolicy) -> Self {
        Self {
            policy,
            muted: HashMap::new(),
        }
    }
}

impl PlaybackBackend for SimulatedPlayer {
    fn play(&mut self, id: &ItemId, user_initiated: bool) -> Result<(), PlaybackRejected> {
        let muted = self.muted.get(id).copied().unwrap_or(true);
        let allowed = user_initiated
            || match self.policy {
                AutoplayPolicy::Allowed => true,
                AutoplayPolicy::MutedOnly => muted,
                AutoplayPolicy::Blocked => false,
            };
        if allowed {
            Ok(())
        } else {
            Err(PlaybackRejected {
                reason: "autoplay not allowed".into(),
            })
        }
    }

    fn pause(&mut self, _id: &ItemId) {}

    fn set_muted(&mut self, id: &ItemId, muted: bool) {
        self.muted.insert(id.clone(), muted);
    }

    fn show_controls(&mut self, _id: &ItemId) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPhase {
    Paused,
    Playing,
    /// Autoplay was rejected; controls are showing and only a user gesture
    /// starts playback again.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoState {
    pub phase: VideoPhase,
    pub muted: bool,
    pub controls: bool,
}

pub struct MediaPlaybackCoordinator {
    backend: Box<dyn PlaybackBackend>,
    observer: IntersectionObserver,
    videos: HashMap<ItemId, VideoState>,
    active: Option<ItemId>,
    muted: bool,
}

impl MediaPlaybackCoordinator {
    pub fn new(backend: Box<dyn PlaybackBackend>, start_muted: bool) -> Self {
        Self {
            backend,
            observer: IntersectionObserver::strict(PLAY_RATIO),
            videos: HashMap::new(),
            active: None,
            muted: start_muted,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn active(&self) -> Option<&ItemId> {
        self.active.as_ref()
    }

    pub fn state(&self, id: &ItemId) -> Option<VideoState> {
        self.videos.get(id).copied()
    }

    pub fn playing_count(&self) -> usize {
        self.videos
            .values()
            .filter(|s| s.phase == VideoPhase::Playing)
            .count()
    }

    pub fn videos(&self) -> impl Iterator<Item = (&ItemId, &VideoState)> {
        self.videos.iter()
    }

    /// Start tracking a rendered video. It inherits the global mute flag.
    pub fn register(&mut self, id: ItemId) {
        self.backend.set_muted(&id, self.muted);
        self.videos.insert(
            id.clone(),
            VideoState {
                phase: VideoPhase::Paused,
                muted: self.muted,
                controls: false,
            },
        );
        self.observer.observe(id);
    }

    /// Stop tracking a video whose element is going away.
    pub fn unregister(&mut self, id: &ItemId) {
        self.pause(id);
        self.observer.unobserve(id);
        self.videos.remove(id);
    }

    /// React to a round of visibility ratios. Only registered videos count.
    pub fn observe(&mut self, ratios: &[(ItemId, f32)]) {
        for entry in self.observer.measure(ratios) {
            if entry.is_intersecting {
                self.autoplay(&entry.id);
            } else {
                self.pause(&entry.id);
            }
        }
    }

    fn autoplay(&mut self, id: &ItemId) {
        match self.videos.get(id).map(|s| s.phase) {
            Some(VideoPhase::Paused) => self.start(id, false),
            Some(VideoPhase::Playing) | Some(VideoPhase::Blocked) | None => {}
        }
    }

    fn start(&mut self, id: &ItemId, user_initiated: bool) {
        if let Some(previous) = self.active.clone()
            && &previous != id
        {
            self.pause(&previous);
        }
        let result = self.backend.play(id, user_initiated);
        let Some(state) = self.videos.get_mut(id) else {
            return;
        };
        match result {
            Ok(()) => {
                state.phase = VideoPhase::Playing;
                self.active = Some(id.clone());
                debug!(%id, "playing");
            }
            Err(e) => {
                warn!(%id, error = %e, "falling back to controls");
                state.phase = VideoPhase::Blocked;
                state.controls = true;
                self.backend.show_controls(id);
            }
        }
    }

    fn pause(&mut self, id: &ItemId) {
        if let Some(state) = self.videos.get_mut(id)
            && state.phase == VideoPhase::Playing
        {
            state.phase = VideoPhase::Paused;
            self.backend.pause(id);
        }
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
    }

    /// Direct play/pause tap. Also the only way out of `Blocked`.
    pub fn toggle_play(&mut self, id: &ItemId) {
        match self.videos.get(id).map(|s| s.phase) {
            Some(VideoPhase::Playing) => self.pause(id),
            Some(VideoPhase::Paused) | Some(VideoPhase::Blocked) => self.start(id, true),
            None => {}
        }
    }

    /// Flip the global mute flag and apply it to every video. Returns the
    /// new state for the caller to persist.
    pub fn toggle_global_mute(&mut self) -> bool {
        self.apply_mute(!self.muted);
        self.muted
    }

    /// A tap on a video's own mute control. The element's new value becomes
    /// the global value. Returns `None` for unknown ids.
    pub fn tap_video(&mut self, id: &ItemId) -> Option<bool> {
        let muted = !self.videos.get(id)?.muted;
        self.apply_mute(muted);
        Some(muted)
    }

    fn apply_mute(&mut self, muted: bool) {
        self.muted = muted;
        for (id, state) in self.videos.iter_mut() {
            state.muted = muted;
            self.backend.set_muted(id, muted);
        }
        debug!(muted, videos = self.videos.len(), "mute applied");
    }
}
