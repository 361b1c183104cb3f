//! Dynamic help text generation from keymaps.

use crate::app::Message;
use crate::keys::{Keymap, format_key};

/// A single help item representing one or more related actions.
pub struct HelpItem {
    /// Messages to look up keys for. Keys are joined with "/".
    messages: Vec<Message>,
    label: &'static str,
}

impl HelpItem {
    pub fn new(message: Message, label: &'static str) -> Self {
        Self {
            messages: vec![message],
            label,
        }
    }

    /// Paired actions, e.g. j/k for down/up.
    pub fn pair(first: Message, second: Message, label: &'static str) -> Self {
        Self {
            messages: vec![first, second],
            label,
        }
    }

    fn keys(&self, keymap: &Keymap) -> Option<String> {
        let keys: Vec<String> = self
            .messages
            .iter()
            .filter_map(|msg| {
                keymap
                    .find_key(msg)
                    .map(|(code, mods)| format_key(code, mods))
            })
            .collect();
        if keys.is_empty() {
            return None;
        }
        Some(keys.join("/"))
    }

    /// `keys:label`, or None if no keys are bound for any of the messages.
    pub fn format(&self, keymap: &Keymap) -> Option<String> {
        self.keys(keymap).map(|keys| format!("{}:{}", keys, self.label))
    }

    /// Returns (`keys_string`, label) for overlay display.
    pub fn format_for_overlay(&self, keymap: &Keymap) -> Option<(String, &'static str)> {
        self.keys(keymap).map(|keys| (keys, self.label))
    }
}

/// A collection of help items for a specific context.
pub struct HelpConfig {
    pub expanded: Vec<HelpItem>,
    pub compact: Vec<HelpItem>,
}

impl HelpConfig {
    pub fn format(&self, keymap: &Keymap, show_expanded: bool) -> String {
        let items = if show_expanded {
            &self.expanded
        } else {
            &self.compact
        };
        items
            .iter()
            .filter_map(|item| item.format(keymap))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Status bar help for the feed.
pub fn feed_help() -> HelpConfig {
    use Message::{
        Like, OpenMedia, Quit, ScrollBottom, ScrollDown, ScrollTop, ScrollUp, Tap, TapVideo,
        ToggleHelp, ToggleMute, TogglePlay,
    };
    HelpConfig {
        expanded: vec![
            HelpItem::pair(ScrollDown, ScrollUp, "scroll"),
            HelpItem::pair(ScrollTop, ScrollBottom, "top/bottom"),
            HelpItem::new(Tap, "tap"),
            HelpItem::new(Like, "like"),
            HelpItem::new(TogglePlay, "play"),
            HelpItem::new(ToggleMute, "mute"),
            HelpItem::new(TapVideo, "video mute"),
            HelpItem::new(OpenMedia, "open"),
            HelpItem::new(Quit, "quit"),
        ],
        compact: vec![
            HelpItem::new(Like, "like"),
            HelpItem::new(ToggleMute, "mute"),
            HelpItem::new(ToggleHelp, "help"),
            HelpItem::new(Quit, "quit"),
        ],
    }
}

/// A titled group of overlay entries.
pub struct HelpSection {
    pub title: &'static str,
    pub items: Vec<HelpItem>,
}

/// Overlay entries grouped by what they act on.
pub fn feed_overlay_sections() -> Vec<HelpSection> {
    use Message::{
        Like, OpenMedia, PageDown, PageUp, Quit, Refresh, ScrollBottom, ScrollDown, ScrollTop,
        ScrollUp, Tap, TapVideo, ToggleDebug, ToggleHelp, ToggleMute, TogglePlay,
    };
    vec![
        HelpSection {
            title: "Feed",
            items: vec![
                HelpItem::pair(ScrollDown, ScrollUp, "scroll"),
                HelpItem::pair(PageDown, PageUp, "page"),
                HelpItem::pair(ScrollTop, ScrollBottom, "top/bottom"),
                HelpItem::new(Refresh, "restart feed"),
            ],
        },
        HelpSection {
            title: "Focused card",
            items: vec![
                HelpItem::new(Tap, "tap (twice to like)"),
                HelpItem::new(Like, "like / unlike"),
                HelpItem::new(OpenMedia, "open media"),
            ],
        },
        HelpSection {
            title: "Video",
            items: vec![
                HelpItem::new(TogglePlay, "play / pause"),
                HelpItem::new(TapVideo, "mute button"),
                HelpItem::new(ToggleMute, "mute all videos"),
            ],
        },
        HelpSection {
            title: "App",
            items: vec![
                HelpItem::new(ToggleDebug, "debug"),
                HelpItem::new(ToggleHelp, "close"),
                HelpItem::new(Quit, "quit"),
            ],
        },
    ]
}
