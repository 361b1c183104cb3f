use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Feed item identifier. The server sends either a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: ItemId,
    pub media_type: MediaType,
    pub media_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "likes")]
    pub like_count: u64,
    #[serde(default)]
    pub liked: bool,
}

impl FeedItem {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Display name, falling back for anonymous uploads.
    pub fn author(&self) -> &str {
        if self.username.is_empty() {
            "anonymous"
        } else {
            &self.username
        }
    }
}

/// One response from the feed endpoint.
///
/// A missing `hasMore` means the server made no claim, which is treated the
/// same as `true`: only an explicit `false` ends the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub items: Vec<FeedItem>,
    #[serde(rename = "hasMore", default = "more_by_default")]
    pub has_more: bool,
}

fn more_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeAction {
    pub fn is_liked(&self) -> bool {
        matches!(self, LikeAction::Liked)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LikeResponse {
    pub status: String,
    #[serde(default)]
    pub action: Option<LikeAction>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LikeResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success" && self.action.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MuteRequest {
    pub is_muted: bool,
}
