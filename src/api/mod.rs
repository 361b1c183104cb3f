mod client;
mod error;
mod types;

pub use client::{DEFAULT_API_BASE, FeedClient};
pub use error::ApiError;
pub use types::{FeedItem, FeedPage, ItemId, LikeAction, LikeResponse, MediaType};
