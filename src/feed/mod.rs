//! The feed pipeline: a prefetch buffer feeding a bounded window of
//! rendered items, laid out on a scrolling viewport and watched for
//! visibility.

pub mod cache;
pub mod viewport;
pub mod visibility;
pub mod window;
