//! Helpers shared by the handlers: media URL resolution and text parsing.

pub mod media;
pub mod text;

pub use media::MediaResolver;
pub use text::{extract_hashtags, extract_mentions, normalize_content};
