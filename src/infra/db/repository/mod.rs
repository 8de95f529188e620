//! Repository implementations for data access in Plaza.
//!
//! Repositories borrow a connection, so the same code runs on a plain
//! connection for reads and on a transaction for multi-row writes.

mod comment;
mod counter;
mod follow;
mod like;
mod notification;
mod post;
mod reply;
mod settings;
mod thread;
mod user;

pub use comment::CommentRepository;
pub use counter::{Counter, CounterRepository};
pub use follow::FollowRepository;
pub use like::LikeRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use reply::ReplyRepository;
pub use settings::SettingsRepository;
pub use thread::ThreadRepository;
pub use user::UserRepository;

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC3339 timestamp.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(super) fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

pub(super) fn from_json(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

#[cfg(test)]
mod tests;
