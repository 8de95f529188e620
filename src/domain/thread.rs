use super::post::PostView;
use super::user::{UserId, UserSummary};
use serde::{Deserialize, Serialize};

/// Unique identifier for a thread
pub type ThreadId = String;

/// An ordered chain of posts written by one author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    pub id: ThreadId,
    pub author_id: UserId,
    pub post_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    pub thread: Thread,
    pub author: UserSummary,
    /// Posts in thread order
    pub posts: Vec<PostView>,
}
