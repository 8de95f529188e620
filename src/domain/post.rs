use super::thread::ThreadId;
use super::user::{StorageRef, UserId, UserSummary};
use serde::{Deserialize, Serialize};

/// Unique identifier for a post
pub type PostId = String;

/// A post in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    /// Attached media, in display order
    #[serde(default)]
    pub media: Vec<StorageRef>,
    /// Lower-case hashtags found in `content`
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Thread this post belongs to, if any
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    /// Zero-based position inside the thread
    #[serde(default)]
    pub thread_position: Option<i64>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for a new post (or a thread part).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub content: String,
    #[serde(default)]
    pub media: Vec<StorageRef>,
}

impl NewPost {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media: Vec::new(),
        }
    }
}

/// A post resolved for a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub post: Post,
    pub author: UserSummary,
    pub media_urls: Vec<String>,
    pub liked_by_viewer: bool,
}

/// Number of rows repaired per counter by a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub post_likes: usize,
    pub post_comments: usize,
    pub comment_likes: usize,
    pub comment_replies: usize,
    pub user_followers: usize,
    pub user_following: usize,
    pub user_posts: usize,
    pub thread_posts: usize,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.post_likes
            + self.post_comments
            + self.comment_likes
            + self.comment_replies
            + self.user_followers
            + self.user_following
            + self.user_posts
            + self.thread_posts
    }
}
