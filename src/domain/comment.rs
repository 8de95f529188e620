use super::post::PostId;
use super::user::{UserId, UserSummary};
use serde::{Deserialize, Serialize};

/// Unique identifier for a comment
pub type CommentId = String;

/// Unique identifier for a reply
pub type ReplyId = String;

/// Top-level comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub created_at: String,
}

/// Reply to a comment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub id: ReplyId,
    pub comment_id: CommentId,
    /// Post of the parent comment, denormalized for notification links
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: UserSummary,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyView {
    pub reply: Reply,
    pub author: UserSummary,
}
