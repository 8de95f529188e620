use super::comment::{CommentId, ReplyId};
use super::post::PostId;
use super::user::{UserId, UserSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a notification
pub type NotificationId = String;

/// What happened to produce a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked your post
    Like,
    /// Someone liked your comment
    CommentLike,
    /// Someone commented on your post
    Comment,
    /// Someone replied to your comment, or under your post
    Reply,
    /// Someone followed you
    Follow,
    /// Someone mentioned you with `@username`
    Mention,
}

impl NotificationKind {
    /// Preference bucket that gates this kind.
    pub fn category(self) -> NotificationCategory {
        match self {
            Self::Like | Self::CommentLike => NotificationCategory::Likes,
            Self::Comment => NotificationCategory::Comments,
            Self::Reply => NotificationCategory::Replies,
            Self::Follow => NotificationCategory::Follows,
            Self::Mention => NotificationCategory::Mentions,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::CommentLike => write!(f, "comment_like"),
            Self::Comment => write!(f, "comment"),
            Self::Reply => write!(f, "reply"),
            Self::Follow => write!(f, "follow"),
            Self::Mention => write!(f, "mention"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "comment_like" | "comment-like" => Ok(Self::CommentLike),
            "comment" => Ok(Self::Comment),
            "reply" => Ok(Self::Reply),
            "follow" => Ok(Self::Follow),
            "mention" => Ok(Self::Mention),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// Per-user preference buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Likes,
    Comments,
    Replies,
    Follows,
    Mentions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub kind: NotificationKind,
    #[serde(default)]
    pub post_id: Option<PostId>,
    #[serde(default)]
    pub comment_id: Option<CommentId>,
    #[serde(default)]
    pub reply_id: Option<ReplyId>,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub notification: Notification,
    pub actor: UserSummary,
}

/// Which notification categories a user wants to receive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    pub user_id: UserId,
    pub likes: bool,
    pub comments: bool,
    pub replies: bool,
    pub follows: bool,
    pub mentions: bool,
}

impl NotificationSettings {
    /// Settings used when a user never saved any: everything on.
    pub fn defaults_for(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            likes: true,
            comments: true,
            replies: true,
            follows: true,
            mentions: true,
        }
    }

    pub fn allows(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::Likes => self.likes,
            NotificationCategory::Comments => self.comments,
            NotificationCategory::Replies => self.replies,
            NotificationCategory::Follows => self.follows,
            NotificationCategory::Mentions => self.mentions,
        }
    }

    pub fn apply(&mut self, patch: &NotificationSettingsPatch) {
        if let Some(v) = patch.likes {
            self.likes = v;
        }
        if let Some(v) = patch.comments {
            self.comments = v;
        }
        if let Some(v) = patch.replies {
            self.replies = v;
        }
        if let Some(v) = patch.follows {
            self.follows = v;
        }
        if let Some(v) = patch.mentions {
            self.mentions = v;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettingsPatch {
    #[serde(default)]
    pub likes: Option<bool>,
    #[serde(default)]
    pub comments: Option<bool>,
    #[serde(default)]
    pub replies: Option<bool>,
    #[serde(default)]
    pub follows: Option<bool>,
    #[serde(default)]
    pub mentions: Option<bool>,
}
