//! Assembly of viewer-facing views from stored rows.

use crate::domain::{
    Comment, CommentView, Notification, NotificationView, Post, PostView, Reply, ReplyView,
    SocialError, SocialResult, User, UserId, UserSummary,
};
use crate::infra::db::repository::{LikeRepository, UserRepository};
use crate::utils::MediaResolver;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn user_summary(media: &MediaResolver, user: &User) -> UserSummary {
    UserSummary {
        id: user.id.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        avatar_url: media.resolve_opt(user.avatar.as_deref()),
    }
}

/// Builds views for one viewer, caching author lookups across a page.
pub struct ViewBuilder<'a> {
    conn: &'a Connection,
    media: &'a MediaResolver,
    viewer_id: &'a str,
    authors: HashMap<UserId, UserSummary>,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(conn: &'a Connection, media: &'a MediaResolver, viewer_id: &'a str) -> Self {
        Self {
            conn,
            media,
            viewer_id,
            authors: HashMap::new(),
        }
    }

    pub fn author(&mut self, user_id: &str) -> SocialResult<UserSummary> {
        if let Some(summary) = self.authors.get(user_id) {
            return Ok(summary.clone());
        }
        let user = UserRepository::new(self.conn)
            .find_by_id(user_id)?
            .ok_or_else(|| SocialError::not_found("User", user_id))?;
        let summary = user_summary(self.media, &user);
        self.authors.insert(user.id.clone(), summary.clone());
        Ok(summary)
    }

    pub fn post(&mut self, post: Post) -> SocialResult<PostView> {
        let author = self.author(&post.author_id)?;
        let liked_by_viewer = LikeRepository::new(self.conn).has_liked_post(self.viewer_id, &post.id)?;
        let media_urls = self.media.resolve_all(&post.media);
        Ok(PostView {
            post,
            author,
            media_urls,
            liked_by_viewer,
        })
    }

    pub fn comment(&mut self, comment: Comment) -> SocialResult<CommentView> {
        let author = self.author(&comment.author_id)?;
        let liked_by_viewer =
            LikeRepository::new(self.conn).has_liked_comment(self.viewer_id, &comment.id)?;
        Ok(CommentView {
            comment,
            author,
            liked_by_viewer,
        })
    }

    pub fn reply(&mut self, reply: Reply) -> SocialResult<ReplyView> {
        let author = self.author(&reply.author_id)?;
        Ok(ReplyView { reply, author })
    }

    pub fn notification(&mut self, notification: Notification) -> SocialResult<NotificationView> {
        let actor = self.author(&notification.actor_id)?;
        Ok(NotificationView {
            notification,
            actor,
        })
    }
}
