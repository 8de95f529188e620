//! Application layer (handlers).
//!
//! Each handler takes the [`AppState`](crate::state::AppState), the acting
//! user's id, and its inputs. Writes run in one transaction; reads see a
//! consistent connection.

pub mod comments;
pub mod follows;
pub mod interaction;
pub mod notifications;
pub mod posts;
pub mod replies;
pub mod threads;
pub mod users;
pub mod views;

use crate::domain::{Comment, Post, Reply, SocialError, SocialResult, Thread, User};
use crate::infra::db::repository::{
    CommentRepository, PostRepository, ReplyRepository, ThreadRepository, UserRepository,
};
use rusqlite::Connection;

pub(crate) fn require_user(conn: &Connection, id: &str) -> SocialResult<User> {
    UserRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| SocialError::not_found("User", id))
}

pub(crate) fn require_post(conn: &Connection, id: &str) -> SocialResult<Post> {
    PostRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| SocialError::not_found("Post", id))
}

pub(crate) fn require_comment(conn: &Connection, id: &str) -> SocialResult<Comment> {
    CommentRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| SocialError::not_found("Comment", id))
}

pub(crate) fn require_reply(conn: &Connection, id: &str) -> SocialResult<Reply> {
    ReplyRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| SocialError::not_found("Reply", id))
}

pub(crate) fn require_thread(conn: &Connection, id: &str) -> SocialResult<Thread> {
    ThreadRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| SocialError::not_found("Thread", id))
}
