//! Denormalized counters and their reconciliation against the rows they count.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    PostLikes,
    PostComments,
    CommentLikes,
    CommentReplies,
    UserFollowers,
    UserFollowing,
    UserPosts,
    ThreadPosts,
}

impl Counter {
    pub const ALL: [Counter; 8] = [
        Counter::PostLikes,
        Counter::PostComments,
        Counter::CommentLikes,
        Counter::CommentReplies,
        Counter::UserFollowers,
        Counter::UserFollowing,
        Counter::UserPosts,
        Counter::ThreadPosts,
    ];

    fn table(self) -> &'static str {
        match self {
            Counter::PostLikes | Counter::PostComments => "posts",
            Counter::CommentLikes | Counter::CommentReplies => "comments",
            Counter::UserFollowers | Counter::UserFollowing | Counter::UserPosts => "users",
            Counter::ThreadPosts => "threads",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Counter::PostLikes | Counter::CommentLikes => "like_count",
            Counter::PostComments => "comment_count",
            Counter::CommentReplies => "reply_count",
            Counter::UserFollowers => "follower_count",
            Counter::UserFollowing => "following_count",
            Counter::UserPosts | Counter::ThreadPosts => "post_count",
        }
    }

    /// Correlated subquery giving the true value for the current row of `table()`.
    fn source(self) -> &'static str {
        match self {
            Counter::PostLikes => "SELECT COUNT(*) FROM post_likes WHERE post_likes.post_id = posts.id",
            Counter::PostComments => "SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id",
            Counter::CommentLikes => {
                "SELECT COUNT(*) FROM comment_likes WHERE comment_likes.comment_id = comments.id"
            }
            Counter::CommentReplies => {
                "SELECT COUNT(*) FROM replies WHERE replies.comment_id = comments.id"
            }
            Counter::UserFollowers => "SELECT COUNT(*) FROM follows WHERE follows.followee_id = users.id",
            Counter::UserFollowing => "SELECT COUNT(*) FROM follows WHERE follows.follower_id = users.id",
            Counter::UserPosts => "SELECT COUNT(*) FROM posts WHERE posts.author_id = users.id",
            Counter::ThreadPosts => "SELECT COUNT(*) FROM posts WHERE posts.thread_id = threads.id",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table(), self.column())
    }
}

pub struct CounterRepository<'c> {
    conn: &'c Connection,
}

impl<'c> CounterRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Add `delta` to a counter, never going below zero. Returns rows touched.
    pub fn adjust(&self, counter: Counter, id: &str, delta: i64) -> Result<usize> {
        let sql = format!(
            "UPDATE {table} SET {col} = MAX({col} + ?2, 0) WHERE id = ?1",
            table = counter.table(),
            col = counter.column()
        );
        let updated = self.conn.execute(&sql, params![id, delta])?;
        Ok(updated)
    }

    pub fn get(&self, counter: Counter, id: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE id = ?1",
            table = counter.table(),
            col = counter.column()
        );
        let value = self.conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
        Ok(value)
    }

    /// Recompute a counter from its source rows and repair every drifted value.
    pub fn reconcile(&self, counter: Counter) -> Result<usize> {
        let table = counter.table();
        let col = counter.column();
        let source = counter.source();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, {col}, ({source}) FROM {table} WHERE {col} <> ({source})"
        ))?;
        let drifted = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (id, stored, actual) in &drifted {
            log::warn!("Repairing {counter} for {id}: stored {stored}, actual {actual}");
        }

        if drifted.is_empty() {
            return Ok(0);
        }

        let repaired = self.conn.execute(
            &format!("UPDATE {table} SET {col} = ({source}) WHERE {col} <> ({source})"),
            [],
        )?;
        Ok(repaired)
    }
}
