use anyhow::Result;
use rusqlite::{Connection, params};

/// Like edges for posts and comments. Inserts and deletes report whether a row changed,
/// which is what callers use to decide if a counter moves.
pub struct LikeRepository<'c> {
    conn: &'c Connection,
}

impl<'c> LikeRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn like_post(&self, user_id: &str, post_id: &str, created_at: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO post_likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, post_id, created_at],
        )?;
        Ok(inserted == 1)
    }

    pub fn unlike_post(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
        )?;
        Ok(removed == 1)
    }

    pub fn has_liked_post(&self, user_id: &str, post_id: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE user_id = ?1 AND post_id = ?2)",
            user_id,
            post_id,
        )
    }

    pub fn like_comment(&self, user_id: &str, comment_id: &str, created_at: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO comment_likes (user_id, comment_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, comment_id, created_at],
        )?;
        Ok(inserted == 1)
    }

    pub fn unlike_comment(&self, user_id: &str, comment_id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM comment_likes WHERE user_id = ?1 AND comment_id = ?2",
            params![user_id, comment_id],
        )?;
        Ok(removed == 1)
    }

    pub fn has_liked_comment(&self, user_id: &str, comment_id: &str) -> Result<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM comment_likes WHERE user_id = ?1 AND comment_id = ?2)",
            user_id,
            comment_id,
        )
    }

    fn exists(&self, sql: &str, a: &str, b: &str) -> Result<bool> {
        let found: bool = self.conn.query_row(sql, params![a, b], |row| row.get(0))?;
        Ok(found)
    }
}
