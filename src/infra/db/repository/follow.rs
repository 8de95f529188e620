use anyhow::Result;
use rusqlite::{Connection, params};

pub struct FollowRepository<'c> {
    conn: &'c Connection,
}

impl<'c> FollowRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Returns `true` only when a new edge was written.
    pub fn insert(&self, follower_id: &str, followee_id: &str, created_at: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
            params![follower_id, followee_id, created_at],
        )?;
        Ok(inserted == 1)
    }

    /// Returns `true` only when an edge was removed.
    pub fn delete(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower_id, followee_id],
        )?;
        Ok(removed == 1)
    }

    pub fn exists(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let found: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2)",
            params![follower_id, followee_id],
            |row| row.get(0),
        )?;
        Ok(found)
    }
}
