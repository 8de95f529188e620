use crate::domain::{PageBounds, Reply};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const REPLY_COLUMNS: &str = "seq, id, comment_id, post_id, author_id, content, created_at";

pub struct ReplyRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ReplyRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, reply: &Reply) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO replies (id, comment_id, post_id, author_id, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                reply.id,
                reply.comment_id,
                reply.post_id,
                reply.author_id,
                reply.content,
                reply.created_at
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Reply>> {
        let reply = self
            .conn
            .query_row(
                &format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?1"),
                [id],
                Self::row_to_reply,
            )
            .optional()?;
        Ok(reply)
    }

    /// Replies under a comment in conversation order (oldest first).
    pub fn page_for_comment(
        &self,
        comment_id: &str,
        bounds: PageBounds,
    ) -> Result<Vec<(i64, Reply)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {REPLY_COLUMNS}
            FROM replies
            WHERE comment_id = ?1 AND seq > ?2
            ORDER BY seq ASC
            LIMIT ?3
            "#
        ))?;
        let rows = stmt.query_map(
            params![comment_id, bounds.after_seq(), bounds.fetch()],
            |row| Ok((row.get(0)?, Self::row_to_reply(row)?)),
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM replies WHERE id = ?1", [id])?;
        Ok(affected)
    }

    fn row_to_reply(row: &Row) -> rusqlite::Result<Reply> {
        Ok(Reply {
            id: row.get(1)?,
            comment_id: row.get(2)?,
            post_id: row.get(3)?,
            author_id: row.get(4)?,
            content: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
