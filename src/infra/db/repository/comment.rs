use crate::domain::{Comment, PageBounds};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COMMENT_COLUMNS: &str =
    "seq, id, post_id, author_id, content, like_count, reply_count, created_at";

pub struct CommentRepository<'c> {
    conn: &'c Connection,
}

impl<'c> CommentRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, like_count, reply_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                comment.id,
                comment.post_id,
                comment.author_id,
                comment.content,
                comment.like_count,
                comment.reply_count,
                comment.created_at
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Comment>> {
        let comment = self
            .conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                [id],
                Self::row_to_comment,
            )
            .optional()?;
        Ok(comment)
    }

    /// Comments on a post, newest first.
    pub fn page_for_post(&self, post_id: &str, bounds: PageBounds) -> Result<Vec<(i64, Comment)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = ?1 AND seq < ?2
            ORDER BY seq DESC
            LIMIT ?3
            "#
        ))?;
        let rows = stmt.query_map(params![post_id, bounds.before_seq(), bounds.fetch()], |row| {
            Ok((row.get(0)?, Self::row_to_comment(row)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
        Ok(affected)
    }

    fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(1)?,
            post_id: row.get(2)?,
            author_id: row.get(3)?,
            content: row.get(4)?,
            like_count: row.get(5)?,
            reply_count: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
