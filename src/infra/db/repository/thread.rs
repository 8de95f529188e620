use crate::domain::Thread;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub struct ThreadRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ThreadRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, thread: &Thread) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO threads (id, author_id, post_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                thread.id,
                thread.author_id,
                thread.post_count,
                thread.created_at,
                thread.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Thread>> {
        let thread = self
            .conn
            .query_row(
                "SELECT id, author_id, post_count, created_at, updated_at FROM threads WHERE id = ?1",
                [id],
                |row| {
                    Ok(Thread {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        post_count: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(thread)
    }

    pub fn touch(&self, id: &str, updated_at: &str) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE threads SET updated_at = ?2 WHERE id = ?1",
            params![id, updated_at],
        )?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM threads WHERE id = ?1", [id])?;
        Ok(affected)
    }
}
