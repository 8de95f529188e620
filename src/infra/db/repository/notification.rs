use crate::domain::{Notification, NotificationKind, PageBounds};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

const NOTIFICATION_COLUMNS: &str =
    "seq, id, recipient_id, actor_id, kind, post_id, comment_id, reply_id, read, created_at";

pub struct NotificationRepository<'c> {
    conn: &'c Connection,
}

impl<'c> NotificationRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert unless a notification with the same dedup key exists.
    /// Returns `true` when a row was written.
    pub fn insert_if_absent(&self, notification: &Notification, dedup_key: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO notifications (
                id, recipient_id, actor_id, kind, post_id, comment_id, reply_id,
                dedup_key, read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                notification.id,
                notification.recipient_id,
                notification.actor_id,
                notification.kind.to_string(),
                notification.post_id,
                notification.comment_id,
                notification.reply_id,
                dedup_key,
                notification.read,
                notification.created_at
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn delete_by_dedup_key(&self, dedup_key: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM notifications WHERE dedup_key = ?1", [dedup_key])?;
        Ok(affected)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Notification>> {
        let notification = self
            .conn
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
                [id],
                Self::row_to_notification,
            )
            .optional()?;
        Ok(notification)
    }

    /// Notifications for a recipient, newest first.
    pub fn page_for_recipient(
        &self,
        recipient_id: &str,
        bounds: PageBounds,
    ) -> Result<Vec<(i64, Notification)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = ?1 AND seq < ?2
            ORDER BY seq DESC
            LIMIT ?3
            "#
        ))?;
        let rows = stmt.query_map(
            params![recipient_id, bounds.before_seq(), bounds.fetch()],
            |row| Ok((row.get(0)?, Self::row_to_notification(row)?)),
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_for_recipient(&self, recipient_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
            [recipient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn unread_count(&self, recipient_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
            [recipient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn mark_read(&self, id: &str) -> Result<usize> {
        let updated = self
            .conn
            .execute("UPDATE notifications SET read = 1 WHERE id = ?1 AND read = 0", [id])?;
        Ok(updated)
    }

    pub fn mark_all_read(&self, recipient_id: &str) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
            [recipient_id],
        )?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", [id])?;
        Ok(affected)
    }

    fn row_to_notification(row: &Row) -> rusqlite::Result<Notification> {
        let kind: String = row.get(4)?;
        let kind = NotificationKind::from_str(&kind).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        Ok(Notification {
            id: row.get(1)?,
            recipient_id: row.get(2)?,
            actor_id: row.get(3)?,
            kind,
            post_id: row.get(5)?,
            comment_id: row.get(6)?,
            reply_id: row.get(7)?,
            read: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
