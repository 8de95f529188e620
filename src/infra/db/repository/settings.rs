use crate::domain::NotificationSettings;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

/// Per-user notification preferences. Absence of a row is meaningful:
/// callers fall back to [`NotificationSettings::defaults_for`].
pub struct SettingsRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SettingsRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find(&self, user_id: &str) -> Result<Option<NotificationSettings>> {
        let settings = self
            .conn
            .query_row(
                r#"
                SELECT user_id, likes, comments, replies, follows, mentions
                FROM notification_settings
                WHERE user_id = ?1
                "#,
                [user_id],
                |row| {
                    Ok(NotificationSettings {
                        user_id: row.get(0)?,
                        likes: row.get(1)?,
                        comments: row.get(2)?,
                        replies: row.get(3)?,
                        follows: row.get(4)?,
                        mentions: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    pub fn find_or_default(&self, user_id: &str) -> Result<NotificationSettings> {
        Ok(self
            .find(user_id)?
            .unwrap_or_else(|| NotificationSettings::defaults_for(user_id)))
    }

    pub fn upsert(&self, settings: &NotificationSettings, updated_at: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO notification_settings (user_id, likes, comments, replies, follows, mentions, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id) DO UPDATE SET
                likes = excluded.likes,
                comments = excluded.comments,
                replies = excluded.replies,
                follows = excluded.follows,
                mentions = excluded.mentions,
                updated_at = excluded.updated_at
            "#,
            params![
                settings.user_id,
                settings.likes,
                settings.comments,
                settings.replies,
                settings.follows,
                settings.mentions,
                updated_at
            ],
        )?;
        Ok(())
    }
}
