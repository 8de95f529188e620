use crate::domain::{PageBounds, User, UserId};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Column list for `users`, prefixed with `alias.`; row index 0 is always a `seq`.
pub(super) fn user_columns(alias: &str) -> String {
    [
        "id",
        "external_id",
        "username",
        "display_name",
        "email",
        "bio",
        "avatar",
        "website",
        "follower_count",
        "following_count",
        "post_count",
        "created_at",
        "updated_at",
    ]
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

pub(super) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(1)?,
        external_id: row.get(2)?,
        username: row.get(3)?,
        display_name: row.get(4)?,
        email: row.get(5)?,
        bio: row.get(6)?,
        avatar: row.get(7)?,
        website: row.get(8)?,
        follower_count: row.get(9)?,
        following_count: row.get(10)?,
        post_count: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(super) fn row_to_seq_user(row: &Row) -> rusqlite::Result<(i64, User)> {
    Ok((row.get(0)?, row_to_user(row)?))
}

/// Repository for user accounts.
pub struct UserRepository<'c> {
    conn: &'c Connection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (
                id, external_id, username, display_name, email, bio, avatar, website,
                follower_count, following_count, post_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                user.id,
                user.external_id,
                user.username,
                user.display_name,
                user.email,
                user.bio,
                user.avatar,
                user.website,
                user.follower_count,
                user.following_count,
                user.post_count,
                user.created_at,
                user.updated_at
            ],
        )?;
        Ok(())
    }

    /// Write the editable profile fields. Counters are never touched here.
    pub fn update_profile(&self, user: &User) -> Result<usize> {
        let updated = self.conn.execute(
            r#"
            UPDATE users SET
                username = ?2, display_name = ?3, email = ?4, bio = ?5,
                avatar = ?6, website = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.username,
                user.display_name,
                user.email,
                user.bio,
                user.avatar,
                user.website,
                user.updated_at
            ],
        )?;
        Ok(updated)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_one("u.id = ?1", id)
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.find_one("u.external_id = ?1", external_id)
    }

    /// Case-insensitive lookup (the column is `COLLATE NOCASE`).
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("u.username = ?1", username.trim_start_matches('@'))
    }

    fn find_one(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT u.seq, {} FROM users u WHERE {predicate}",
            user_columns("u")
        );
        let user = self
            .conn
            .query_row(&sql, [value], row_to_user)
            .optional()?;
        Ok(user)
    }

    pub fn username_taken(&self, username: &str, except_id: Option<&UserId>) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND id IS NOT ?2",
            params![username, except_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Prefix search on username or display name, most-followed first.
    pub fn search(&self, query: &str, limit: u32) -> Result<Vec<User>> {
        let pattern = format!("{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT u.seq, {}
            FROM users u
            WHERE u.username LIKE ?1 ESCAPE '\' OR u.display_name LIKE ?1 ESCAPE '\'
            ORDER BY u.follower_count DESC, u.username
            LIMIT ?2
            "#,
            user_columns("u")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, limit as i64], row_to_user)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Users that follow `user_id`, newest follow first.
    pub fn page_followers(&self, user_id: &str, bounds: PageBounds) -> Result<Vec<(i64, User)>> {
        self.page_follow_edges("f.followee_id", "f.follower_id", user_id, bounds)
    }

    /// Users that `user_id` follows, newest follow first.
    pub fn page_following(&self, user_id: &str, bounds: PageBounds) -> Result<Vec<(i64, User)>> {
        self.page_follow_edges("f.follower_id", "f.followee_id", user_id, bounds)
    }

    fn page_follow_edges(
        &self,
        anchor: &str,
        other: &str,
        user_id: &str,
        bounds: PageBounds,
    ) -> Result<Vec<(i64, User)>> {
        let sql = format!(
            r#"
            SELECT f.seq, {}
            FROM follows f
            JOIN users u ON u.id = {other}
            WHERE {anchor} = ?1 AND f.seq < ?2
            ORDER BY f.seq DESC
            LIMIT ?3
            "#,
            user_columns("u")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, bounds.before_seq(), bounds.fetch()],
            row_to_seq_user,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
