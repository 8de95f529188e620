//! SQLite database setup and connection management for Plaza
//! Handles database initialization, schema creation, migrations and transactions.

use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::PathBuf;
use std::sync::Arc;

pub type DbConn = Arc<Mutex<Connection>>;

const SCHEMA_VERSION: i32 = 2;

/// Database wrapper that manages the SQLite connection
pub struct Database {
    conn: DbConn,
}

impl Database {
    /// Create or open the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path();
        Self::open_at(path)
    }

    /// Create an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        Ok(db)
    }

    /// Create or open the database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        log::debug!("Opened database at {}", path.display());
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("PLAZA_DB_PATH") {
            return PathBuf::from(path);
        }
        crate::infra::app_config::app_data_dir().join("db.sqlite")
    }

    /// Run read-only work against the connection.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside a single transaction. Any error rolls everything back.
    pub fn with_transaction<T, E>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Initialize database schema
    fn init(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let existing_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if existing_version == 0 {
            // Fresh database - skip migrations and go directly to current version
            Self::create_schema(&conn)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        } else if existing_version < SCHEMA_VERSION {
            for version in (existing_version + 1)..=SCHEMA_VERSION {
                log::info!("Migrating database to schema version {}", version);
                Self::run_migration(&conn, version)?;
            }
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                external_id TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                display_name TEXT,
                email TEXT,
                bio TEXT,
                avatar TEXT,
                website TEXT,
                follower_count INTEGER NOT NULL DEFAULT 0,
                following_count INTEGER NOT NULL DEFAULT 0,
                post_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS follows (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id TEXT NOT NULL,
                followee_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(follower_id, followee_id),
                CHECK (follower_id <> followee_id),
                FOREIGN KEY(follower_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(followee_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS threads (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                author_id TEXT NOT NULL,
                post_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS posts (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL,
                media_json TEXT NOT NULL DEFAULT '[]',
                hashtags_json TEXT NOT NULL DEFAULT '[]',
                thread_id TEXT,
                thread_position INTEGER,
                like_count INTEGER NOT NULL DEFAULT 0,
                comment_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(thread_id) REFERENCES threads(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS post_likes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, post_id),
                FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(post_id) REFERENCES posts(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS comments (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                post_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL,
                like_count INTEGER NOT NULL DEFAULT 0,
                reply_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS comment_likes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                comment_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, comment_id),
                FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(comment_id) REFERENCES comments(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS replies (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                comment_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(comment_id) REFERENCES comments(id) ON DELETE CASCADE,
                FOREIGN KEY(post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS notifications (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                recipient_id TEXT NOT NULL,
                actor_id TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('like','comment_like','comment','reply','follow','mention')),
                post_id TEXT,
                comment_id TEXT,
                reply_id TEXT,
                dedup_key TEXT NOT NULL UNIQUE,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(recipient_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(actor_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY(comment_id) REFERENCES comments(id) ON DELETE CASCADE,
                FOREIGN KEY(reply_id) REFERENCES replies(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS notification_settings (
                user_id TEXT PRIMARY KEY,
                likes INTEGER NOT NULL DEFAULT 1,
                comments INTEGER NOT NULL DEFAULT 1,
                replies INTEGER NOT NULL DEFAULT 1,
                follows INTEGER NOT NULL DEFAULT 1,
                mentions INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS post_hashtags (
                post_id TEXT NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY(post_id, tag),
                FOREIGN KEY(post_id) REFERENCES posts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id, seq);
            CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id, seq);
            CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, seq);
            CREATE INDEX IF NOT EXISTS idx_posts_thread ON posts(thread_id, thread_position);
            CREATE INDEX IF NOT EXISTS idx_post_likes_post ON post_likes(post_id);
            CREATE INDEX IF NOT EXISTS idx_post_likes_user ON post_likes(user_id, seq);
            CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, seq);
            CREATE INDEX IF NOT EXISTS idx_comment_likes_comment ON comment_likes(comment_id);
            CREATE INDEX IF NOT EXISTS idx_replies_comment ON replies(comment_id, seq);
            CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, seq);
            CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(recipient_id, read);
            CREATE INDEX IF NOT EXISTS idx_post_hashtags_tag ON post_hashtags(tag);
            "#,
        )?;
        Ok(())
    }

    /// Execute a migration for the specified version.
    ///
    /// Migration scripts are embedded into the binary at compile time.
    fn run_migration(conn: &Connection, version: i32) -> Result<()> {
        let sql = match version {
            2 => include_str!("../../../migrations/0002_post_hashtags.sql"),
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown migration version: {}. Add the migration to run_migration() in database.rs",
                    version
                ));
            }
        };

        conn.execute_batch(sql)
            .map_err(|e| anyhow::anyhow!("Failed to execute migration {}: {}", version, e))?;

        Ok(())
    }
}
