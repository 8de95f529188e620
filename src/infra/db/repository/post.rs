use super::{from_json, to_json};
use crate::domain::{PageBounds, Post};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn post_columns(alias: &str) -> String {
    [
        "id",
        "author_id",
        "content",
        "media_json",
        "hashtags_json",
        "thread_id",
        "thread_position",
        "like_count",
        "comment_count",
        "created_at",
        "updated_at",
    ]
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn row_to_post(row: &Row) -> rusqlite::Result<Post> {
    let media_json: String = row.get(4)?;
    let hashtags_json: String = row.get(5)?;
    Ok(Post {
        id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        media: from_json(&media_json),
        hashtags: from_json(&hashtags_json),
        thread_id: row.get(6)?,
        thread_position: row.get(7)?,
        like_count: row.get(8)?,
        comment_count: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn row_to_seq_post(row: &Row) -> rusqlite::Result<(i64, Post)> {
    Ok((row.get(0)?, row_to_post(row)?))
}

pub struct PostRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PostRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a post and index its hashtags.
    pub fn insert(&self, post: &Post) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (
                id, author_id, content, media_json, hashtags_json, thread_id, thread_position,
                like_count, comment_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                post.id,
                post.author_id,
                post.content,
                to_json(&post.media),
                to_json(&post.hashtags),
                post.thread_id,
                post.thread_position,
                post.like_count,
                post.comment_count,
                post.created_at,
                post.updated_at
            ],
        )?;
        self.replace_hashtags(&post.id, &post.hashtags)?;
        Ok(())
    }

    pub fn update_content(
        &self,
        id: &str,
        content: &str,
        hashtags: &[String],
        updated_at: &str,
    ) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE posts SET content = ?2, hashtags_json = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, content, to_json(hashtags), updated_at],
        )?;
        if updated > 0 {
            self.replace_hashtags(id, hashtags)?;
        }
        Ok(updated)
    }

    fn replace_hashtags(&self, post_id: &str, hashtags: &[String]) -> Result<()> {
        self.conn
            .execute("DELETE FROM post_hashtags WHERE post_id = ?1", [post_id])?;
        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO post_hashtags (post_id, tag) VALUES (?1, ?2)")?;
        for tag in hashtags {
            stmt.execute(params![post_id, tag])?;
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT p.seq, {} FROM posts p WHERE p.id = ?1",
            post_columns("p")
        );
        let post = self.conn.query_row(&sql, [id], row_to_post).optional()?;
        Ok(post)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(affected)
    }

    /// Every post, newest first.
    pub fn page_all(&self, bounds: PageBounds) -> Result<Vec<(i64, Post)>> {
        self.page_where("1 = 1", None, bounds)
    }

    pub fn page_by_author(&self, author_id: &str, bounds: PageBounds) -> Result<Vec<(i64, Post)>> {
        self.page_where("p.author_id = ?3", Some(author_id), bounds)
    }

    /// Posts by people `viewer_id` follows, plus the viewer's own.
    pub fn page_following_feed(
        &self,
        viewer_id: &str,
        bounds: PageBounds,
    ) -> Result<Vec<(i64, Post)>> {
        self.page_where(
            "(p.author_id = ?3 OR p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?3))",
            Some(viewer_id),
            bounds,
        )
    }

    pub fn page_by_hashtag(&self, tag: &str, bounds: PageBounds) -> Result<Vec<(i64, Post)>> {
        self.page_where(
            "p.id IN (SELECT post_id FROM post_hashtags WHERE tag = ?3)",
            Some(tag),
            bounds,
        )
    }

    fn page_where(
        &self,
        predicate: &str,
        arg: Option<&str>,
        bounds: PageBounds,
    ) -> Result<Vec<(i64, Post)>> {
        let sql = format!(
            r#"
            SELECT p.seq, {}
            FROM posts p
            WHERE p.seq < ?1 AND {predicate}
            ORDER BY p.seq DESC
            LIMIT ?2
            "#,
            post_columns("p")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(arg) = arg {
            stmt.query_map(
                params![bounds.before_seq(), bounds.fetch(), arg],
                row_to_seq_post,
            )?
            .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![bounds.before_seq(), bounds.fetch()], row_to_seq_post)?
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    /// Posts liked by `user_id`, most recently liked first. The page key is the like.
    pub fn page_liked_by(&self, user_id: &str, bounds: PageBounds) -> Result<Vec<(i64, Post)>> {
        let sql = format!(
            r#"
            SELECT l.seq, {}
            FROM post_likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.user_id = ?1 AND l.seq < ?2
            ORDER BY l.seq DESC
            LIMIT ?3
            "#,
            post_columns("p")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, bounds.before_seq(), bounds.fetch()],
            row_to_seq_post,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Posts of a thread in position order.
    pub fn list_thread(&self, thread_id: &str) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT p.seq, {}
            FROM posts p
            WHERE p.thread_id = ?1
            ORDER BY p.thread_position, p.seq
            "#,
            post_columns("p")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([thread_id], row_to_post)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn next_thread_position(&self, thread_id: &str) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(thread_position) FROM posts WHERE thread_id = ?1",
            [thread_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }
}
