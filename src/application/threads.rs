use super::posts::{insert_post, remove_post, validate_new_post};
use super::views::ViewBuilder;
use super::{require_thread, require_user};
use crate::domain::{NewPost, PostView, SocialError, SocialResult, Thread, ThreadView};
use crate::infra::db::repository::{PostRepository, ThreadRepository, new_id, now};
use crate::state::AppState;
use rusqlite::Connection;

/// Publish a chain of posts as one thread.
pub fn create_thread(
    state: &AppState,
    actor_id: &str,
    parts: &[NewPost],
) -> SocialResult<ThreadView> {
    if parts.is_empty() {
        return Err(SocialError::InvalidInput("a thread needs at least one post".into()));
    }
    if parts.len() > state.config.max_thread_parts {
        return Err(SocialError::InvalidInput(format!(
            "a thread holds at most {} posts",
            state.config.max_thread_parts
        )));
    }
    let parts = parts
        .iter()
        .map(|p| validate_new_post(state, p))
        .collect::<SocialResult<Vec<_>>>()?;

    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let timestamp = now();
        let thread = Thread {
            id: new_id(),
            author_id: actor_id.to_string(),
            post_count: 0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };
        ThreadRepository::new(tx).insert(&thread)?;

        for (position, part) in parts.into_iter().enumerate() {
            insert_post(tx, actor_id, part, Some((&thread.id, position as i64)))?;
        }
        log::info!("Created thread {} by {}", thread.id, actor_id);
        thread_view(tx, state, actor_id, &thread.id)
    })
}

/// Add a post at the end of a thread.
pub fn append_to_thread(
    state: &AppState,
    actor_id: &str,
    thread_id: &str,
    part: &NewPost,
) -> SocialResult<PostView> {
    let part = validate_new_post(state, part)?;
    state.db.with_transaction(|tx| {
        let thread = require_thread(tx, thread_id)?;
        if thread.author_id != actor_id {
            return Err(SocialError::Forbidden(
                "only the author can extend a thread".into(),
            ));
        }
        if thread.post_count as usize >= state.config.max_thread_parts {
            return Err(SocialError::InvalidInput(format!(
                "a thread holds at most {} posts",
                state.config.max_thread_parts
            )));
        }
        let position = PostRepository::new(tx).next_thread_position(thread_id)?;
        let post = insert_post(tx, actor_id, part, Some((&thread.id, position)))?;
        ThreadRepository::new(tx).touch(thread_id, &now())?;
        ViewBuilder::new(tx, &state.media, actor_id).post(post)
    })
}

pub fn get_thread(state: &AppState, viewer_id: &str, thread_id: &str) -> SocialResult<ThreadView> {
    state.db.read(|conn| thread_view(conn, state, viewer_id, thread_id))
}

/// Delete a thread and every post in it.
pub fn delete_thread(state: &AppState, actor_id: &str, thread_id: &str) -> SocialResult<usize> {
    state.db.with_transaction(|tx| {
        let thread = require_thread(tx, thread_id)?;
        if thread.author_id != actor_id {
            return Err(SocialError::Forbidden(
                "only the author can delete a thread".into(),
            ));
        }
        let posts = PostRepository::new(tx).list_thread(thread_id)?;
        for post in &posts {
            remove_post(tx, post)?;
        }
        ThreadRepository::new(tx).delete(thread_id)?;
        log::info!("Deleted thread {} ({} posts)", thread_id, posts.len());
        Ok(posts.len())
    })
}

fn thread_view(
    conn: &Connection,
    state: &AppState,
    viewer_id: &str,
    thread_id: &str,
) -> SocialResult<ThreadView> {
    let thread = require_thread(conn, thread_id)?;
    let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
    let author = views.author(&thread.author_id)?;
    let posts = PostRepository::new(conn)
        .list_thread(thread_id)?
        .into_iter()
        .map(|p| views.post(p))
        .collect::<SocialResult<Vec<_>>>()?;
    Ok(ThreadView {
        thread,
        author,
        posts,
    })
}
