use super::interaction::{self, InteractionEvent};
use super::views::ViewBuilder;
use super::{require_post, require_user};
use crate::domain::{
    NewPost, Page, PageRequest, Post, PostView, ReconcileReport, SocialError, SocialResult,
    ThreadId,
};
use crate::infra::db::repository::{
    Counter, CounterRepository, LikeRepository, PostRepository, new_id, now,
};
use crate::state::AppState;
use crate::utils::{extract_hashtags, extract_mentions, normalize_content};
use rusqlite::Connection;

/// Validate a new post against the configured limits.
pub(crate) fn validate_new_post(state: &AppState, input: &NewPost) -> SocialResult<NewPost> {
    let content = normalize_content(&input.content, state.config.max_post_length)?;
    let media: Vec<String> = input
        .media
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if media.len() > state.config.max_media_per_post {
        return Err(SocialError::InvalidInput(format!(
            "at most {} media attachments per post",
            state.config.max_media_per_post
        )));
    }
    Ok(NewPost { content, media })
}

/// Insert a validated post and record its side effects. Runs inside the caller's transaction.
pub(crate) fn insert_post(
    conn: &Connection,
    author_id: &str,
    input: NewPost,
    thread: Option<(&ThreadId, i64)>,
) -> SocialResult<Post> {
    let timestamp = now();
    let post = Post {
        id: new_id(),
        author_id: author_id.to_string(),
        hashtags: extract_hashtags(&input.content),
        content: input.content,
        media: input.media,
        thread_id: thread.map(|(id, _)| id.clone()),
        thread_position: thread.map(|(_, position)| position),
        like_count: 0,
        comment_count: 0,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    PostRepository::new(conn).insert(&post)?;

    let mentions = extract_mentions(&post.content);
    let fan_out = interaction::record(conn, &InteractionEvent::post_published(&post), &mentions)?;
    log::debug!(
        "Published post {} by {} ({} mention notifications)",
        post.id,
        author_id,
        fan_out.notified.len()
    );

    // Counters were bumped after the insert; return the row as stored.
    require_post(conn, &post.id)
}

/// Remove a post and undo its counters. Runs inside the caller's transaction.
pub(crate) fn remove_post(conn: &Connection, post: &Post) -> SocialResult<()> {
    PostRepository::new(conn).delete(&post.id)?;
    interaction::revoke(conn, &InteractionEvent::post_published(post))?;
    Ok(())
}

pub fn create_post(state: &AppState, actor_id: &str, input: &NewPost) -> SocialResult<PostView> {
    let input = validate_new_post(state, input)?;
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let post = insert_post(tx, actor_id, input, None)?;
        ViewBuilder::new(tx, &state.media, actor_id).post(post)
    })
}

pub fn get_post(state: &AppState, viewer_id: &str, post_id: &str) -> SocialResult<PostView> {
    state.db.read(|conn| {
        let post = require_post(conn, post_id)?;
        ViewBuilder::new(conn, &state.media, viewer_id).post(post)
    })
}

/// Change a post's text. Users mentioned for the first time are notified.
pub fn edit_post(
    state: &AppState,
    actor_id: &str,
    post_id: &str,
    content: &str,
) -> SocialResult<PostView> {
    let content = normalize_content(content, state.config.max_post_length)?;
    state.db.with_transaction(|tx| {
        let post = require_post(tx, post_id)?;
        if post.author_id != actor_id {
            return Err(SocialError::Forbidden("only the author can edit a post".into()));
        }
        let hashtags = extract_hashtags(&content);
        PostRepository::new(tx).update_content(post_id, &content, &hashtags, &now())?;

        let post = require_post(tx, post_id)?;
        let mentions = extract_mentions(&post.content);
        interaction::record(tx, &InteractionEvent::post_edited(&post), &mentions)?;
        ViewBuilder::new(tx, &state.media, actor_id).post(post)
    })
}

pub fn delete_post(state: &AppState, actor_id: &str, post_id: &str) -> SocialResult<()> {
    state.db.with_transaction(|tx| {
        let post = require_post(tx, post_id)?;
        if post.author_id != actor_id {
            return Err(SocialError::Forbidden("only the author can delete a post".into()));
        }
        remove_post(tx, &post)?;
        log::info!("Deleted post {}", post_id);
        Ok(())
    })
}

/// Like a post. Liking twice is a no-op. Returns the post's like count.
pub fn like_post(state: &AppState, actor_id: &str, post_id: &str) -> SocialResult<i64> {
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let post = require_post(tx, post_id)?;
        if LikeRepository::new(tx).like_post(actor_id, post_id, &now())? {
            interaction::record(tx, &InteractionEvent::post_like(actor_id, &post), &[])?;
        }
        like_count(tx, post_id)
    })
}

/// Remove a like. Unliking a post that was not liked is a no-op.
pub fn unlike_post(state: &AppState, actor_id: &str, post_id: &str) -> SocialResult<i64> {
    state.db.with_transaction(|tx| {
        let post = require_post(tx, post_id)?;
        if LikeRepository::new(tx).unlike_post(actor_id, post_id)? {
            interaction::revoke(tx, &InteractionEvent::post_like(actor_id, &post))?;
        }
        like_count(tx, post_id)
    })
}

fn like_count(conn: &Connection, post_id: &str) -> SocialResult<i64> {
    Ok(CounterRepository::new(conn)
        .get(Counter::PostLikes, post_id)?
        .unwrap_or_default())
}

/// Every post, newest first.
pub fn feed(state: &AppState, viewer_id: &str, request: &PageRequest) -> SocialResult<Page<PostView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        let rows = PostRepository::new(conn).page_all(bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|p| views.post(p))
    })
}

/// Posts from followed users and the viewer, newest first.
pub fn following_feed(
    state: &AppState,
    viewer_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<PostView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        let rows = PostRepository::new(conn).page_following_feed(viewer_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|p| views.post(p))
    })
}

pub fn user_posts(
    state: &AppState,
    viewer_id: &str,
    author_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<PostView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_user(conn, author_id)?;
        let rows = PostRepository::new(conn).page_by_author(author_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|p| views.post(p))
    })
}

/// Posts `user_id` liked, most recently liked first.
pub fn liked_posts(
    state: &AppState,
    viewer_id: &str,
    user_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<PostView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_user(conn, user_id)?;
        let rows = PostRepository::new(conn).page_liked_by(user_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|p| views.post(p))
    })
}

pub fn posts_by_hashtag(
    state: &AppState,
    viewer_id: &str,
    tag: &str,
    request: &PageRequest,
) -> SocialResult<Page<PostView>> {
    let tag = tag.trim().trim_start_matches('#').to_lowercase();
    if tag.is_empty() {
        return Ok(Page::empty());
    }
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        let rows = PostRepository::new(conn).page_by_hashtag(&tag, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|p| views.post(p))
    })
}

/// Recompute every denormalized counter and repair drift.
pub fn reconcile_counters(state: &AppState) -> SocialResult<ReconcileReport> {
    state.db.with_transaction(|tx| {
        let counters = CounterRepository::new(tx);
        let mut report = ReconcileReport::default();
        for counter in Counter::ALL {
            let repaired = counters.reconcile(counter)?;
            match counter {
                Counter::PostLikes => report.post_likes = repaired,
                Counter::PostComments => report.post_comments = repaired,
                Counter::CommentLikes => report.comment_likes = repaired,
                Counter::CommentReplies => report.comment_replies = repaired,
                Counter::UserFollowers => report.user_followers = repaired,
                Counter::UserFollowing => report.user_following = repaired,
                Counter::UserPosts => report.user_posts = repaired,
                Counter::ThreadPosts => report.thread_posts = repaired,
            }
        }
        if report.total() > 0 {
            log::warn!("Repaired {} drifted counters", report.total());
        } else {
            log::info!("All counters consistent");
        }
        Ok(report)
    })
}
