use super::interaction::{self, InteractionEvent};
use super::views::ViewBuilder;
use super::{require_comment, require_post, require_user};
use crate::domain::{Comment, CommentView, Page, PageRequest, SocialError, SocialResult};
use crate::infra::db::repository::{
    CommentRepository, Counter, CounterRepository, LikeRepository, new_id, now,
};
use crate::state::AppState;
use crate::utils::{extract_mentions, normalize_content};

/// Comment on a post. The post author is notified, then anyone mentioned.
pub fn add_comment(
    state: &AppState,
    actor_id: &str,
    post_id: &str,
    content: &str,
) -> SocialResult<CommentView> {
    let content = normalize_content(content, state.config.max_comment_length)?;
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let post = require_post(tx, post_id)?;

        let comment = Comment {
            id: new_id(),
            post_id: post.id.clone(),
            author_id: actor_id.to_string(),
            content,
            like_count: 0,
            reply_count: 0,
            created_at: now(),
        };
        CommentRepository::new(tx).insert(&comment)?;

        let mentions = extract_mentions(&comment.content);
        let fan_out =
            interaction::record(tx, &InteractionEvent::comment(&post, &comment), &mentions)?;
        log::debug!(
            "Comment {} on {}: notified {:?}",
            comment.id,
            post.id,
            fan_out.notified
        );

        ViewBuilder::new(tx, &state.media, actor_id).comment(comment)
    })
}

/// The comment author or the post author may delete a comment.
pub fn delete_comment(state: &AppState, actor_id: &str, comment_id: &str) -> SocialResult<()> {
    state.db.with_transaction(|tx| {
        let comment = require_comment(tx, comment_id)?;
        let post = require_post(tx, &comment.post_id)?;
        if comment.author_id != actor_id && post.author_id != actor_id {
            return Err(SocialError::Forbidden(
                "only the comment or post author can delete a comment".into(),
            ));
        }
        CommentRepository::new(tx).delete(comment_id)?;
        interaction::revoke(tx, &InteractionEvent::comment(&post, &comment))?;
        Ok(())
    })
}

/// Returns the comment's like count.
pub fn like_comment(state: &AppState, actor_id: &str, comment_id: &str) -> SocialResult<i64> {
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let comment = require_comment(tx, comment_id)?;
        if LikeRepository::new(tx).like_comment(actor_id, comment_id, &now())? {
            interaction::record(tx, &InteractionEvent::comment_like(actor_id, &comment), &[])?;
        }
        Ok(CounterRepository::new(tx)
            .get(Counter::CommentLikes, comment_id)?
            .unwrap_or_default())
    })
}

pub fn unlike_comment(state: &AppState, actor_id: &str, comment_id: &str) -> SocialResult<i64> {
    state.db.with_transaction(|tx| {
        let comment = require_comment(tx, comment_id)?;
        if LikeRepository::new(tx).unlike_comment(actor_id, comment_id)? {
            interaction::revoke(tx, &InteractionEvent::comment_like(actor_id, &comment))?;
        }
        Ok(CounterRepository::new(tx)
            .get(Counter::CommentLikes, comment_id)?
            .unwrap_or_default())
    })
}

/// Comments on a post, newest first.
pub fn list_comments(
    state: &AppState,
    viewer_id: &str,
    post_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<CommentView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_post(conn, post_id)?;
        let rows = CommentRepository::new(conn).page_for_post(post_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|c| views.comment(c))
    })
}
