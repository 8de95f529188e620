use super::interaction::{self, InteractionEvent};
use super::views::ViewBuilder;
use super::{require_comment, require_post, require_reply, require_user};
use crate::domain::{Page, PageRequest, Reply, ReplyView, SocialError, SocialResult};
use crate::infra::db::repository::{ReplyRepository, new_id, now};
use crate::state::AppState;
use crate::utils::{extract_mentions, normalize_content};

/// Reply to a comment. The comment author and the post author are each
/// notified at most once, never the replier.
pub fn add_reply(
    state: &AppState,
    actor_id: &str,
    comment_id: &str,
    content: &str,
) -> SocialResult<ReplyView> {
    let content = normalize_content(content, state.config.max_comment_length)?;
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        let comment = require_comment(tx, comment_id)?;
        let post = require_post(tx, &comment.post_id)?;

        let reply = Reply {
            id: new_id(),
            comment_id: comment.id.clone(),
            post_id: post.id.clone(),
            author_id: actor_id.to_string(),
            content,
            created_at: now(),
        };
        ReplyRepository::new(tx).insert(&reply)?;

        let mentions = extract_mentions(&reply.content);
        interaction::record(
            tx,
            &InteractionEvent::reply(&post, &comment, &reply),
            &mentions,
        )?;
        ViewBuilder::new(tx, &state.media, actor_id).reply(reply)
    })
}

/// The reply, comment or post author may delete a reply.
pub fn delete_reply(state: &AppState, actor_id: &str, reply_id: &str) -> SocialResult<()> {
    state.db.with_transaction(|tx| {
        let reply = require_reply(tx, reply_id)?;
        let comment = require_comment(tx, &reply.comment_id)?;
        let post = require_post(tx, &reply.post_id)?;
        if ![&reply.author_id, &comment.author_id, &post.author_id]
            .iter()
            .any(|id| id.as_str() == actor_id)
        {
            return Err(SocialError::Forbidden(
                "not allowed to delete this reply".into(),
            ));
        }
        ReplyRepository::new(tx).delete(reply_id)?;
        interaction::revoke(tx, &InteractionEvent::reply(&post, &comment, &reply))?;
        Ok(())
    })
}

/// Replies in conversation order (oldest first).
pub fn list_replies(
    state: &AppState,
    viewer_id: &str,
    comment_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<ReplyView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_comment(conn, comment_id)?;
        let rows = ReplyRepository::new(conn).page_for_comment(comment_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, viewer_id);
        Page::from_rows(rows, bounds.limit).try_map(|r| views.reply(r))
    })
}
