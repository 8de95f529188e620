//! Interaction events: counter maintenance and notification fan-out.
//!
//! Every write that one user does to another user's content (a like, a
//! comment, a reply, a follow, a mention) goes through [`record`] inside the
//! same transaction that wrote the edge or child row. [`revoke`] undoes it.
//!
//! Guarantees, given the caller only records after a row was actually
//! inserted:
//! - counters move by exactly one per event and never below zero;
//! - the actor never notifies themselves;
//! - each recipient gets at most one notification per event, and a replayed
//!   event finds the same dedup key and writes nothing;
//! - recipients are visited in a fixed order: primary recipients as listed,
//!   then mentions in text order.

use crate::domain::{
    Comment, CommentId, Notification, NotificationKind, Post, PostId, Reply, ReplyId, UserId,
};
use crate::infra::db::repository::{
    Counter, CounterRepository, NotificationRepository, SettingsRepository, UserRepository, new_id,
    now,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One interaction between an actor and a target entity.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub actor_id: UserId,
    pub kind: NotificationKind,
    /// Counters bumped by this event, with the id of the row holding each.
    pub counters: Vec<(Counter, String)>,
    pub post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
    pub reply_id: Option<ReplyId>,
    /// Identifies the event for deduplication
    pub source_id: String,
    /// Candidate recipients, in delivery order
    pub recipients: Vec<UserId>,
}

impl InteractionEvent {
    fn new(actor_id: &str, kind: NotificationKind, source_id: String) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            kind,
            counters: Vec::new(),
            post_id: None,
            comment_id: None,
            reply_id: None,
            source_id,
            recipients: Vec::new(),
        }
    }

    pub fn post_like(actor_id: &str, post: &Post) -> Self {
        let mut event = Self::new(
            actor_id,
            NotificationKind::Like,
            format!("{}/{}", post.id, actor_id),
        );
        event.counters.push((Counter::PostLikes, post.id.clone()));
        event.post_id = Some(post.id.clone());
        event.recipients.push(post.author_id.clone());
        event
    }

    pub fn comment_like(actor_id: &str, comment: &Comment) -> Self {
        let mut event = Self::new(
            actor_id,
            NotificationKind::CommentLike,
            format!("{}/{}", comment.id, actor_id),
        );
        event.counters.push((Counter::CommentLikes, comment.id.clone()));
        event.post_id = Some(comment.post_id.clone());
        event.comment_id = Some(comment.id.clone());
        event.recipients.push(comment.author_id.clone());
        event
    }

    pub fn comment(post: &Post, comment: &Comment) -> Self {
        let mut event = Self::new(
            &comment.author_id,
            NotificationKind::Comment,
            comment.id.clone(),
        );
        event.counters.push((Counter::PostComments, post.id.clone()));
        event.post_id = Some(post.id.clone());
        event.comment_id = Some(comment.id.clone());
        event.recipients.push(post.author_id.clone());
        event
    }

    /// The comment author hears first, then the post author.
    pub fn reply(post: &Post, comment: &Comment, reply: &Reply) -> Self {
        let mut event = Self::new(&reply.author_id, NotificationKind::Reply, reply.id.clone());
        event.counters.push((Counter::CommentReplies, comment.id.clone()));
        event.post_id = Some(post.id.clone());
        event.comment_id = Some(comment.id.clone());
        event.reply_id = Some(reply.id.clone());
        event.recipients.push(comment.author_id.clone());
        event.recipients.push(post.author_id.clone());
        event
    }

    pub fn follow(actor_id: &str, target_id: &str) -> Self {
        let mut event = Self::new(actor_id, NotificationKind::Follow, actor_id.to_string());
        event.counters.push((Counter::UserFollowers, target_id.to_string()));
        event.counters.push((Counter::UserFollowing, actor_id.to_string()));
        event.recipients.push(target_id.to_string());
        event
    }

    /// A new post: bumps the author's (and thread's) post count; only mentions notify.
    pub fn post_published(post: &Post) -> Self {
        let mut event = Self::post_edited(post);
        event.counters.push((Counter::UserPosts, post.author_id.clone()));
        if let Some(thread_id) = &post.thread_id {
            event.counters.push((Counter::ThreadPosts, thread_id.clone()));
        }
        event
    }

    /// An edited post: no counters, mentions only.
    pub fn post_edited(post: &Post) -> Self {
        let mut event = Self::new(&post.author_id, NotificationKind::Mention, post.id.clone());
        event.post_id = Some(post.id.clone());
        event
    }

    /// Source used for mention dedup keys: the most specific entity of the event.
    fn mention_source(&self) -> &str {
        self.reply_id
            .as_deref()
            .or(self.comment_id.as_deref())
            .or(self.post_id.as_deref())
            .unwrap_or(&self.source_id)
    }
}

pub fn dedup_key(kind: NotificationKind, source_id: &str, recipient_id: &str) -> String {
    format!("{kind}:{source_id}:{recipient_id}")
}

/// What a fan-out did, recipient by recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOut {
    /// Recipients that got a new notification, in delivery order
    pub notified: Vec<UserId>,
    pub skipped_self: usize,
    pub skipped_duplicate: usize,
    pub skipped_preference: usize,
    /// Mentioned usernames that match no account
    pub unknown_mentions: usize,
}

/// Apply an event's counters and deliver its notifications.
///
/// Must run inside the transaction that created the row the event is about.
pub fn record(conn: &Connection, event: &InteractionEvent, mentions: &[String]) -> Result<FanOut> {
    let counters = CounterRepository::new(conn);
    for (counter, id) in &event.counters {
        counters.adjust(*counter, id, 1)?;
    }

    let mut fan_out = FanOut::default();
    let mut seen: HashSet<UserId> = HashSet::new();

    for recipient in &event.recipients {
        deliver(
            conn,
            event,
            event.kind,
            &event.source_id,
            recipient,
            &mut seen,
            &mut fan_out,
        )?;
    }

    if !mentions.is_empty() {
        let users = UserRepository::new(conn);
        for username in mentions {
            let Some(user) = users.find_by_username(username)? else {
                log::debug!("Mention of unknown user @{}", username);
                fan_out.unknown_mentions += 1;
                continue;
            };
            deliver(
                conn,
                event,
                NotificationKind::Mention,
                event.mention_source(),
                &user.id,
                &mut seen,
                &mut fan_out,
            )?;
        }
    }

    Ok(fan_out)
}

fn deliver(
    conn: &Connection,
    event: &InteractionEvent,
    kind: NotificationKind,
    source_id: &str,
    recipient_id: &str,
    seen: &mut HashSet<UserId>,
    fan_out: &mut FanOut,
) -> Result<()> {
    if recipient_id == event.actor_id {
        fan_out.skipped_self += 1;
        return Ok(());
    }
    if seen.contains(recipient_id) {
        log::debug!("Skipping duplicate {} notification for {}", kind, recipient_id);
        fan_out.skipped_duplicate += 1;
        return Ok(());
    }

    let settings = SettingsRepository::new(conn).find_or_default(recipient_id)?;
    if !settings.allows(kind.category()) {
        log::debug!("{} has {} notifications off", recipient_id, kind);
        fan_out.skipped_preference += 1;
        return Ok(());
    }

    let notification = Notification {
        id: new_id(),
        recipient_id: recipient_id.to_string(),
        actor_id: event.actor_id.clone(),
        kind,
        post_id: event.post_id.clone(),
        comment_id: event.comment_id.clone(),
        reply_id: event.reply_id.clone(),
        read: false,
        created_at: now(),
    };
    let key = dedup_key(kind, source_id, recipient_id);
    // A recipient skipped for a preference stays eligible under another kind.
    seen.insert(recipient_id.to_string());
    if NotificationRepository::new(conn).insert_if_absent(&notification, &key)? {
        log::debug!("Notified {} ({})", recipient_id, key);
        fan_out.notified.push(recipient_id.to_string());
    } else {
        fan_out.skipped_duplicate += 1;
    }
    Ok(())
}

/// Undo an event: decrement its counters and withdraw its primary notifications.
pub fn revoke(conn: &Connection, event: &InteractionEvent) -> Result<usize> {
    let counters = CounterRepository::new(conn);
    for (counter, id) in &event.counters {
        counters.adjust(*counter, id, -1)?;
    }

    let notifications = NotificationRepository::new(conn);
    let mut withdrawn = 0;
    for recipient in &event.recipients {
        withdrawn +=
            notifications.delete_by_dedup_key(&dedup_key(event.kind, &event.source_id, recipient))?;
    }
    Ok(withdrawn)
}
