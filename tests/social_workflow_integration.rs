//! Integration tests for the social handlers
//! These tests drive posts, comments, replies, follows and threads together
//! through the public API against an in-memory database.

use plaza::application::{comments, follows, posts, replies, threads, users};
use plaza::domain::{Identity, NewPost, PageRequest, ProfilePatch, SocialError, User};
use plaza::state::AppState;

fn sign_in(state: &AppState, name: &str) -> anyhow::Result<User> {
    Ok(users::upsert_from_identity(
        state,
        &Identity {
            external_id: format!("auth|{name}"),
            email: Some(format!("{name}@example.com")),
            name: Some(name.to_uppercase()),
            avatar: Some(format!("{name}.png")),
        },
    )?)
}

#[test]
fn test_feed_pagination_is_stable_under_inserts() -> anyhow::Result<()> {
    let state = AppState::in_memory()?;
    let alice = sign_in(&state, "alice")?;

    for i in 0..5 {
        posts::create_post(&state, &alice.id, &NewPost::text(format!("post {i}")))?;
    }

    let first = posts::feed(&state, &alice.id, &PageRequest::first(2))?;
    assert_eq!(
        first.items.iter().map(|p| p.post.content.as_str()).collect::<Vec<_>>(),
        vec!["post 4", "post 3"]
    );
    assert!(!first.is_done);

    // A new post between page requests must not shift the next page.
    posts::create_post(&state, &alice.id, &NewPost::text("late arrival"))?;

    let cursor = first.continue_cursor.clone().unwrap();
    let second = posts::feed(&state, &alice.id, &PageRequest::next(cursor, 2))?;
    assert_eq!(
        second.items.iter().map(|p| p.post.content.as_str()).collect::<Vec<_>>(),
        vec!["post 2", "post 1"]
    );

    let cursor = second.continue_cursor.clone().unwrap();
    let last = posts::feed(&state, &alice.id, &PageRequest::next(cursor, 2))?;
    assert_eq!(last.items.len(), 1);
    assert!(last.is_done);
    assert!(last.continue_cursor.is_none());

    let bad = posts::feed(&state, &alice.id, &PageRequest::next("%%%", 2));
    assert!(matches!(bad, Err(SocialError::InvalidCursor(_))));
    Ok(())
}

#[test]
fn test_following_feed_and_follow_counts() -> anyhow::Result<()> {
    let state = AppState::in_memory()?;
    let alice = sign_in(&state, "alice")?;
    let bob = sign_in(&state, "bob")?;
    let carol = sign_in(&state, "carol")?;

    posts::create_post(&state, &bob.id, &NewPost::text("from bob"))?;
    posts::create_post(&state, &carol.id, &NewPost::text("from carol"))?;
    posts::create_post(&state, &alice.id, &NewPost::text("from alice"))?;

    follows::follow(&state, &alice.id, &bob.id)?;
    follows::follow(&state, &alice.id, &bob.id)?;
    assert!(matches!(
        follows::follow(&state, &alice.id, &alice.id),
        Err(SocialError::InvalidInput(_))
    ));

    let feed = posts::following_feed(&state, &alice.id, &PageRequest::default())?;
    assert_eq!(
        feed.items.iter().map(|p| p.post.content.as_str()).collect::<Vec<_>>(),
        vec!["from alice", "from bob"]
    );

    assert_eq!(users::get_user(&state, &alice.id)?.following_count, 1);
    assert_eq!(users::get_user(&state, &bob.id)?.follower_count, 1);
    assert!(follows::is_following(&state, &alice.id, &bob.id)?);

    let followers = follows::followers(&state, &bob.id, &PageRequest::default())?;
    assert_eq!(followers.items.len(), 1);
    assert_eq!(followers.items[0].username, "alice");

    let profile = users::profile(&state, &alice.id, "bob")?;
    assert!(profile.followed_by_viewer);
    assert!(!profile.is_self);
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://files.plaza.local/storage/bob.png")
    );

    assert!(follows::unfollow(&state, &alice.id, &bob.id)?);
    assert!(!follows::unfollow(&state, &alice.id, &bob.id)?);
    assert_eq!(users::get_user(&state, &bob.id)?.follower_count, 0);
    assert_eq!(users::get_user(&state, &alice.id)?.following_count, 0);
    Ok(())
}

#[test]
fn test_comments_replies_and_delete_cascade() -> anyhow::Result<()> {
    let state = AppState::in_memory()?;
    let alice = sign_in(&state, "alice")?;
    let bob = sign_in(&state, "bob")?;
    let carol = sign_in(&state, "carol")?;

    let post = posts::create_post(&state, &alice.id, &NewPost::text("what do you think?"))?.post;
    let comment = comments::add_comment(&state, &bob.id, &post.id, "looks good")?.comment;
    comments::add_comment(&state, &carol.id, &post.id, "agreed")?;

    replies::add_reply(&state, &alice.id, &comment.id, "thanks!")?;
    replies::add_reply(&state, &carol.id, &comment.id, "+1")?;

    // Replies do not count as comments on the post.
    let stored = posts::get_post(&state, &alice.id, &post.id)?.post;
    assert_eq!(stored.comment_count, 2);

    let listed = comments::list_comments(&state, &alice.id, &post.id, &PageRequest::default())?;
    assert_eq!(listed.items[0].comment.content, "agreed");
    assert_eq!(listed.items[1].comment.reply_count, 2);

    let thread = replies::list_replies(&state, &bob.id, &comment.id, &PageRequest::default())?;
    assert_eq!(
        thread.items.iter().map(|r| r.reply.content.as_str()).collect::<Vec<_>>(),
        vec!["thanks!", "+1"]
    );

    assert_eq!(comments::like_comment(&state, &alice.id, &comment.id)?, 1);
    assert_eq!(comments::like_comment(&state, &alice.id, &comment.id)?, 1);
    assert_eq!(comments::unlike_comment(&state, &alice.id, &comment.id)?, 0);

    // Only the comment author or the post author may delete.
    assert!(matches!(
        comments::delete_comment(&state, &carol.id, &comment.id),
        Err(SocialError::Forbidden(_))
    ));
    comments::delete_comment(&state, &alice.id, &comment.id)?;
    assert_eq!(posts::get_post(&state, &alice.id, &post.id)?.post.comment_count, 1);
    assert!(
        replies::list_replies(&state, &bob.id, &comment.id, &PageRequest::default())
            .unwrap_err()
            .is_not_found()
    );

    posts::delete_post(&state, &alice.id, &post.id)?;
    assert!(
        comments::list_comments(&state, &alice.id, &post.id, &PageRequest::default())
            .unwrap_err()
            .is_not_found()
    );
    assert_eq!(posts::reconcile_counters(&state)?.total(), 0);
    Ok(())
}

#[test]
fn test_profile_update_rules() -> anyhow::Result<()> {
    let state = AppState::in_memory()?;
    let alice = sign_in(&state, "alice")?;
    sign_in(&state, "bob")?;

    let taken = users::update_profile(
        &state,
        &alice.id,
        &ProfilePatch {
            username: Some("bob".into()),
            ..Default::default()
        },
    );
    assert!(matches!(taken, Err(SocialError::Conflict(_))));

    let bad_site = users::update_profile(
        &state,
        &alice.id,
        &ProfilePatch {
            website: Some("javascript:alert(1)".into()),
            ..Default::default()
        },
    );
    assert!(matches!(bad_site, Err(SocialError::InvalidInput(_))));

    let updated = users::update_profile(
        &state,
        &alice.id,
        &ProfilePatch {
            username: Some("alice_w".into()),
            bio: Some("Writes about #rust".into()),
            ..Default::default()
        },
    )?;
    assert_eq!(updated.username, "alice_w");

    // Signing in again keeps the edited profile.
    let again = sign_in(&state, "alice")?;
    assert_eq!(again.id, alice.id);
    assert_eq!(again.username, "alice_w");
    assert_eq!(again.bio.as_deref(), Some("Writes about #rust"));

    let found = users::search_users(&state, "@alice", None)?;
    assert_eq!(found.len(), 1);
    Ok(())
}

#[test]
fn test_threads_and_hashtags() -> anyhow::Result<()> {
    let state = AppState::in_memory()?;
    let alice = sign_in(&state, "alice")?;
    let bob = sign_in(&state, "bob")?;

    let view = threads::create_thread(
        &state,
        &alice.id,
        &[
            NewPost::text("1/ notes on #sqlite"),
            NewPost::text("2/ keyset pagination"),
        ],
    )?;
    posts::like_post(&state, &bob.id, &view.posts[0].post.id)?;

    let tagged = posts::posts_by_hashtag(&state, &bob.id, "SQLite", &PageRequest::default())?;
    assert_eq!(tagged.items.len(), 1);
    assert!(tagged.items[0].liked_by_viewer);
    assert_eq!(tagged.items[0].post.thread_id.as_deref(), Some(view.thread.id.as_str()));

    let liked = posts::liked_posts(&state, &bob.id, &bob.id, &PageRequest::default())?;
    assert_eq!(liked.items.len(), 1);

    assert!(matches!(
        threads::delete_thread(&state, &bob.id, &view.thread.id),
        Err(SocialError::Forbidden(_))
    ));
    threads::delete_thread(&state, &alice.id, &view.thread.id)?;
    assert!(
        posts::posts_by_hashtag(&state, &bob.id, "sqlite", &PageRequest::default())?
            .items
            .is_empty()
    );
    assert!(
        posts::liked_posts(&state, &bob.id, &bob.id, &PageRequest::default())?
            .items
            .is_empty()
    );
    Ok(())
}
