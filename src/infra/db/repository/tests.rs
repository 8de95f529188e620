use crate::domain::{
    Comment, Notification, NotificationKind, NotificationSettings, PageBounds, PageRequest, Post,
    Reply, Thread, User,
};
use crate::infra::db::Database;
use crate::infra::db::repository::*;
use rusqlite::Connection;

fn user(conn: &Connection, id: &str) -> anyhow::Result<User> {
    let user = User {
        id: id.into(),
        external_id: format!("ext-{id}"),
        username: id.into(),
        display_name: Some(id.to_uppercase()),
        email: None,
        bio: None,
        avatar: None,
        website: None,
        follower_count: 0,
        following_count: 0,
        post_count: 0,
        created_at: now(),
        updated_at: now(),
    };
    UserRepository::new(conn).insert(&user)?;
    Ok(user)
}

fn post(conn: &Connection, id: &str, author: &str, hashtags: &[&str]) -> anyhow::Result<Post> {
    let post = Post {
        id: id.into(),
        author_id: author.into(),
        content: format!("post {id}"),
        media: vec!["a.jpg".into()],
        hashtags: hashtags.iter().map(|t| t.to_string()).collect(),
        thread_id: None,
        thread_position: None,
        like_count: 0,
        comment_count: 0,
        created_at: now(),
        updated_at: now(),
    };
    PostRepository::new(conn).insert(&post)?;
    Ok(post)
}

fn comment(conn: &Connection, id: &str, post_id: &str, author: &str) -> anyhow::Result<Comment> {
    let comment = Comment {
        id: id.into(),
        post_id: post_id.into(),
        author_id: author.into(),
        content: "nice".into(),
        like_count: 0,
        reply_count: 0,
        created_at: now(),
    };
    CommentRepository::new(conn).insert(&comment)?;
    Ok(comment)
}

fn notification(id: &str, recipient: &str, actor: &str) -> Notification {
    Notification {
        id: id.into(),
        recipient_id: recipient.into(),
        actor_id: actor.into(),
        kind: NotificationKind::Follow,
        post_id: None,
        comment_id: None,
        reply_id: None,
        read: false,
        created_at: now(),
    }
}

#[test]
fn test_user_repository() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        let repo = UserRepository::new(conn);
        let mut alice = user(conn, "alice")?;
        user(conn, "alicia")?;
        user(conn, "bob")?;

        assert_eq!(repo.find_by_external_id("ext-alice")?.map(|u| u.id), Some("alice".into()));
        assert_eq!(repo.find_by_username("BOB")?.map(|u| u.id), Some("bob".into()));
        assert!(repo.find_by_id("nobody")?.is_none());

        assert!(repo.username_taken("alice", None)?);
        assert!(!repo.username_taken("alice", Some(&alice.id))?);

        alice.bio = Some("hello".into());
        alice.username = "alice_w".into();
        assert_eq!(repo.update_profile(&alice)?, 1);
        let stored = repo.find_by_id("alice")?.unwrap();
        assert_eq!(stored.bio.as_deref(), Some("hello"));
        assert_eq!(stored.username, "alice_w");

        let found = repo.search("ali", 10)?;
        assert_eq!(found.len(), 2);
        // LIKE wildcards in the query are literal.
        assert!(repo.search("%", 10)?.is_empty());
        Ok(())
    })
}

#[test]
fn test_follow_edges_and_pages() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        for id in ["a", "b", "c", "d"] {
            user(conn, id)?;
        }
        let follows = FollowRepository::new(conn);
        assert!(follows.insert("b", "a", &now())?);
        assert!(!follows.insert("b", "a", &now())?);
        assert!(follows.insert("c", "a", &now())?);
        assert!(follows.insert("d", "a", &now())?);
        assert!(follows.exists("b", "a")?);
        assert!(!follows.exists("a", "b")?);

        // The schema's CHECK drops self-follows.
        assert!(!follows.insert("a", "a", &now())?);
        assert!(!follows.exists("a", "a")?);

        let users = UserRepository::new(conn);
        let bounds = PageRequest::first(2).bounds(20, 100)?;
        let first = users.page_followers("a", bounds)?;
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].1.id, "d");

        let next = PageBounds {
            after: Some(first[1].0),
            limit: 2,
        };
        let rest = users.page_followers("a", next)?;
        assert_eq!(rest.iter().map(|(_, u)| u.id.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(users.page_following("b", bounds)?.len(), 1);

        assert!(follows.delete("b", "a")?);
        assert!(!follows.delete("b", "a")?);
        Ok(())
    })
}

#[test]
fn test_post_pages_and_hashtags() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        user(conn, "bob")?;
        user(conn, "carol")?;
        post(conn, "p1", "alice", &["rust"])?;
        post(conn, "p2", "bob", &["rust", "sqlite"])?;
        post(conn, "p3", "carol", &[])?;
        FollowRepository::new(conn).insert("alice", "bob", &now())?;

        let posts = PostRepository::new(conn);
        let bounds = PageRequest::default().bounds(20, 100)?;
        let ids = |rows: Vec<(i64, Post)>| rows.into_iter().map(|(_, p)| p.id).collect::<Vec<_>>();

        assert_eq!(ids(posts.page_all(bounds)?), vec!["p3", "p2", "p1"]);
        assert_eq!(ids(posts.page_by_author("bob", bounds)?), vec!["p2"]);
        assert_eq!(ids(posts.page_following_feed("alice", bounds)?), vec!["p2", "p1"]);
        assert_eq!(ids(posts.page_by_hashtag("rust", bounds)?), vec!["p2", "p1"]);

        posts.update_content("p2", "now about #go", &["go".to_string()], &now())?;
        assert_eq!(ids(posts.page_by_hashtag("rust", bounds)?), vec!["p1"]);
        assert_eq!(ids(posts.page_by_hashtag("go", bounds)?), vec!["p2"]);
        let stored = posts.find_by_id("p2")?.unwrap();
        assert_eq!(stored.hashtags, vec!["go"]);
        assert_eq!(stored.media, vec!["a.jpg"]);

        let likes = LikeRepository::new(conn);
        likes.like_post("carol", "p1", &now())?;
        likes.like_post("carol", "p3", &now())?;
        assert_eq!(ids(posts.page_liked_by("carol", bounds)?), vec!["p3", "p1"]);

        assert_eq!(posts.delete("p1")?, 1);
        assert!(ids(posts.page_by_hashtag("rust", bounds)?).is_empty());
        assert!(!likes.has_liked_post("carol", "p1")?);
        Ok(())
    })
}

#[test]
fn test_thread_positions() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        let thread = Thread {
            id: "t1".into(),
            author_id: "alice".into(),
            post_count: 0,
            created_at: now(),
            updated_at: now(),
        };
        ThreadRepository::new(conn).insert(&thread)?;

        let posts = PostRepository::new(conn);
        assert_eq!(posts.next_thread_position("t1")?, 0);
        let base = post(conn, "solo", "alice", &[])?;
        for (id, position) in [("t1-b", 1), ("t1-a", 0)] {
            posts.insert(&Post {
                id: id.into(),
                thread_id: Some("t1".into()),
                thread_position: Some(position),
                ..base.clone()
            })?;
        }
        let order: Vec<_> = posts.list_thread("t1")?.into_iter().map(|p| p.id).collect();
        assert_eq!(order, vec!["t1-a", "t1-b"]);
        assert_eq!(posts.next_thread_position("t1")?, 2);

        assert_eq!(ThreadRepository::new(conn).delete("t1")?, 1);
        assert!(posts.list_thread("t1")?.is_empty());
        Ok(())
    })
}

#[test]
fn test_comments_and_replies_cascade() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        user(conn, "bob")?;
        post(conn, "p1", "alice", &[])?;
        comment(conn, "c1", "p1", "bob")?;
        comment(conn, "c2", "p1", "alice")?;

        let replies = ReplyRepository::new(conn);
        for id in ["r1", "r2", "r3"] {
            replies.insert(&Reply {
                id: id.into(),
                comment_id: "c1".into(),
                post_id: "p1".into(),
                author_id: "alice".into(),
                content: "thanks".into(),
                created_at: now(),
            })?;
        }

        let bounds = PageRequest::first(2).bounds(20, 100)?;
        let page = replies.page_for_comment("c1", bounds)?;
        // Oldest first; three rows for a limit of two signals another page.
        assert_eq!(
            page.iter().map(|(_, r)| r.id.as_str()).collect::<Vec<_>>(),
            vec!["r1", "r2", "r3"]
        );

        let comments = CommentRepository::new(conn);
        let page = comments.page_for_post("p1", bounds)?;
        assert_eq!(page[0].1.id, "c2");

        LikeRepository::new(conn).like_comment("alice", "c1", &now())?;
        assert!(LikeRepository::new(conn).has_liked_comment("alice", "c1")?);

        PostRepository::new(conn).delete("p1")?;
        assert!(comments.find_by_id("c1")?.is_none());
        assert!(replies.find_by_id("r1")?.is_none());
        assert!(!LikeRepository::new(conn).has_liked_comment("alice", "c1")?);
        Ok(())
    })
}

#[test]
fn test_notification_dedup_and_read_state() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        user(conn, "bob")?;
        let repo = NotificationRepository::new(conn);

        assert!(repo.insert_if_absent(&notification("n1", "alice", "bob"), "follow:bob:alice")?);
        assert!(!repo.insert_if_absent(&notification("n2", "alice", "bob"), "follow:bob:alice")?);
        assert_eq!(repo.count_for_recipient("alice")?, 1);
        assert!(repo.find_by_id("n2")?.is_none());

        let stored = repo.find_by_id("n1")?.unwrap();
        assert_eq!(stored.kind, NotificationKind::Follow);
        assert!(!stored.read);

        repo.insert_if_absent(&notification("n3", "alice", "bob"), "other")?;
        assert_eq!(repo.unread_count("alice")?, 2);
        assert_eq!(repo.mark_read("n1")?, 1);
        assert_eq!(repo.mark_read("n1")?, 0);
        assert_eq!(repo.mark_all_read("alice")?, 1);
        assert_eq!(repo.unread_count("alice")?, 0);

        let bounds = PageRequest::default().bounds(20, 100)?;
        let page = repo.page_for_recipient("alice", bounds)?;
        assert_eq!(page[0].1.id, "n3");

        assert_eq!(repo.delete_by_dedup_key("follow:bob:alice")?, 1);
        assert_eq!(repo.delete("n3")?, 1);
        assert_eq!(repo.count_for_recipient("alice")?, 0);
        Ok(())
    })
}

#[test]
fn test_settings_upsert() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        let repo = SettingsRepository::new(conn);
        assert!(repo.find("alice")?.is_none());
        assert_eq!(
            repo.find_or_default("alice")?,
            NotificationSettings::defaults_for("alice")
        );

        let mut settings = NotificationSettings::defaults_for("alice");
        settings.mentions = false;
        repo.upsert(&settings, &now())?;
        settings.likes = false;
        repo.upsert(&settings, &now())?;

        let stored = repo.find("alice")?.unwrap();
        assert!(!stored.mentions);
        assert!(!stored.likes);
        assert!(stored.follows);
        Ok(())
    })
}

#[test]
fn test_counter_adjust_and_reconcile() -> anyhow::Result<()> {
    let db = Database::open_in_memory()?;
    db.read(|conn| {
        user(conn, "alice")?;
        user(conn, "bob")?;
        post(conn, "p1", "alice", &[])?;
        LikeRepository::new(conn).like_post("bob", "p1", &now())?;

        let counters = CounterRepository::new(conn);
        assert_eq!(Counter::PostLikes.to_string(), "posts.like_count");
        assert_eq!(counters.adjust(Counter::PostLikes, "p1", -1)?, 1);
        assert_eq!(counters.get(Counter::PostLikes, "p1")?, Some(0));
        assert_eq!(counters.get(Counter::PostLikes, "missing")?, None);

        assert_eq!(counters.reconcile(Counter::PostLikes)?, 1);
        assert_eq!(counters.get(Counter::PostLikes, "p1")?, Some(1));
        assert_eq!(counters.reconcile(Counter::PostLikes)?, 0);

        // user post counts were never bumped by the raw inserts above
        assert_eq!(counters.reconcile(Counter::UserPosts)?, 1);
        assert_eq!(counters.get(Counter::UserPosts, "alice")?, Some(1));
        Ok(())
    })
}
