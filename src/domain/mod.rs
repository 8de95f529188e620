//! Domain types for Plaza
//! Defines the core data structures shared by the storage and handler layers.

pub mod comment;
pub mod error;
pub mod notification;
pub mod page;
pub mod post;
pub mod thread;
pub mod user;

pub use comment::*;
pub use error::*;
pub use notification::*;
pub use page::*;
pub use post::*;
pub use thread::*;
pub use user::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_notification_kind_display_parse() {
        assert_eq!(NotificationKind::CommentLike.to_string(), "comment_like");
        assert_eq!(
            NotificationKind::from_str("FOLLOW").unwrap(),
            NotificationKind::Follow
        );
        assert!(NotificationKind::from_str("poke").is_err());
    }

    #[test]
    fn test_kind_categories() {
        assert_eq!(NotificationKind::Like.category(), NotificationCategory::Likes);
        assert_eq!(
            NotificationKind::CommentLike.category(),
            NotificationCategory::Likes
        );
        assert_eq!(
            NotificationKind::Reply.category(),
            NotificationCategory::Replies
        );
    }

    #[test]
    fn test_settings_patch_keeps_unset_fields() {
        let mut settings = NotificationSettings::defaults_for("u1");
        settings.apply(&NotificationSettingsPatch {
            likes: Some(false),
            ..Default::default()
        });
        assert!(!settings.allows(NotificationCategory::Likes));
        assert!(settings.allows(NotificationCategory::Comments));
        assert!(settings.allows(NotificationCategory::Mentions));
    }
}
