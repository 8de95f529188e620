use super::require_user;
use super::views::ViewBuilder;
use crate::domain::{
    Notification, NotificationSettings, NotificationSettingsPatch, NotificationView, Page,
    PageRequest, SocialError, SocialResult,
};
use crate::infra::db::repository::{NotificationRepository, SettingsRepository, now};
use crate::state::AppState;
use rusqlite::Connection;

/// A recipient's notifications, newest first.
pub fn list_notifications(
    state: &AppState,
    recipient_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<NotificationView>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        let rows = NotificationRepository::new(conn).page_for_recipient(recipient_id, bounds)?;
        let mut views = ViewBuilder::new(conn, &state.media, recipient_id);
        Page::from_rows(rows, bounds.limit).try_map(|n| views.notification(n))
    })
}

pub fn unread_count(state: &AppState, recipient_id: &str) -> SocialResult<i64> {
    state
        .db
        .read(|conn| Ok(NotificationRepository::new(conn).unread_count(recipient_id)?))
}

pub fn mark_read(state: &AppState, recipient_id: &str, notification_id: &str) -> SocialResult<()> {
    state.db.with_transaction(|tx| {
        owned_notification(tx, recipient_id, notification_id)?;
        NotificationRepository::new(tx).mark_read(notification_id)?;
        Ok(())
    })
}

/// Returns how many notifications changed.
pub fn mark_all_read(state: &AppState, recipient_id: &str) -> SocialResult<usize> {
    state
        .db
        .with_transaction(|tx| Ok(NotificationRepository::new(tx).mark_all_read(recipient_id)?))
}

pub fn delete_notification(
    state: &AppState,
    recipient_id: &str,
    notification_id: &str,
) -> SocialResult<()> {
    state.db.with_transaction(|tx| {
        owned_notification(tx, recipient_id, notification_id)?;
        NotificationRepository::new(tx).delete(notification_id)?;
        Ok(())
    })
}

fn owned_notification(
    conn: &Connection,
    recipient_id: &str,
    notification_id: &str,
) -> SocialResult<Notification> {
    let notification = NotificationRepository::new(conn)
        .find_by_id(notification_id)?
        .ok_or_else(|| SocialError::not_found("Notification", notification_id))?;
    if notification.recipient_id != recipient_id {
        return Err(SocialError::Forbidden(
            "notification belongs to another user".into(),
        ));
    }
    Ok(notification)
}

/// Stored settings, or everything enabled when the user never saved any.
pub fn notification_settings(state: &AppState, user_id: &str) -> SocialResult<NotificationSettings> {
    state.db.read(|conn| {
        require_user(conn, user_id)?;
        Ok(SettingsRepository::new(conn).find_or_default(user_id)?)
    })
}

pub fn update_notification_settings(
    state: &AppState,
    user_id: &str,
    patch: &NotificationSettingsPatch,
) -> SocialResult<NotificationSettings> {
    state.db.with_transaction(|tx| {
        require_user(tx, user_id)?;
        let settings_repo = SettingsRepository::new(tx);
        let mut settings = settings_repo.find_or_default(user_id)?;
        settings.apply(patch);
        settings_repo.upsert(&settings, &now())?;
        Ok(settings)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::follows::follow;
    use crate::application::users::upsert_from_identity;
    use crate::domain::Identity;

    fn user_id(state: &AppState, name: &str) -> String {
        upsert_from_identity(
            state,
            &Identity {
                external_id: name.into(),
                email: Some(format!("{name}@example.com")),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_missing_settings_row_means_defaults() -> anyhow::Result<()> {
        let state = AppState::in_memory()?;
        let alice = user_id(&state, "alice");
        let settings = notification_settings(&state, &alice)?;
        assert_eq!(settings, NotificationSettings::defaults_for(alice.clone()));

        // Reading defaults does not write a row.
        let rows: i64 = state.db.read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM notification_settings", [], |row| row.get(0))
        })?;
        assert_eq!(rows, 0);
        Ok(())
    }

    #[test]
    fn test_update_settings_patch() -> anyhow::Result<()> {
        let state = AppState::in_memory()?;
        let alice = user_id(&state, "alice");
        update_notification_settings(
            &state,
            &alice,
            &NotificationSettingsPatch {
                follows: Some(false),
                ..Default::default()
            },
        )?;
        let settings = update_notification_settings(
            &state,
            &alice,
            &NotificationSettingsPatch {
                likes: Some(false),
                ..Default::default()
            },
        )?;
        assert!(!settings.follows);
        assert!(!settings.likes);
        assert!(settings.comments);
        Ok(())
    }

    #[test]
    fn test_mark_read_checks_recipient() -> anyhow::Result<()> {
        let state = AppState::in_memory()?;
        let alice = user_id(&state, "alice");
        let bob = user_id(&state, "bob");
        follow(&state, &bob, &alice)?;

        let page = list_notifications(&state, &alice, &PageRequest::default())?;
        assert_eq!(page.items.len(), 1);
        let id = page.items[0].notification.id.clone();
        assert_eq!(page.items[0].actor.username, "bob");

        assert!(matches!(
            mark_read(&state, &bob, &id),
            Err(SocialError::Forbidden(_))
        ));
        assert_eq!(unread_count(&state, &alice)?, 1);
        mark_read(&state, &alice, &id)?;
        assert_eq!(unread_count(&state, &alice)?, 0);

        delete_notification(&state, &alice, &id)?;
        assert!(list_notifications(&state, &alice, &PageRequest::default())?
            .items
            .is_empty());
        assert!(delete_notification(&state, &alice, &id).unwrap_err().is_not_found());
        Ok(())
    }
}
