use super::require_user;
use super::views::user_summary;
use crate::domain::{
    Identity, Profile, ProfilePatch, SocialError, SocialResult, User, UserId, UserSummary,
};
use crate::infra::db::repository::{FollowRepository, UserRepository, new_id, now};
use crate::state::AppState;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::Connection;

lazy_static! {
    static ref USERNAME: Regex = Regex::new(r"^[a-z0-9_]{3,30}$").unwrap();
}

const MAX_BIO_LENGTH: usize = 160;
const MAX_DISPLAY_NAME_LENGTH: usize = 50;
// Leaves room for a numeric suffix when the base is taken.
const USERNAME_BASE_LENGTH: usize = 24;

/// Create the account for a signed-in identity, or refresh the existing one.
///
/// Display name and avatar are only filled when the user has none, so
/// profile edits survive later sign-ins.
pub fn upsert_from_identity(state: &AppState, identity: &Identity) -> SocialResult<User> {
    let external_id = identity.external_id.trim();
    if external_id.is_empty() {
        return Err(SocialError::InvalidInput("external id is required".into()));
    }

    state.db.with_transaction(|tx| {
        let users = UserRepository::new(tx);
        let name = clean_optional(identity.name.as_deref());
        let avatar = clean_optional(identity.avatar.as_deref());
        let email = clean_optional(identity.email.as_deref());

        if let Some(mut user) = users.find_by_external_id(external_id)? {
            let mut changed = false;
            if email.is_some() && user.email != email {
                user.email = email;
                changed = true;
            }
            if user.display_name.is_none() && name.is_some() {
                user.display_name = name;
                changed = true;
            }
            if user.avatar.is_none() && avatar.is_some() {
                user.avatar = avatar;
                changed = true;
            }
            if changed {
                user.updated_at = now();
                users.update_profile(&user)?;
            }
            return Ok(user);
        }

        let base = username_base(email.as_deref(), name.as_deref());
        let username = unique_username(&users, &base)?;
        let timestamp = now();
        let user = User {
            id: new_id(),
            external_id: external_id.to_string(),
            username,
            display_name: name,
            email,
            bio: None,
            avatar,
            website: None,
            follower_count: 0,
            following_count: 0,
            post_count: 0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };
        users.insert(&user)?;
        log::info!("Created user {} (@{})", user.id, user.username);
        Ok(user)
    })
}

pub fn get_user(state: &AppState, id: &str) -> SocialResult<User> {
    state.db.read(|conn| require_user(conn, id))
}

pub fn get_by_username(state: &AppState, username: &str) -> SocialResult<User> {
    state.db.read(|conn| find_by_username(conn, username))
}

fn find_by_username(conn: &Connection, username: &str) -> SocialResult<User> {
    UserRepository::new(conn)
        .find_by_username(username)?
        .ok_or_else(|| SocialError::not_found("User", username))
}

pub fn profile(state: &AppState, viewer_id: &str, username: &str) -> SocialResult<Profile> {
    state.db.read(|conn| {
        let user = find_by_username(conn, username)?;
        let is_self = user.id == viewer_id;
        let followed_by_viewer = !is_self && FollowRepository::new(conn).exists(viewer_id, &user.id)?;
        let avatar_url = state.media.resolve_opt(user.avatar.as_deref());
        Ok(Profile {
            user,
            avatar_url,
            followed_by_viewer,
            is_self,
        })
    })
}

pub fn update_profile(state: &AppState, actor_id: &UserId, patch: &ProfilePatch) -> SocialResult<User> {
    state.db.with_transaction(|tx| {
        let users = UserRepository::new(tx);
        let mut user = require_user(tx, actor_id)?;

        if let Some(username) = &patch.username {
            let username = username.trim().trim_start_matches('@').to_lowercase();
            if !USERNAME.is_match(&username) {
                return Err(SocialError::InvalidInput(format!(
                    "username must be 3-30 characters of a-z, 0-9 or _: {username:?}"
                )));
            }
            if users.username_taken(&username, Some(&user.id))? {
                return Err(SocialError::Conflict(format!(
                    "username @{username} is taken"
                )));
            }
            user.username = username;
        }
        if let Some(display_name) = &patch.display_name {
            let display_name = clean_optional(Some(display_name));
            if display_name
                .as_ref()
                .is_some_and(|n| n.chars().count() > MAX_DISPLAY_NAME_LENGTH)
            {
                return Err(SocialError::InvalidInput(format!(
                    "display name is limited to {MAX_DISPLAY_NAME_LENGTH} characters"
                )));
            }
            user.display_name = display_name;
        }
        if let Some(bio) = &patch.bio {
            let bio = clean_optional(Some(bio));
            if bio.as_ref().is_some_and(|b| b.chars().count() > MAX_BIO_LENGTH) {
                return Err(SocialError::InvalidInput(format!(
                    "bio is limited to {MAX_BIO_LENGTH} characters"
                )));
            }
            user.bio = bio;
        }
        if let Some(avatar) = &patch.avatar {
            user.avatar = clean_optional(Some(avatar));
        }
        if let Some(website) = &patch.website {
            let website = clean_optional(Some(website));
            if website
                .as_ref()
                .is_some_and(|w| !(w.starts_with("https://") || w.starts_with("http://")))
            {
                return Err(SocialError::InvalidInput(
                    "website must be an http(s) URL".into(),
                ));
            }
            user.website = website;
        }

        user.updated_at = now();
        users.update_profile(&user)?;
        Ok(user)
    })
}

pub fn search_users(state: &AppState, query: &str, limit: Option<u32>) -> SocialResult<Vec<UserSummary>> {
    let query = query.trim().trim_start_matches('@');
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let limit = limit
        .unwrap_or(state.config.default_page_size)
        .clamp(1, state.config.max_page_size.max(1));
    state.db.read(|conn| {
        let users = UserRepository::new(conn).search(query, limit)?;
        Ok(users.iter().map(|u| user_summary(&state.media, u)).collect())
    })
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Username seed from the email local part, else the name, else `user`.
fn username_base(email: Option<&str>, name: Option<&str>) -> String {
    let source = email
        .and_then(|e| e.split('@').next())
        .or(name)
        .unwrap_or("user");
    let mut base: String = source
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(USERNAME_BASE_LENGTH)
        .collect();
    if base.is_empty() {
        base.push_str("user");
    }
    while base.len() < 3 {
        base.push('_');
    }
    base
}

fn unique_username(users: &UserRepository<'_>, base: &str) -> SocialResult<String> {
    if !users.username_taken(base, None)? {
        return Ok(base.to_string());
    }
    for suffix in 2..10_000 {
        let candidate = format!("{base}{suffix}");
        if !users.username_taken(&candidate, None)? {
            return Ok(candidate);
        }
    }
    let tail: String = new_id().chars().filter(|c| c.is_ascii_alphanumeric()).take(5).collect();
    Ok(format!("{base}_{tail}"))
}
