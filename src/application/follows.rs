use super::interaction::{self, FanOut, InteractionEvent};
use super::require_user;
use super::views::user_summary;
use crate::domain::{Page, PageRequest, SocialError, SocialResult, UserSummary};
use crate::infra::db::repository::{FollowRepository, UserRepository, now};
use crate::state::AppState;

/// Follow `target_id`. Following someone twice changes nothing.
pub fn follow(state: &AppState, actor_id: &str, target_id: &str) -> SocialResult<FanOut> {
    if actor_id == target_id {
        return Err(SocialError::InvalidInput("cannot follow yourself".into()));
    }
    state.db.with_transaction(|tx| {
        require_user(tx, actor_id)?;
        require_user(tx, target_id)?;

        if !FollowRepository::new(tx).insert(actor_id, target_id, &now())? {
            log::debug!("{} already follows {}", actor_id, target_id);
            return Ok(FanOut::default());
        }
        let fan_out = interaction::record(tx, &InteractionEvent::follow(actor_id, target_id), &[])?;
        Ok(fan_out)
    })
}

/// Returns whether an edge was removed.
pub fn unfollow(state: &AppState, actor_id: &str, target_id: &str) -> SocialResult<bool> {
    state.db.with_transaction(|tx| {
        if !FollowRepository::new(tx).delete(actor_id, target_id)? {
            return Ok(false);
        }
        interaction::revoke(tx, &InteractionEvent::follow(actor_id, target_id))?;
        Ok(true)
    })
}

pub fn is_following(state: &AppState, actor_id: &str, target_id: &str) -> SocialResult<bool> {
    state
        .db
        .read(|conn| Ok(FollowRepository::new(conn).exists(actor_id, target_id)?))
}

pub fn followers(
    state: &AppState,
    user_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<UserSummary>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_user(conn, user_id)?;
        let rows = UserRepository::new(conn).page_followers(user_id, bounds)?;
        Page::from_rows(rows, bounds.limit).try_map(|u| Ok(user_summary(&state.media, &u)))
    })
}

pub fn following(
    state: &AppState,
    user_id: &str,
    request: &PageRequest,
) -> SocialResult<Page<UserSummary>> {
    let bounds = state.page_bounds(request)?;
    state.db.read(|conn| {
        require_user(conn, user_id)?;
        let rows = UserRepository::new(conn).page_following(user_id, bounds)?;
        Page::from_rows(rows, bounds.limit).try_map(|u| Ok(user_summary(&state.media, &u)))
    })
}
