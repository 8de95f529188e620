use serde::{Deserialize, Serialize};

/// Unique identifier for a user
pub type UserId = String;

/// Reference to an uploaded file in external storage
pub type StorageRef = String;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Subject id issued by the authentication provider
    pub external_id: String,
    /// Lower-case handle, unique across users
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<StorageRef>,
    pub website: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    /// Creation timestamp in RFC3339 format.
    pub created_at: String,
    /// Update timestamp in RFC3339 format.
    pub updated_at: String,
}

/// What the authentication provider tells us about a signed-in person.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    pub external_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<StorageRef>,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<StorageRef>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Compact author card embedded in other views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A user as seen by a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    pub avatar_url: Option<String>,
    pub followed_by_viewer: bool,
    pub is_self: bool,
}
