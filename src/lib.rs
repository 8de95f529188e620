//! Plaza: posts, comments, follows and notification fan-out over SQLite.

pub mod application;
pub mod domain;
pub mod infra;
pub mod state;
pub mod utils;

pub use state::AppState;
