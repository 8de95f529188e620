//! Plaza CLI entry point.
//!
//! Drives the social handlers against the configured database and prints
//! JSON, so a local database can be seeded and inspected from a terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use plaza::application::{comments, follows, notifications, posts, replies, users};
use plaza::domain::{Identity, NewPost, PageRequest, User};
use plaza::infra::app_config::{config_path, load_config, save_config};
use plaza::infra::db::Database;
use plaza::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "plaza")]
#[command(version)]
#[command(about = "Posts, follows and notifications over a local SQLite database", long_about = None)]
struct Args {
    /// Database file (defaults to $PLAZA_DB_PATH or the data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Username to act as
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database and write a default config file if none exists
    Init,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Publish a post
    Post {
        content: String,
        /// Storage reference of an attachment (repeatable)
        #[arg(long)]
        media: Vec<String>,
    },

    /// Like a post
    Like { post_id: String },

    /// Remove a like
    Unlike { post_id: String },

    /// Comment on a post
    Comment { post_id: String, content: String },

    /// Reply to a comment
    Reply { comment_id: String, content: String },

    /// Follow a user
    Follow { username: String },

    /// Stop following a user
    Unfollow { username: String },

    /// Show the global feed, or only followed users with --following
    Feed {
        #[arg(long)]
        following: bool,
        #[command(flatten)]
        page: PageArgs,
    },

    /// List notifications of the acting user
    Notifications {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Mark every notification of the acting user as read
    ReadAll,

    /// Recompute denormalized counters and repair drift
    Reconcile,
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// Register an identity (or refresh an existing one)
    Create {
        external_id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a profile
    Show { username: String },

    /// Search users by username or display name
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    /// Cursor returned by the previous page
    #[arg(long)]
    cursor: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest {
            cursor: self.cursor.clone(),
            limit: self.limit,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db = match &args.db {
        Some(path) => Database::open_at(path.clone()),
        None => Database::open(),
    }
    .context("Failed to open database")?;
    let state = AppState::new(db, load_config());

    match args.command {
        Commands::Init => {
            let path = config_path();
            if !path.exists() {
                save_config(&state.config)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Wrote default config to {}", path.display());
            }
            print_json(&state.config)?;
        }
        Commands::User { command } => match command {
            UserCommands::Create {
                external_id,
                email,
                name,
            } => {
                let identity = Identity {
                    external_id,
                    email,
                    name,
                    avatar: None,
                };
                print_json(&users::upsert_from_identity(&state, &identity)?)?;
            }
            UserCommands::Show { username } => {
                let viewer = actor_or_anonymous(&state, args.actor.as_deref())?;
                print_json(&users::profile(&state, &viewer, &username)?)?;
            }
            UserCommands::Search { query, limit } => {
                print_json(&users::search_users(&state, &query, limit)?)?;
            }
        },
        Commands::Post { content, media } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let input = NewPost { content, media };
            print_json(&posts::create_post(&state, &actor.id, &input)?)?;
        }
        Commands::Like { post_id } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let likes = posts::like_post(&state, &actor.id, &post_id)?;
            print_json(&serde_json::json!({ "post_id": post_id, "like_count": likes }))?;
        }
        Commands::Unlike { post_id } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let likes = posts::unlike_post(&state, &actor.id, &post_id)?;
            print_json(&serde_json::json!({ "post_id": post_id, "like_count": likes }))?;
        }
        Commands::Comment { post_id, content } => {
            let actor = actor(&state, args.actor.as_deref())?;
            print_json(&comments::add_comment(&state, &actor.id, &post_id, &content)?)?;
        }
        Commands::Reply {
            comment_id,
            content,
        } => {
            let actor = actor(&state, args.actor.as_deref())?;
            print_json(&replies::add_reply(&state, &actor.id, &comment_id, &content)?)?;
        }
        Commands::Follow { username } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let target = users::get_by_username(&state, &username)?;
            print_json(&follows::follow(&state, &actor.id, &target.id)?)?;
        }
        Commands::Unfollow { username } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let target = users::get_by_username(&state, &username)?;
            let removed = follows::unfollow(&state, &actor.id, &target.id)?;
            print_json(&serde_json::json!({ "unfollowed": removed }))?;
        }
        Commands::Feed { following, page } => {
            let actor = actor(&state, args.actor.as_deref())?;
            let page = if following {
                posts::following_feed(&state, &actor.id, &page.request())?
            } else {
                posts::feed(&state, &actor.id, &page.request())?
            };
            print_json(&page)?;
        }
        Commands::Notifications { page } => {
            let actor = actor(&state, args.actor.as_deref())?;
            print_json(&notifications::list_notifications(
                &state,
                &actor.id,
                &page.request(),
            )?)?;
        }
        Commands::ReadAll => {
            let actor = actor(&state, args.actor.as_deref())?;
            let marked = notifications::mark_all_read(&state, &actor.id)?;
            print_json(&serde_json::json!({ "marked_read": marked }))?;
        }
        Commands::Reconcile => {
            print_json(&posts::reconcile_counters(&state)?)?;
        }
    }

    Ok(())
}

fn actor(state: &AppState, username: Option<&str>) -> Result<User> {
    let username = username.context("This command needs --as <username>")?;
    Ok(users::get_by_username(state, username)?)
}

fn actor_or_anonymous(state: &AppState, username: Option<&str>) -> Result<String> {
    match username {
        Some(_) => Ok(actor(state, username)?.id),
        None => Ok(String::new()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
