//! # Anduril DB
//!
//! SQLite persistence for users, groups and their profiles.
//!
//! Every write goes through a manager:
//!
//! - [`UserManager`]: users, profiles, statistics, passwords and permissions
//! - [`GroupManager`]: groups, profiles and memberships
//! - [`FriendshipManager`]: friendships between users
//! - [`DomainManager`] and [`AccountManager`]: mail domains and accounts
//!
//! Owners and profiles are created in one transaction and the managers call
//! the [`LifecycleHooks`] at each persistence point.

pub mod database;
pub mod error;
pub mod friendships;
pub mod groups;
pub mod lifecycle;
pub mod mail;
mod profiles;
pub mod users;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use friendships::FriendshipManager;
pub use groups::GroupManager;
pub use lifecycle::{LifecycleHooks, run_post_save, run_pre_delete};
pub use mail::{AccountManager, DomainManager};
pub use users::{CAN_LOGIN, UserManager};
