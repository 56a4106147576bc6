//! # Anduril
//!
//! A school portal built on polymorphic user and group profiles.
//!
//! Every user and group owns exactly one profile whose variant is picked by a
//! discriminator string (`student`, `teacher`, `club`, ...). Owners and
//! profiles are created together in one transaction, so an owner without a
//! profile is never observed.
//!
//! ## Crates
//!
//! - [`core`]: users, groups, profiles and the variant registries
//! - [`auth`]: password hashing, username generation, group-type authorization and OIDC claims
//! - [`db`]: SQLite persistence with lifecycle hooks
//! - [`conf`]: layered settings and the secret key (feature `conf`)
//! - [`commands`]: the `manage` command implementations (feature `commands`)
//!
//! ## Feature Flags
//!
//! - `standard` - Models, profiles, authentication and persistence
//! - `conf` - Settings and secret key management
//! - `commands` - Management commands
//! - `full` (default) - Everything
//!
//! ## Quick Example
//!
//! ```
//! use anduril::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() {
//! let db = Database::connect("sqlite::memory:").await.unwrap();
//! db.migrate().await.unwrap();
//! let users = UserManager::new(db);
//!
//! let mut fields = ProfileFields::new();
//! fields.insert("student_id".to_string(), json!("20230001"));
//! let user = users
//! 	.create_user(NewUser::new("nokim"), "student", &fields)
//! 	.await
//! 	.unwrap();
//!
//! assert_eq!(user.profile_kind(), Some(UserKind::Student));
//! assert_eq!(allowed_group_types(&user).len(), 1);
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example());
//! ```

pub use anduril_auth as auth;
pub use anduril_core as core;
pub use anduril_db as db;

#[cfg(feature = "conf")]
pub use anduril_conf as conf;

#[cfg(feature = "commands")]
pub use anduril_commands as commands;

/// Commonly used types
pub mod prelude {
	pub use anduril_auth::{
		Argon2Hasher, PasswordHasher, allowed_group_types, claims_for_scopes, generate_username,
		scope_profile,
	};
	pub use anduril_core::{
		Error, Group, GroupKind, NewGroup, NewUser, ProfileFields, User, UserKind, group_profiles,
		user_profiles,
	};
	pub use anduril_db::{
		CAN_LOGIN, Database, DbError, FriendshipManager, GroupManager, LifecycleHooks, UserManager,
	};

	#[cfg(feature = "conf")]
	pub use anduril_conf::{SecretKey, Settings};
}
