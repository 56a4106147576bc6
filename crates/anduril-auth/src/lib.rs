//! # Anduril Auth
//!
//! Authentication helpers that sit on top of the core models:
//!
//! - **Password hashing**: [`PasswordHasher`] with the Argon2id [`Argon2Hasher`]
//! - **Usernames**: [`generate_username`] candidate sequences
//! - **Authorization**: [`allowed_group_types`], [`require_profile_kind`] and [`ProfileDispatch`]
//! - **OIDC**: [`scope_profile`], [`scope_email`] and [`claims_for_scopes`]

pub mod claims;
pub mod error;
pub mod hasher;
pub mod permissions;
pub mod username;

pub use claims::{
	EmailClaims, ProfileClaims, claims_for_scopes, scope_email, scope_profile,
};
pub use error::{AuthError, AuthResult};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use permissions::{ProfileDispatch, allowed_group_types, require_profile_kind};
pub use username::{UsernameGenerator, generate_username};
