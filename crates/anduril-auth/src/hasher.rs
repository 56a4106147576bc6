//! Password hashing

use argon2::{
	Argon2,
	password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use rand::RngCore;

use crate::error::{AuthError, AuthResult};

/// Password hasher trait
///
/// # Examples
///
/// ```
/// use anduril_auth::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new();
/// let hash = hasher.hash("asdf").unwrap();
///
/// assert!(hasher.verify("asdf", &hash).unwrap());
/// assert!(!hasher.verify("qwer", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
	/// Hash a plaintext password into a PHC string.
	fn hash(&self, password: &str) -> AuthResult<String>;

	/// `Ok(false)` on mismatch, `Err` only when `hash` cannot be parsed.
	fn verify(&self, password: &str, hash: &str) -> AuthResult<bool>;
}

/// Argon2id password hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> AuthResult<String> {
		let mut salt_bytes = [0u8; 16];
		rand::thread_rng().fill_bytes(&mut salt_bytes);

		let salt =
			SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| AuthError::Hashing(e.to_string()))
	}

	fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
		let parsed_hash =
			PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

		Ok(Argon2::default()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}
