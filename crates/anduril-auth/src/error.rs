//! Authentication errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
	/// Hashing a password failed.
	#[error("Password hashing failed: {0}")]
	Hashing(String),

	/// A stored hash could not be parsed.
	#[error("Malformed password hash: {0}")]
	MalformedHash(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
