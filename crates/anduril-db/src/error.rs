//! Persistence errors

use anduril_auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
	/// Model validation or lookup failed before or while touching the store.
	#[error(transparent)]
	Model(#[from] anduril_core::Error),

	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	/// No row matched the lookup.
	#[error("{model} not found: {lookup}")]
	NotFound {
		model: &'static str,
		lookup: String,
	},

	#[error(transparent)]
	Auth(#[from] AuthError),
}

impl DbError {
	pub(crate) fn not_found(model: &'static str, lookup: impl ToString) -> Self {
		DbError::NotFound {
			model,
			lookup: lookup.to_string(),
		}
	}

	/// Whether the store rejected the write because of a `UNIQUE` constraint.
	pub fn is_unique_violation(&self) -> bool {
		matches!(self, DbError::Sqlx(sqlx::Error::Database(e)) if e.is_unique_violation())
	}
}

pub type DbResult<T> = Result<T, DbError>;
