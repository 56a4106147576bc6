//! Command errors

use anduril_auth::AuthError;
use anduril_conf::ConfError;
use anduril_db::DbError;
use std::path::PathBuf;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Configuration error: {0}")]
	Conf(#[from] ConfError),

	#[error("Password hashing failed: {0}")]
	Auth(#[from] AuthError),

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	#[error("IO error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Prompt failed: {0}")]
	Prompt(#[from] dialoguer::Error),

	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	#[error("Cannot find column '{0}' in CSV file")]
	ColumnNotFound(String),
}

impl CommandError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;
