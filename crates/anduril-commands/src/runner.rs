//! Command dispatch

use anduril_auth::Argon2Hasher;
use anduril_conf::{SecretKey, Settings};
use anduril_db::{Database, UserManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::hashpasswords::{self, PasswordColumn};
use crate::users::{self, CreateUserOptions, StudentOptions};

/// Log filter: `RUST_LOG` if set, else the verbosity flag, else the settings.
pub fn log_filter(settings: &Settings, verbosity: u8) -> EnvFilter {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return filter;
	}
	match verbosity {
		0 => EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
		1 => EnvFilter::new("debug"),
		_ => EnvFilter::new("trace"),
	}
}

pub fn init_logging(settings: &Settings, verbosity: u8) {
	tracing_subscriber::fmt()
		.with_env_filter(log_filter(settings, verbosity))
		.with_target(false)
		.init();
}

/// Apply command-line overrides to the loaded settings.
pub fn apply_overrides(cli: &Cli, mut settings: Settings) -> Settings {
	if let Some(url) = &cli.database {
		settings.database_url = url.clone();
	}
	settings
}

async fn connect(settings: &Settings) -> CommandResult<Database> {
	let db = Database::connect_with(&settings.database_url, settings.max_connections).await?;
	db.migrate().await?;
	Ok(db)
}

/// Run the parsed command against `settings`.
pub async fn run(command: Commands, settings: &Settings, ctx: &CommandContext) -> CommandResult<()> {
	match command {
		Commands::Migrate => {
			ctx.info(&format!("Migrating {}", settings.database_url));
			let db = connect(settings).await?;
			ctx.success("Database schema is up to date");
			db.close().await;
		}
		Commands::Createuser {
			kind,
			first_name,
			last_name,
			username,
			email,
			profile,
		} => {
			let db = connect(settings).await?;
			let options = CreateUserOptions {
				kind,
				first_name,
				last_name,
				username,
				email,
				profile,
			};
			users::create_user(ctx, &UserManager::new(db.clone()), options).await?;
			db.close().await;
		}
		Commands::Createstudent {
			username,
			first_name,
			last_name,
			student_id,
			password,
		} => {
			let password = match password {
				Some(password) => password,
				None => users::prompt_password()?,
			};
			let db = connect(settings).await?;
			let options = StudentOptions {
				username,
				first_name,
				last_name,
				student_id,
				password,
			};
			users::create_student(ctx, &UserManager::new(db.clone()), options).await?;
			db.close().await;
		}
		Commands::Addme => {
			let db = connect(settings).await?;
			users::create_student(ctx, &UserManager::new(db.clone()), StudentOptions::developer())
				.await?;
			db.close().await;
		}
		Commands::Hashpasswords {
			dump,
			index,
			header,
			name,
		} => {
			let column = PasswordColumn::select(index, header, name);
			ctx.verbose(&format!("Password column: {:?}", column));
			hashpasswords::run(ctx, &dump, &column, &Argon2Hasher::new())?;
		}
		Commands::Newsecret { path } => {
			let path = path.unwrap_or_else(|| settings.secret_key_path.clone());
			SecretKey::generate().write(&path)?;
			info!(path = %path.display(), "Wrote secret key");
			ctx.success(&format!("Wrote a new secret key to {}", path.display()));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;
	use rstest::rstest;

	#[rstest]
	fn test_database_override() {
		let cli = Cli::parse_from(["manage", "--database", "sqlite::memory:", "migrate"]);

		let settings = apply_overrides(&cli, Settings::default());

		assert_eq!(settings.database_url, "sqlite::memory:");
	}

	#[rstest]
	fn test_no_override_keeps_settings() {
		let cli = Cli::parse_from(["manage", "migrate"]);

		let settings = apply_overrides(&cli, Settings::default());

		assert_eq!(settings, Settings::default());
	}

	#[rstest]
	#[tokio::test]
	async fn test_newsecret_writes_key() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("secret.txt");
		let command = Commands::Newsecret {
			path: Some(path.clone()),
		};

		// Act
		run(command, &Settings::default(), &CommandContext::default())
			.await
			.unwrap();

		// Assert
		let key = SecretKey::load(&path).unwrap();
		assert_eq!(key.as_str().len(), anduril_conf::secret::SECRET_KEY_LENGTH);
	}
}
