//! Connection pool and schema

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::DbResult;

/// Default pool size for file-backed databases
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &[&str] = &[
	"CREATE TABLE IF NOT EXISTS core_user (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		username TEXT NOT NULL UNIQUE,
		email TEXT NOT NULL DEFAULT '',
		first_name TEXT NOT NULL DEFAULT '',
		last_name TEXT NOT NULL DEFAULT '',
		password_hash TEXT,
		is_active INTEGER NOT NULL DEFAULT 1,
		is_staff INTEGER NOT NULL DEFAULT 0,
		is_superuser INTEGER NOT NULL DEFAULT 0,
		date_joined TEXT NOT NULL
	)",
	"CREATE TABLE IF NOT EXISTS core_userprofile (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		user_id INTEGER NOT NULL UNIQUE REFERENCES core_user(id) ON DELETE CASCADE,
		kind TEXT NOT NULL,
		middle_name TEXT,
		display_first_name TEXT,
		display_last_name TEXT,
		student_id TEXT UNIQUE,
		graduation_year INTEGER,
		counselor_id INTEGER REFERENCES core_user(id) ON DELETE SET NULL,
		title TEXT,
		creation_time TEXT NOT NULL,
		modification_time TEXT NOT NULL
	)",
	"CREATE TABLE IF NOT EXISTS core_userstatistics (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		user_id INTEGER NOT NULL UNIQUE REFERENCES core_user(id) ON DELETE CASCADE,
		first_login TEXT,
		login_count INTEGER NOT NULL DEFAULT 0
	)",
	"CREATE TABLE IF NOT EXISTS core_userpermission (
		user_id INTEGER NOT NULL REFERENCES core_user(id) ON DELETE CASCADE,
		codename TEXT NOT NULL,
		PRIMARY KEY (user_id, codename)
	)",
	"CREATE TABLE IF NOT EXISTS groups_group (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL UNIQUE,
		title TEXT NOT NULL DEFAULT '',
		description TEXT NOT NULL DEFAULT '',
		hidden INTEGER NOT NULL DEFAULT 0,
		creation_time TEXT NOT NULL,
		modification_time TEXT NOT NULL
	)",
	"CREATE TABLE IF NOT EXISTS groups_groupprofile (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		group_id INTEGER NOT NULL UNIQUE REFERENCES groups_group(id) ON DELETE CASCADE,
		kind TEXT NOT NULL,
		display_title TEXT,
		creation_time TEXT NOT NULL,
		modification_time TEXT NOT NULL
	)",
	"CREATE TABLE IF NOT EXISTS groups_clubsponsor (
		profile_id INTEGER NOT NULL REFERENCES groups_groupprofile(id) ON DELETE CASCADE,
		user_id INTEGER NOT NULL REFERENCES core_user(id) ON DELETE CASCADE,
		PRIMARY KEY (profile_id, user_id)
	)",
	"CREATE TABLE IF NOT EXISTS groups_membership (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		user_id INTEGER NOT NULL REFERENCES core_user(id) ON DELETE CASCADE,
		group_id INTEGER NOT NULL REFERENCES groups_group(id) ON DELETE CASCADE,
		roles TEXT NOT NULL DEFAULT '',
		creation_time TEXT NOT NULL,
		modification_time TEXT NOT NULL,
		UNIQUE (user_id, group_id)
	)",
	"CREATE TABLE IF NOT EXISTS home_friendship (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		a_id INTEGER NOT NULL REFERENCES core_user(id) ON DELETE CASCADE,
		b_id INTEGER NOT NULL REFERENCES core_user(id) ON DELETE CASCADE,
		confirmed INTEGER NOT NULL DEFAULT 0,
		creation_time TEXT NOT NULL,
		modification_time TEXT NOT NULL
	)",
	"CREATE TABLE IF NOT EXISTS mail_domain (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL,
		main INTEGER NOT NULL DEFAULT 0
	)",
	"CREATE TABLE IF NOT EXISTS mail_account (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		domain_id INTEGER NOT NULL REFERENCES mail_domain(id) ON DELETE CASCADE,
		address TEXT NOT NULL UNIQUE,
		forward TEXT NOT NULL DEFAULT ''
	)",
];

/// Shared handle to the SQLite pool
///
/// Cloning is cheap; every clone uses the same pool.
#[derive(Debug, Clone)]
pub struct Database {
	pool: SqlitePool,
}

impl Database {
	/// Connect with the default pool size.
	///
	/// # Examples
	///
	/// ```
	/// use anduril_db::Database;
	///
	/// # async fn example() {
	/// let db = Database::connect("sqlite::memory:").await.unwrap();
	/// db.migrate().await.unwrap();
	/// # }
	/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
	/// ```
	pub async fn connect(url: &str) -> DbResult<Self> {
		Self::connect_with(url, DEFAULT_MAX_CONNECTIONS).await
	}

	/// Connect to `url`, creating the database file if needed.
	///
	/// In-memory databases get exactly one connection that is never recycled,
	/// since every new connection would open a fresh, empty database.
	pub async fn connect_with(url: &str, max_connections: u32) -> DbResult<Self> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);

		let pool = if is_memory_url(url) {
			SqlitePoolOptions::new()
				.min_connections(1)
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.connect_with(options)
				.await?
		} else {
			SqlitePoolOptions::new()
				.max_connections(max_connections.max(1))
				.connect_with(options)
				.await?
		};

		debug!(url, "Connected to database");
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Create every table that does not exist yet.
	pub async fn migrate(&self) -> DbResult<()> {
		let mut tx = self.pool.begin().await?;
		for statement in SCHEMA {
			sqlx::query(statement).execute(&mut *tx).await?;
		}
		tx.commit().await?;
		info!(tables = SCHEMA.len(), "Schema is up to date");
		Ok(())
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}
}

fn is_memory_url(url: &str) -> bool {
	url.contains(":memory:") || url.contains("mode=memory")
}
