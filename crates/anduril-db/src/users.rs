//! User persistence
//!
//! [`UserManager`] is the only way users and their profiles are written.
//! Creation inserts the user row, runs the created hook and inserts the
//! profile inside one transaction, so a user is never visible without its
//! profile.

use anduril_auth::{Argon2Hasher, PasswordHasher, generate_username};
use anduril_core::{
	Error, NewUser, NewUserProfile, ProfileFields, User, UserStatistics, user::validate_username,
};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::lifecycle::{self, run_post_save, run_pre_delete};
use crate::profiles;

/// Permission that lets a user sign in to the portal
pub const CAN_LOGIN: &str = "can_login";

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
	is_active, is_staff, is_superuser, date_joined";

fn user_from_row(row: &SqliteRow) -> DbResult<User> {
	Ok(User {
		id: row.try_get("id")?,
		username: row.try_get("username")?,
		email: row.try_get("email")?,
		first_name: row.try_get("first_name")?,
		last_name: row.try_get("last_name")?,
		password_hash: row.try_get("password_hash")?,
		is_active: row.try_get("is_active")?,
		is_staff: row.try_get("is_staff")?,
		is_superuser: row.try_get("is_superuser")?,
		date_joined: row.try_get("date_joined")?,
		profile: None,
		statistics: None,
	})
}

/// Attach profile and statistics to a bare user row.
async fn load_related(conn: &mut SqliteConnection, mut user: User) -> DbResult<User> {
	user.profile = profiles::fetch_user_profile(conn, user.id).await?;
	user.statistics = lifecycle::fetch_statistics(conn, user.id).await?;
	Ok(user)
}

pub(crate) async fn fetch_user(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<User>> {
	let sql = format!("SELECT {} FROM core_user WHERE id = ?", USER_COLUMNS);
	let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await? else {
		return Ok(None);
	};
	let user = user_from_row(&row)?;
	load_related(conn, user).await.map(Some)
}

pub(crate) async fn fetch_users(conn: &mut SqliteConnection, ids: &[i64]) -> DbResult<Vec<User>> {
	let mut users = Vec::with_capacity(ids.len());
	for id in ids {
		if let Some(user) = fetch_user(conn, *id).await? {
			users.push(user);
		}
	}
	Ok(users)
}

/// Creates, loads, saves and deletes users together with their profiles.
///
/// # Examples
///
/// ```
/// use anduril_core::{NewUser, ProfileFields, UserKind};
/// use anduril_db::{Database, UserManager};
/// use serde_json::json;
///
/// # async fn example() {
/// let db = Database::connect("sqlite::memory:").await.unwrap();
/// db.migrate().await.unwrap();
/// let users = UserManager::new(db);
///
/// let mut fields = ProfileFields::new();
/// fields.insert("student_id".to_string(), json!("20230001"));
///
/// let user = users
///     .create_user(NewUser::new("segabare").with_name("Sean", "Gabaree"), "student", &fields)
///     .await
///     .unwrap();
/// assert_eq!(user.profile_kind(), Some(UserKind::Student));
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
/// ```
#[derive(Clone)]
pub struct UserManager {
	db: Database,
	hasher: Arc<dyn PasswordHasher>,
}

impl UserManager {
	pub fn new(db: Database) -> Self {
		Self::with_hasher(db, Arc::new(Argon2Hasher::new()))
	}

	pub fn with_hasher(db: Database, hasher: Arc<dyn PasswordHasher>) -> Self {
		Self { db, hasher }
	}

	pub fn database(&self) -> &Database {
		&self.db
	}

	/// Create a user with a profile built from untyped fields.
	///
	/// `discriminator` and `profile_fields` are validated before anything is
	/// written. Fails with `UnknownVariant` or `InvalidProfileField` in that
	/// case, and with a database error if either insert is rejected; no user
	/// row survives a failure.
	pub async fn create_user(
		&self,
		new_user: NewUser,
		discriminator: &str,
		profile_fields: &ProfileFields,
	) -> DbResult<User> {
		let profile = NewUserProfile::from_fields(discriminator, profile_fields)?;
		self.create_user_with_profile(new_user, profile).await
	}

	/// Create a user with an already validated profile.
	pub async fn create_user_with_profile(
		&self,
		new_user: NewUser,
		profile: NewUserProfile,
	) -> DbResult<User> {
		new_user.validate()?;
		let password_hash = new_user
			.password
			.as_deref()
			.map(|password| self.hasher.hash(password))
			.transpose()?;
		let now = Utc::now();

		let mut tx = self.db.pool().begin().await?;

		let id = sqlx::query(
			"INSERT INTO core_user (username, email, first_name, last_name, password_hash, \
			 is_active, is_staff, is_superuser, date_joined) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(&new_user.username)
		.bind(&new_user.email)
		.bind(&new_user.first_name)
		.bind(&new_user.last_name)
		.bind(&password_hash)
		.bind(new_user.is_active)
		.bind(new_user.is_staff)
		.bind(new_user.is_superuser)
		.bind(now)
		.execute(&mut *tx)
		.await?
		.last_insert_rowid();

		let mut user = User {
			id,
			username: new_user.username,
			email: new_user.email,
			first_name: new_user.first_name,
			last_name: new_user.last_name,
			password_hash,
			is_active: new_user.is_active,
			is_staff: new_user.is_staff,
			is_superuser: new_user.is_superuser,
			date_joined: now,
			profile: None,
			statistics: None,
		};

		run_post_save(&user, &mut *tx, true).await;
		user.profile = Some(profiles::insert_user_profile(&mut *tx, id, profile, now).await?);
		user.statistics = lifecycle::fetch_statistics(&mut *tx, id).await?;

		tx.commit().await?;
		info!(user = %user, id, "Created user");
		Ok(user)
	}

	/// Create a user whose username is the first free generated candidate.
	///
	/// Requires both a first and a last name. Any username already set on
	/// `new_user` is replaced.
	pub async fn create_user_with_generated_username(
		&self,
		mut new_user: NewUser,
		discriminator: &str,
		profile_fields: &ProfileFields,
	) -> DbResult<User> {
		if new_user.first_name.trim().is_empty() || new_user.last_name.trim().is_empty() {
			return Err(Error::Validation(
				"a first and last name are required to generate a username".to_string(),
			)
			.into());
		}
		let profile = NewUserProfile::from_fields(discriminator, profile_fields)?;
		new_user.username = self
			.available_username(&new_user.first_name, &new_user.last_name)
			.await?;
		self.create_user_with_profile(new_user, profile).await
	}

	/// First generated username for the name that is not taken yet.
	pub async fn available_username(&self, first_name: &str, last_name: &str) -> DbResult<String> {
		for candidate in generate_username(first_name, last_name) {
			if validate_username(&candidate).is_err() {
				continue;
			}
			if !self.exists(&candidate).await? {
				debug!(candidate = %candidate, "Picked generated username");
				return Ok(candidate);
			}
		}
		Err(Error::Validation(format!(
			"no username available for {} {}",
			first_name, last_name
		))
		.into())
	}

	pub async fn find(&self, id: i64) -> DbResult<Option<User>> {
		let mut conn = self.db.pool().acquire().await?;
		fetch_user(&mut *conn, id).await
	}

	pub async fn get(&self, id: i64) -> DbResult<User> {
		self.find(id)
			.await?
			.ok_or_else(|| DbError::not_found("User", id))
	}

	pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
		let mut conn = self.db.pool().acquire().await?;
		let sql = format!("SELECT {} FROM core_user WHERE username = ?", USER_COLUMNS);
		let Some(row) = sqlx::query(&sql)
			.bind(username)
			.fetch_optional(&mut *conn)
			.await?
		else {
			return Ok(None);
		};
		let user = user_from_row(&row)?;
		load_related(&mut *conn, user).await.map(Some)
	}

	pub async fn get_by_username(&self, username: &str) -> DbResult<User> {
		self.find_by_username(username)
			.await?
			.ok_or_else(|| DbError::not_found("User", username))
	}

	pub async fn exists(&self, username: &str) -> DbResult<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM core_user WHERE username = ?")
			.bind(username)
			.fetch_one(self.db.pool())
			.await?;
		Ok(count > 0)
	}

	/// Every user ordered by username
	pub async fn list(&self) -> DbResult<Vec<User>> {
		let mut conn = self.db.pool().acquire().await?;
		let sql = format!("SELECT {} FROM core_user ORDER BY username", USER_COLUMNS);
		let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
		let mut users = Vec::with_capacity(rows.len());
		for row in &rows {
			let user = user_from_row(row)?;
			users.push(load_related(&mut *conn, user).await?);
		}
		Ok(users)
	}

	/// Write the user row, then cascade to the profile and statistics.
	pub async fn save(&self, user: &User) -> DbResult<()> {
		validate_username(&user.username)?;
		let mut tx = self.db.pool().begin().await?;
		let result = sqlx::query(
			"UPDATE core_user SET username = ?, email = ?, first_name = ?, last_name = ?, \
			 password_hash = ?, is_active = ?, is_staff = ?, is_superuser = ? WHERE id = ?",
		)
		.bind(&user.username)
		.bind(&user.email)
		.bind(&user.first_name)
		.bind(&user.last_name)
		.bind(&user.password_hash)
		.bind(user.is_active)
		.bind(user.is_staff)
		.bind(user.is_superuser)
		.bind(user.id)
		.execute(&mut *tx)
		.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("User", user.id));
		}

		run_post_save(user, &mut *tx, false).await;
		tx.commit().await?;
		debug!(user = %user, "Saved user");
		Ok(())
	}

	/// Delete the user after its profile and statistics.
	pub async fn delete(&self, user: &User) -> DbResult<()> {
		let mut tx = self.db.pool().begin().await?;
		run_pre_delete(user, &mut *tx).await;
		let result = sqlx::query("DELETE FROM core_user WHERE id = ?")
			.bind(user.id)
			.execute(&mut *tx)
			.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("User", user.id));
		}
		tx.commit().await?;
		info!(user = %user, "Deleted user");
		Ok(())
	}

	/// Delete the user with `username` if there is one.
	pub async fn delete_by_username(&self, username: &str) -> DbResult<bool> {
		match self.find_by_username(username).await? {
			Some(user) => {
				self.delete(&user).await?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Hash and store a new password.
	pub async fn set_password(&self, user: &mut User, password: &str) -> DbResult<()> {
		let hash = self.hasher.hash(password)?;
		sqlx::query("UPDATE core_user SET password_hash = ? WHERE id = ?")
			.bind(&hash)
			.bind(user.id)
			.execute(self.db.pool())
			.await?;
		user.password_hash = Some(hash);
		Ok(())
	}

	/// `false` for users without a usable password.
	pub fn check_password(&self, user: &User, password: &str) -> DbResult<bool> {
		match &user.password_hash {
			Some(hash) => Ok(self.hasher.verify(password, hash)?),
			None => Ok(false),
		}
	}

	/// Verify credentials of an active user and count the login.
	pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
		let Some(mut user) = self.find_by_username(username).await? else {
			debug!(username, "Unknown username");
			return Ok(None);
		};
		if !user.is_active || !self.check_password(&user, password)? {
			debug!(user = %user, "Rejected credentials");
			return Ok(None);
		}
		self.record_login(&mut user).await?;
		Ok(Some(user))
	}

	/// Bump the login counter, creating the statistics row if it went missing.
	pub async fn record_login(&self, user: &mut User) -> DbResult<()> {
		let mut tx = self.db.pool().begin().await?;
		lifecycle::ensure_statistics(&mut *tx, user.id).await?;
		let mut statistics = lifecycle::fetch_statistics(&mut *tx, user.id)
			.await?
			.unwrap_or(UserStatistics {
				id: 0,
				user_id: user.id,
				first_login: None,
				login_count: 0,
			});
		statistics.record_login(Utc::now());
		lifecycle::update_statistics(&mut *tx, user.id, &statistics).await?;
		tx.commit().await?;

		debug!(user = %user, count = statistics.login_count, "Recorded login");
		user.statistics = Some(statistics);
		Ok(())
	}

	pub async fn grant_permission(&self, user: &User, codename: &str) -> DbResult<()> {
		sqlx::query("INSERT OR IGNORE INTO core_userpermission (user_id, codename) VALUES (?, ?)")
			.bind(user.id)
			.bind(codename)
			.execute(self.db.pool())
			.await?;
		Ok(())
	}

	pub async fn revoke_permission(&self, user: &User, codename: &str) -> DbResult<()> {
		sqlx::query("DELETE FROM core_userpermission WHERE user_id = ? AND codename = ?")
			.bind(user.id)
			.bind(codename)
			.execute(self.db.pool())
			.await?;
		Ok(())
	}

	pub async fn permissions(&self, user: &User) -> DbResult<Vec<String>> {
		Ok(sqlx::query_scalar(
			"SELECT codename FROM core_userpermission WHERE user_id = ? ORDER BY codename",
		)
		.bind(user.id)
		.fetch_all(self.db.pool())
		.await?)
	}

	/// Active superusers hold every permission.
	pub async fn has_permission(&self, user: &User, codename: &str) -> DbResult<bool> {
		if !user.is_active {
			return Ok(false);
		}
		if user.is_superuser {
			return Ok(true);
		}
		let count: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM core_userpermission WHERE user_id = ? AND codename = ?",
		)
		.bind(user.id)
		.bind(codename)
		.fetch_one(self.db.pool())
		.await?;
		Ok(count > 0)
	}
}
