//! Owner lifecycle hooks
//!
//! Managers call these hooks at their persistence points: `post_save` after
//! the owner row is written (with `created` set on the first write) and
//! `pre_delete` before the owner row is removed. Hooks keep the profile and
//! the statistics side-record in step with their owner.
//!
//! Hook failures never fail the surrounding operation. They are wrapped in
//! [`Error::LifecycleSync`], logged and dropped.

use anduril_core::{Error, Group, User, UserStatistics};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection};
use std::fmt::Display;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::profiles;

#[async_trait]
pub trait LifecycleHooks: Display + Send + Sync {
	/// Runs after the owner row has been written.
	async fn post_save(&self, conn: &mut SqliteConnection, created: bool) -> anduril_core::Result<()>;

	/// Runs before the owner row is deleted.
	async fn pre_delete(&self, conn: &mut SqliteConnection) -> anduril_core::Result<()>;
}

fn sync_error(error: DbError) -> Error {
	Error::LifecycleSync(error.to_string())
}

/// Run `post_save`, logging instead of propagating a failure.
pub async fn run_post_save<H: LifecycleHooks + ?Sized>(
	owner: &H,
	conn: &mut SqliteConnection,
	created: bool,
) {
	if let Err(error) = owner.post_save(conn, created).await {
		warn!(owner = %owner, created, %error, "post_save hook failed");
	}
}

/// Run `pre_delete`, logging instead of propagating a failure.
pub async fn run_pre_delete<H: LifecycleHooks + ?Sized>(owner: &H, conn: &mut SqliteConnection) {
	if let Err(error) = owner.pre_delete(conn).await {
		warn!(owner = %owner, %error, "pre_delete hook failed");
	}
}

/// Create the zeroed statistics row unless one exists.
pub(crate) async fn ensure_statistics(conn: &mut SqliteConnection, user_id: i64) -> DbResult<()> {
	sqlx::query(
		"INSERT OR IGNORE INTO core_userstatistics (user_id, first_login, login_count) \
		 VALUES (?, NULL, 0)",
	)
	.bind(user_id)
	.execute(&mut *conn)
	.await?;
	Ok(())
}

pub(crate) async fn fetch_statistics(
	conn: &mut SqliteConnection,
	user_id: i64,
) -> DbResult<Option<UserStatistics>> {
	let row = sqlx::query(
		"SELECT id, user_id, first_login, login_count FROM core_userstatistics WHERE user_id = ?",
	)
	.bind(user_id)
	.fetch_optional(&mut *conn)
	.await?;

	row.map(|row| -> DbResult<UserStatistics> {
		Ok(UserStatistics {
			id: row.try_get("id")?,
			user_id: row.try_get("user_id")?,
			first_login: row.try_get("first_login")?,
			login_count: row.try_get("login_count")?,
		})
	})
	.transpose()
}

pub(crate) async fn update_statistics(
	conn: &mut SqliteConnection,
	user_id: i64,
	statistics: &UserStatistics,
) -> DbResult<bool> {
	let result = sqlx::query(
		"UPDATE core_userstatistics SET first_login = ?, login_count = ? WHERE user_id = ?",
	)
	.bind(statistics.first_login)
	.bind(statistics.login_count)
	.bind(user_id)
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() > 0)
}

async fn delete_statistics(conn: &mut SqliteConnection, user_id: i64) -> DbResult<u64> {
	let result = sqlx::query("DELETE FROM core_userstatistics WHERE user_id = ?")
		.bind(user_id)
		.execute(&mut *conn)
		.await?;
	Ok(result.rows_affected())
}

#[async_trait]
impl LifecycleHooks for User {
	async fn post_save(&self, conn: &mut SqliteConnection, created: bool) -> anduril_core::Result<()> {
		if created {
			ensure_statistics(conn, self.id).await.map_err(sync_error)?;
		}

		match &self.profile {
			Some(profile) => {
				if !profiles::update_user_profile(conn, self.id, profile)
					.await
					.map_err(sync_error)?
				{
					debug!(user = %self.username, "Profile row missing while saving");
				}
			}
			None => debug!(user = %self.username, "No profile attached"),
		}

		if let Some(statistics) = &self.statistics {
			if !update_statistics(conn, self.id, statistics).await.map_err(sync_error)? {
				debug!(user = %self.username, "Statistics row missing while saving");
			}
		}
		Ok(())
	}

	async fn pre_delete(&self, conn: &mut SqliteConnection) -> anduril_core::Result<()> {
		let profile_rows = profiles::delete_user_profile(conn, self.id)
			.await
			.map_err(sync_error)?;
		let statistics_rows = delete_statistics(conn, self.id).await.map_err(sync_error)?;
		debug!(user = %self.username, profile_rows, statistics_rows, "Removed user side-records");
		Ok(())
	}
}

#[async_trait]
impl LifecycleHooks for Group {
	async fn post_save(&self, conn: &mut SqliteConnection, _created: bool) -> anduril_core::Result<()> {
		match &self.profile {
			Some(profile) => {
				if !profiles::update_group_profile(conn, self.id, profile)
					.await
					.map_err(sync_error)?
				{
					debug!(group = %self.name, "Profile row missing while saving");
				}
			}
			None => debug!(group = %self.name, "No profile attached"),
		}
		Ok(())
	}

	async fn pre_delete(&self, conn: &mut SqliteConnection) -> anduril_core::Result<()> {
		let profile_rows = profiles::delete_group_profile(conn, self.id)
			.await
			.map_err(sync_error)?;
		debug!(group = %self.name, profile_rows, "Removed group side-records");
		Ok(())
	}
}
