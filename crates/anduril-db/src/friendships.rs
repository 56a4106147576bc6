//! Friendship persistence

use anduril_core::{Error, Friendship, User};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::collections::BTreeSet;
use tracing::debug;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::users::fetch_users;

const FRIENDSHIP_COLUMNS: &str = "id, a_id, b_id, confirmed, creation_time, modification_time";

fn friendship_from_row(row: &SqliteRow) -> DbResult<Friendship> {
	Ok(Friendship {
		id: row.try_get("id")?,
		a: row.try_get("a_id")?,
		b: row.try_get("b_id")?,
		confirmed: row.try_get("confirmed")?,
		creation_time: row.try_get("creation_time")?,
		modification_time: row.try_get("modification_time")?,
	})
}

#[derive(Debug, Clone)]
pub struct FriendshipManager {
	db: Database,
}

impl FriendshipManager {
	pub fn new(db: Database) -> Self {
		Self { db }
	}

	/// Record an unconfirmed friendship from `a` to `b`.
	pub async fn request(&self, a: &User, b: &User) -> DbResult<Friendship> {
		if a.id == b.id {
			return Err(Error::Validation("users cannot befriend themselves".to_string()).into());
		}
		let now = Utc::now();
		let sql = format!(
			"INSERT INTO home_friendship (a_id, b_id, confirmed, creation_time, \
			 modification_time) VALUES (?, ?, 0, ?, ?) RETURNING {}",
			FRIENDSHIP_COLUMNS
		);
		let row = sqlx::query(&sql)
			.bind(a.id)
			.bind(b.id)
			.bind(now)
			.bind(now)
			.fetch_one(self.db.pool())
			.await?;
		debug!(from = %a, to = %b, "Requested friendship");
		friendship_from_row(&row)
	}

	pub async fn confirm(&self, friendship: &mut Friendship) -> DbResult<()> {
		let now = Utc::now();
		let result = sqlx::query(
			"UPDATE home_friendship SET confirmed = 1, modification_time = ? WHERE id = ?",
		)
		.bind(now)
		.bind(friendship.id)
		.execute(self.db.pool())
		.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("Friendship", friendship.id));
		}
		friendship.confirmed = true;
		friendship.modification_time = now;
		Ok(())
	}

	/// Confirmed friendship between `a` and `b` in either direction.
	pub async fn between(&self, a: &User, b: &User) -> DbResult<Option<Friendship>> {
		let sql = format!(
			"SELECT {} FROM home_friendship WHERE confirmed = 1 AND \
			 ((a_id = ? AND b_id = ?) OR (a_id = ? AND b_id = ?)) ORDER BY id LIMIT 1",
			FRIENDSHIP_COLUMNS
		);
		sqlx::query(&sql)
			.bind(a.id)
			.bind(b.id)
			.bind(b.id)
			.bind(a.id)
			.fetch_optional(self.db.pool())
			.await?
			.as_ref()
			.map(friendship_from_row)
			.transpose()
	}

	/// Users on the other side of `user`'s friendships with the given state.
	pub async fn friends(&self, user: &User, confirmed: bool) -> DbResult<Vec<User>> {
		let mut conn = self.db.pool().acquire().await?;
		let sql = format!(
			"SELECT {} FROM home_friendship WHERE confirmed = ? AND (a_id = ? OR b_id = ?)",
			FRIENDSHIP_COLUMNS
		);
		let rows = sqlx::query(&sql)
			.bind(confirmed)
			.bind(user.id)
			.bind(user.id)
			.fetch_all(&mut *conn)
			.await?;

		let mut ids = BTreeSet::new();
		for row in &rows {
			ids.extend(friendship_from_row(row)?.other(user.id));
		}
		let ids: Vec<i64> = ids.into_iter().collect();
		fetch_users(&mut *conn, &ids).await
	}
}
