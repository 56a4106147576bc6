//! Group persistence

use anduril_auth::allowed_group_types;
use anduril_core::group::validate_roles;
use anduril_core::{
	Error, Group, GroupKind, GroupMembership, NewGroup, NewGroupProfile, ProfileFields, User,
};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::lifecycle::{run_post_save, run_pre_delete};
use crate::profiles;
use crate::users::fetch_users;

const GROUP_COLUMNS: &str = "id, name, title, description, hidden, creation_time, modification_time";

fn group_from_row(row: &SqliteRow) -> DbResult<Group> {
	Ok(Group {
		id: row.try_get("id")?,
		name: row.try_get("name")?,
		title: row.try_get("title")?,
		description: row.try_get("description")?,
		hidden: row.try_get("hidden")?,
		creation_time: row.try_get("creation_time")?,
		modification_time: row.try_get("modification_time")?,
		profile: None,
	})
}

fn membership_from_row(row: &SqliteRow) -> DbResult<GroupMembership> {
	Ok(GroupMembership {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		group_id: row.try_get("group_id")?,
		roles: row.try_get("roles")?,
		creation_time: row.try_get("creation_time")?,
		modification_time: row.try_get("modification_time")?,
	})
}

async fn fetch_groups(conn: &mut SqliteConnection, sql: &str, bind: Option<i64>) -> DbResult<Vec<Group>> {
	let mut query = sqlx::query(sql);
	if let Some(value) = bind {
		query = query.bind(value);
	}
	let rows = query.fetch_all(&mut *conn).await?;
	let mut groups = Vec::with_capacity(rows.len());
	for row in &rows {
		let mut group = group_from_row(row)?;
		group.profile = profiles::fetch_group_profile(conn, group.id).await?;
		groups.push(group);
	}
	Ok(groups)
}

/// Creates, loads, saves and deletes groups together with their profiles,
/// and manages memberships.
#[derive(Debug, Clone)]
pub struct GroupManager {
	db: Database,
}

impl GroupManager {
	pub fn new(db: Database) -> Self {
		Self { db }
	}

	/// Create a group with a profile built from untyped fields.
	pub async fn create_group(
		&self,
		new_group: NewGroup,
		discriminator: &str,
		profile_fields: &ProfileFields,
	) -> DbResult<Group> {
		let profile = NewGroupProfile::from_fields(discriminator, profile_fields)?;
		self.create_group_with_profile(new_group, profile).await
	}

	/// Create a group on behalf of `requester`.
	///
	/// Fails with `PermissionDenied` unless the requested type is one of
	/// [`allowed_group_types`] for the requester.
	pub async fn request_group(
		&self,
		requester: &User,
		new_group: NewGroup,
		discriminator: &str,
		profile_fields: &ProfileFields,
	) -> DbResult<Group> {
		let kind: GroupKind = discriminator.parse()?;
		if !allowed_group_types(requester).contains(&kind) {
			return Err(Error::PermissionDenied(format!(
				"{} may not create {} groups",
				requester, kind
			))
			.into());
		}
		let group = self.create_group(new_group, discriminator, profile_fields).await?;
		info!(requester = %requester, group = %group, "Granted group request");
		Ok(group)
	}

	pub async fn create_group_with_profile(
		&self,
		new_group: NewGroup,
		profile: NewGroupProfile,
	) -> DbResult<Group> {
		new_group.validate()?;
		let now = Utc::now();
		let name = new_group.name.trim().to_string();

		let mut tx = self.db.pool().begin().await?;

		let id = sqlx::query(
			"INSERT INTO groups_group (name, title, description, hidden, creation_time, \
			 modification_time) VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(&name)
		.bind(&new_group.title)
		.bind(&new_group.description)
		.bind(new_group.hidden)
		.bind(now)
		.bind(now)
		.execute(&mut *tx)
		.await?
		.last_insert_rowid();

		let mut group = Group {
			id,
			name,
			title: new_group.title,
			description: new_group.description,
			hidden: new_group.hidden,
			creation_time: now,
			modification_time: now,
			profile: None,
		};

		run_post_save(&group, &mut *tx, true).await;
		group.profile = Some(profiles::insert_group_profile(&mut *tx, id, profile, now).await?);

		tx.commit().await?;
		info!(group = %group, id, "Created group");
		Ok(group)
	}

	pub async fn find(&self, id: i64) -> DbResult<Option<Group>> {
		let mut conn = self.db.pool().acquire().await?;
		let sql = format!("SELECT {} FROM groups_group WHERE id = ?", GROUP_COLUMNS);
		Ok(fetch_groups(&mut *conn, &sql, Some(id)).await?.pop())
	}

	pub async fn get(&self, id: i64) -> DbResult<Group> {
		self.find(id)
			.await?
			.ok_or_else(|| DbError::not_found("Group", id))
	}

	pub async fn get_by_name(&self, name: &str) -> DbResult<Group> {
		let id: Option<i64> = sqlx::query_scalar("SELECT id FROM groups_group WHERE name = ?")
			.bind(name)
			.fetch_optional(self.db.pool())
			.await?;
		match id {
			Some(id) => self.get(id).await,
			None => Err(DbError::not_found("Group", name)),
		}
	}

	/// Groups ordered by name; hidden groups only when asked for.
	pub async fn list(&self, include_hidden: bool) -> DbResult<Vec<Group>> {
		let mut conn = self.db.pool().acquire().await?;
		let filter = if include_hidden { "" } else { "WHERE hidden = 0 " };
		let sql = format!(
			"SELECT {} FROM groups_group {}ORDER BY name",
			GROUP_COLUMNS, filter
		);
		fetch_groups(&mut *conn, &sql, None).await
	}

	/// Write the group row, then cascade to the profile.
	pub async fn save(&self, group: &Group) -> DbResult<()> {
		let name = group.name.trim();
		NewGroup::new(name)
			.with_title(group.title.clone())
			.validate()?;
		let mut tx = self.db.pool().begin().await?;
		let result = sqlx::query(
			"UPDATE groups_group SET name = ?, title = ?, description = ?, hidden = ?, \
			 modification_time = ? WHERE id = ?",
		)
		.bind(name)
		.bind(&group.title)
		.bind(&group.description)
		.bind(group.hidden)
		.bind(Utc::now())
		.bind(group.id)
		.execute(&mut *tx)
		.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("Group", group.id));
		}

		run_post_save(group, &mut *tx, false).await;
		tx.commit().await?;
		debug!(group = %group, "Saved group");
		Ok(())
	}

	/// Delete the group after its profile. Memberships go with it.
	pub async fn delete(&self, group: &Group) -> DbResult<()> {
		let mut tx = self.db.pool().begin().await?;
		run_pre_delete(group, &mut *tx).await;
		let result = sqlx::query("DELETE FROM groups_group WHERE id = ?")
			.bind(group.id)
			.execute(&mut *tx)
			.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("Group", group.id));
		}
		tx.commit().await?;
		info!(group = %group, "Deleted group");
		Ok(())
	}

	/// Add `user` to `group`, or update the roles of an existing membership.
	pub async fn add_member(&self, group: &Group, user: &User, roles: &str) -> DbResult<GroupMembership> {
		validate_roles(roles)?;
		let now = Utc::now();
		let row = sqlx::query(
			"INSERT INTO groups_membership (user_id, group_id, roles, creation_time, \
			 modification_time) VALUES (?, ?, ?, ?, ?) \
			 ON CONFLICT (user_id, group_id) DO UPDATE SET roles = excluded.roles, \
			 modification_time = excluded.modification_time \
			 RETURNING id, user_id, group_id, roles, creation_time, modification_time",
		)
		.bind(user.id)
		.bind(group.id)
		.bind(roles)
		.bind(now)
		.bind(now)
		.fetch_one(self.db.pool())
		.await?;
		debug!(group = %group, user = %user, roles, "Saved membership");
		membership_from_row(&row)
	}

	/// Returns whether a membership was removed.
	pub async fn remove_member(&self, group: &Group, user: &User) -> DbResult<bool> {
		let result = sqlx::query("DELETE FROM groups_membership WHERE group_id = ? AND user_id = ?")
			.bind(group.id)
			.bind(user.id)
			.execute(self.db.pool())
			.await?;
		Ok(result.rows_affected() > 0)
	}

	pub async fn memberships(&self, group: &Group) -> DbResult<Vec<GroupMembership>> {
		let rows = sqlx::query(
			"SELECT id, user_id, group_id, roles, creation_time, modification_time \
			 FROM groups_membership WHERE group_id = ? ORDER BY id",
		)
		.bind(group.id)
		.fetch_all(self.db.pool())
		.await?;
		rows.iter().map(membership_from_row).collect()
	}

	/// Users that belong to `group`
	pub async fn members(&self, group: &Group) -> DbResult<Vec<User>> {
		let mut conn = self.db.pool().acquire().await?;
		let ids: Vec<i64> = sqlx::query_scalar(
			"SELECT user_id FROM groups_membership WHERE group_id = ? ORDER BY id",
		)
		.bind(group.id)
		.fetch_all(&mut *conn)
		.await?;
		fetch_users(&mut *conn, &ids).await
	}

	/// Users sponsoring a club; empty for other group types.
	pub async fn sponsors(&self, group: &Group) -> DbResult<Vec<User>> {
		let ids = group
			.profile()
			.map(|profile| profile.sponsors().to_vec())
			.unwrap_or_default();
		let mut conn = self.db.pool().acquire().await?;
		fetch_users(&mut *conn, &ids).await
	}

	/// Groups `user` belongs to, ordered by name
	pub async fn groups_for_user(&self, user: &User) -> DbResult<Vec<Group>> {
		let mut conn = self.db.pool().acquire().await?;
		let sql = format!(
			"SELECT {} FROM groups_group WHERE id IN \
			 (SELECT group_id FROM groups_membership WHERE user_id = ?) ORDER BY name",
			GROUP_COLUMNS
		);
		fetch_groups(&mut *conn, &sql, Some(user.id)).await
	}
}
