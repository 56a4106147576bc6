//! Profile rows
//!
//! One table per owner type. The `kind` column holds the discriminator and the
//! variant columns are nullable; club sponsors live in a join table.

use anduril_core::{
	Discriminator, GroupKind, GroupProfile, GroupProfileDetails, NewGroupProfile, NewUserProfile,
	UserKind, UserProfile, UserProfileDetails,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::DbResult;

const USER_PROFILE_COLUMNS: &str = "id, user_id, kind, middle_name, display_first_name, \
	display_last_name, student_id, graduation_year, counselor_id, title, creation_time, \
	modification_time";

/// Variant columns of a user profile row, in schema order
struct UserProfileColumns<'a> {
	student_id: Option<&'a str>,
	graduation_year: Option<i32>,
	counselor_id: Option<i64>,
	title: Option<&'a str>,
}

impl<'a> From<&'a UserProfileDetails> for UserProfileColumns<'a> {
	fn from(details: &'a UserProfileDetails) -> Self {
		let mut columns = Self {
			student_id: None,
			graduation_year: None,
			counselor_id: None,
			title: None,
		};
		match details {
			UserProfileDetails::Student {
				student_id,
				graduation_year,
				counselor_id,
			} => {
				columns.student_id = Some(student_id);
				columns.graduation_year = *graduation_year;
				columns.counselor_id = *counselor_id;
			}
			UserProfileDetails::Staff { title } => columns.title = Some(title),
			UserProfileDetails::Alumnus { graduation_year } => {
				columns.graduation_year = *graduation_year;
			}
			UserProfileDetails::Teacher | UserProfileDetails::Counselor => {}
		}
		columns
	}
}

fn user_profile_from_row(row: &SqliteRow) -> DbResult<UserProfile> {
	let kind: UserKind = row.try_get::<String, _>("kind")?.parse()?;
	let details = match kind {
		UserKind::Student => UserProfileDetails::Student {
			student_id: row
				.try_get::<Option<String>, _>("student_id")?
				.unwrap_or_default(),
			graduation_year: row.try_get("graduation_year")?,
			counselor_id: row.try_get("counselor_id")?,
		},
		UserKind::Teacher => UserProfileDetails::Teacher,
		UserKind::Counselor => UserProfileDetails::Counselor,
		UserKind::Staff => UserProfileDetails::Staff {
			title: row
				.try_get::<Option<String>, _>("title")?
				.unwrap_or_default(),
		},
		UserKind::Alumnus => UserProfileDetails::Alumnus {
			graduation_year: row.try_get("graduation_year")?,
		},
	};

	Ok(UserProfile {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		middle_name: row.try_get("middle_name")?,
		display_first_name: row.try_get("display_first_name")?,
		display_last_name: row.try_get("display_last_name")?,
		details,
		creation_time: row.try_get("creation_time")?,
		modification_time: row.try_get("modification_time")?,
	})
}

pub(crate) async fn insert_user_profile(
	conn: &mut SqliteConnection,
	user_id: i64,
	profile: NewUserProfile,
	now: DateTime<Utc>,
) -> DbResult<UserProfile> {
	let columns = UserProfileColumns::from(&profile.details);
	let id = sqlx::query(
		"INSERT INTO core_userprofile (user_id, kind, middle_name, display_first_name, \
		 display_last_name, student_id, graduation_year, counselor_id, title, creation_time, \
		 modification_time) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(user_id)
	.bind(profile.details.kind().as_str())
	.bind(&profile.middle_name)
	.bind(&profile.display_first_name)
	.bind(&profile.display_last_name)
	.bind(columns.student_id)
	.bind(columns.graduation_year)
	.bind(columns.counselor_id)
	.bind(columns.title)
	.bind(now)
	.bind(now)
	.execute(&mut *conn)
	.await?
	.last_insert_rowid();

	Ok(UserProfile {
		id,
		user_id,
		middle_name: profile.middle_name,
		display_first_name: profile.display_first_name,
		display_last_name: profile.display_last_name,
		details: profile.details,
		creation_time: now,
		modification_time: now,
	})
}

/// Write every column of `profile` to the row owned by `user_id`. The ids
/// carried by `profile` are ignored. Returns whether a row was updated.
pub(crate) async fn update_user_profile(
	conn: &mut SqliteConnection,
	user_id: i64,
	profile: &UserProfile,
) -> DbResult<bool> {
	let columns = UserProfileColumns::from(&profile.details);
	let result = sqlx::query(
		"UPDATE core_userprofile SET kind = ?, middle_name = ?, display_first_name = ?, \
		 display_last_name = ?, student_id = ?, graduation_year = ?, counselor_id = ?, \
		 title = ?, modification_time = ? WHERE user_id = ?",
	)
	.bind(profile.kind().as_str())
	.bind(&profile.middle_name)
	.bind(&profile.display_first_name)
	.bind(&profile.display_last_name)
	.bind(columns.student_id)
	.bind(columns.graduation_year)
	.bind(columns.counselor_id)
	.bind(columns.title)
	.bind(Utc::now())
	.bind(user_id)
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() > 0)
}

pub(crate) async fn fetch_user_profile(
	conn: &mut SqliteConnection,
	user_id: i64,
) -> DbResult<Option<UserProfile>> {
	let sql = format!(
		"SELECT {} FROM core_userprofile WHERE user_id = ?",
		USER_PROFILE_COLUMNS
	);
	sqlx::query(&sql)
		.bind(user_id)
		.fetch_optional(&mut *conn)
		.await?
		.as_ref()
		.map(user_profile_from_row)
		.transpose()
}

pub(crate) async fn delete_user_profile(conn: &mut SqliteConnection, user_id: i64) -> DbResult<u64> {
	let result = sqlx::query("DELETE FROM core_userprofile WHERE user_id = ?")
		.bind(user_id)
		.execute(&mut *conn)
		.await?;
	Ok(result.rows_affected())
}

fn group_profile_from_row(row: &SqliteRow, sponsors: Vec<i64>) -> DbResult<GroupProfile> {
	let kind: GroupKind = row.try_get::<String, _>("kind")?.parse()?;
	let details = match kind {
		GroupKind::Club => GroupProfileDetails::Club { sponsors },
		GroupKind::Academic => GroupProfileDetails::Academic,
		GroupKind::Administrative => GroupProfileDetails::Administrative,
		GroupKind::External => GroupProfileDetails::External,
	};

	Ok(GroupProfile {
		id: row.try_get("id")?,
		group_id: row.try_get("group_id")?,
		display_title: row.try_get("display_title")?,
		details,
		creation_time: row.try_get("creation_time")?,
		modification_time: row.try_get("modification_time")?,
	})
}

async fn replace_sponsors(
	conn: &mut SqliteConnection,
	profile_id: i64,
	sponsors: &[i64],
) -> DbResult<()> {
	sqlx::query("DELETE FROM groups_clubsponsor WHERE profile_id = ?")
		.bind(profile_id)
		.execute(&mut *conn)
		.await?;
	for user_id in sponsors {
		sqlx::query("INSERT INTO groups_clubsponsor (profile_id, user_id) VALUES (?, ?)")
			.bind(profile_id)
			.bind(user_id)
			.execute(&mut *conn)
			.await?;
	}
	Ok(())
}

async fn fetch_sponsors(conn: &mut SqliteConnection, profile_id: i64) -> DbResult<Vec<i64>> {
	Ok(sqlx::query_scalar(
		"SELECT user_id FROM groups_clubsponsor WHERE profile_id = ? ORDER BY user_id",
	)
	.bind(profile_id)
	.fetch_all(&mut *conn)
	.await?)
}

fn sponsors_of(details: &GroupProfileDetails) -> &[i64] {
	match details {
		GroupProfileDetails::Club { sponsors } => sponsors,
		_ => &[],
	}
}

pub(crate) async fn insert_group_profile(
	conn: &mut SqliteConnection,
	group_id: i64,
	profile: NewGroupProfile,
	now: DateTime<Utc>,
) -> DbResult<GroupProfile> {
	let id = sqlx::query(
		"INSERT INTO groups_groupprofile (group_id, kind, display_title, creation_time, \
		 modification_time) VALUES (?, ?, ?, ?, ?)",
	)
	.bind(group_id)
	.bind(profile.details.kind().as_str())
	.bind(&profile.display_title)
	.bind(now)
	.bind(now)
	.execute(&mut *conn)
	.await?
	.last_insert_rowid();

	replace_sponsors(conn, id, sponsors_of(&profile.details)).await?;

	Ok(GroupProfile {
		id,
		group_id,
		display_title: profile.display_title,
		details: profile.details,
		creation_time: now,
		modification_time: now,
	})
}

/// Write `profile` to the row owned by `group_id`; sponsors follow the stored
/// row, not the id carried by `profile`.
pub(crate) async fn update_group_profile(
	conn: &mut SqliteConnection,
	group_id: i64,
	profile: &GroupProfile,
) -> DbResult<bool> {
	let Some(profile_id) = sqlx::query_scalar::<_, i64>(
		"SELECT id FROM groups_groupprofile WHERE group_id = ?",
	)
	.bind(group_id)
	.fetch_optional(&mut *conn)
	.await?
	else {
		return Ok(false);
	};

	sqlx::query(
		"UPDATE groups_groupprofile SET kind = ?, display_title = ?, modification_time = ? \
		 WHERE id = ?",
	)
	.bind(profile.kind().as_str())
	.bind(&profile.display_title)
	.bind(Utc::now())
	.bind(profile_id)
	.execute(&mut *conn)
	.await?;
	replace_sponsors(conn, profile_id, sponsors_of(&profile.details)).await?;
	Ok(true)
}

pub(crate) async fn fetch_group_profile(
	conn: &mut SqliteConnection,
	group_id: i64,
) -> DbResult<Option<GroupProfile>> {
	let Some(row) = sqlx::query(
		"SELECT id, group_id, kind, display_title, creation_time, modification_time \
		 FROM groups_groupprofile WHERE group_id = ?",
	)
	.bind(group_id)
	.fetch_optional(&mut *conn)
	.await?
	else {
		return Ok(None);
	};

	let profile_id: i64 = row.try_get("id")?;
	let sponsors = fetch_sponsors(conn, profile_id).await?;
	group_profile_from_row(&row, sponsors).map(Some)
}

pub(crate) async fn delete_group_profile(
	conn: &mut SqliteConnection,
	group_id: i64,
) -> DbResult<u64> {
	let result = sqlx::query("DELETE FROM groups_groupprofile WHERE group_id = ?")
		.bind(group_id)
		.execute(&mut *conn)
		.await?;
	Ok(result.rows_affected())
}
