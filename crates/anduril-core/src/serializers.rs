//! Serializable views of owners for API responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::group::{Group, GroupProfile};
use crate::profile::UserProfile;
use crate::user::User;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub full_name: String,
	pub is_staff: bool,
	pub date_joined: DateTime<Utc>,
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile: Option<UserProfile>,
}

impl From<&User> for UserRecord {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
			email: user.email.clone(),
			first_name: user.effective_first_name().to_string(),
			last_name: user.effective_last_name().to_string(),
			full_name: user.full_name(),
			is_staff: user.is_staff,
			date_joined: user.date_joined,
			url: user.slug(),
			profile: user.profile.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
	pub id: i64,
	pub name: String,
	pub title: String,
	pub description: String,
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile: Option<GroupProfile>,
}

impl From<&Group> for GroupRecord {
	fn from(group: &Group) -> Self {
		Self {
			id: group.id,
			name: group.name.clone(),
			title: group.effective_title().to_string(),
			description: group.description.clone(),
			url: group.slug(),
			profile: group.profile.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::group::GroupProfileDetails;
	use crate::profile::UserProfileDetails;
	use rstest::rstest;

	fn student() -> User {
		let now = Utc::now();
		User {
			id: 7,
			username: "nokim".to_string(),
			email: "nokim@example.com".to_string(),
			first_name: "Noah".to_string(),
			last_name: "Kim".to_string(),
			password_hash: Some("$argon2id$secret".to_string()),
			is_active: true,
			is_staff: false,
			is_superuser: false,
			date_joined: now,
			profile: Some(UserProfile {
				id: 1,
				user_id: 7,
				middle_name: None,
				display_first_name: None,
				display_last_name: None,
				details: UserProfileDetails::Student {
					student_id: "12345678".to_string(),
					graduation_year: Some(2018),
					counselor_id: None,
				},
				creation_time: now,
				modification_time: now,
			}),
			statistics: None,
		}
	}

	#[rstest]
	fn test_user_record_tags_profile() {
		let value = serde_json::to_value(UserRecord::from(&student())).unwrap();
		assert_eq!(value["profile"]["type"], "student");
		assert_eq!(value["profile"]["student_id"], "12345678");
		assert_eq!(value["full_name"], "Noah Kim");
		assert_eq!(value["url"], "/users/7");
		assert!(value.get("password_hash").is_none());
	}

	#[rstest]
	fn test_user_record_without_profile() {
		let mut user = student();
		user.profile = None;
		let value = serde_json::to_value(UserRecord::from(&user)).unwrap();
		assert!(value.get("profile").is_none());
	}

	#[rstest]
	fn test_group_record_round_trip() {
		let now = Utc::now();
		let group = Group {
			id: 2,
			name: "chess".to_string(),
			title: "Chess Club".to_string(),
			description: "Weekly games".to_string(),
			hidden: false,
			creation_time: now,
			modification_time: now,
			profile: Some(GroupProfile {
				id: 3,
				group_id: 2,
				display_title: None,
				details: GroupProfileDetails::Club { sponsors: vec![1, 4] },
				creation_time: now,
				modification_time: now,
			}),
		};
		let record = GroupRecord::from(&group);
		let json = serde_json::to_string(&record).unwrap();
		assert!(json.contains(r#""type":"club""#));
		let parsed: GroupRecord = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed, record);
	}
}
