//! OIDC scope claims

use anduril_core::{Discriminator, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Claims released for the `profile` scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileClaims {
	pub id: i64,
	pub username: String,
	pub first_name: String,
	pub last_name: String,

	/// Profile discriminator
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,

	/// Only present for students
	#[serde(skip_serializing_if = "Option::is_none")]
	pub student_id: Option<String>,
}

impl From<&User> for ProfileClaims {
	fn from(user: &User) -> Self {
		let profile = user.profile();
		Self {
			id: user.id,
			username: user.username.clone(),
			first_name: user.first_name.clone(),
			last_name: user.last_name.clone(),
			kind: profile.map(|p| p.kind().as_str().to_string()),
			student_id: profile.and_then(|p| p.student_id()).map(str::to_string),
		}
	}
}

/// Claims released for the `email` scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailClaims {
	pub email: String,
}

fn into_map<T: Serialize>(claims: T) -> Map<String, Value> {
	match serde_json::to_value(claims) {
		Ok(Value::Object(map)) => map,
		_ => Map::new(),
	}
}

/// Flat claim map for the `profile` scope.
///
/// ```
/// use anduril_auth::scope_profile;
/// # use anduril_core::User;
/// # use chrono::Utc;
/// # let user = User {
/// #     id: 4, username: "nokim".into(), email: String::new(),
/// #     first_name: "Noah".into(), last_name: "Kim".into(), password_hash: None,
/// #     is_active: true, is_staff: false, is_superuser: false,
/// #     date_joined: Utc::now(), profile: None, statistics: None,
/// # };
/// let claims = scope_profile(&user);
/// assert_eq!(claims["username"], "nokim");
/// assert!(!claims.contains_key("type"));
/// assert!(!claims.contains_key("student_id"));
/// ```
pub fn scope_profile(user: &User) -> Map<String, Value> {
	into_map(ProfileClaims::from(user))
}

/// Flat claim map for the `email` scope
pub fn scope_email(user: &User) -> Map<String, Value> {
	into_map(EmailClaims {
		email: user.email.clone(),
	})
}

/// Merged claims for every known scope in `scopes`.
pub fn claims_for_scopes<'a>(
	user: &User,
	scopes: impl IntoIterator<Item = &'a str>,
) -> Map<String, Value> {
	let mut claims = Map::new();
	for scope in scopes {
		match scope {
			"profile" => claims.extend(scope_profile(user)),
			"email" => claims.extend(scope_email(user)),
			other => debug!(scope = other, "Ignoring unknown claim scope"),
		}
	}
	claims
}
