//! Users and their statistics side-record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::profile::{UserKind, UserProfile, override_or};

/// Maximum username length
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Owner fields for a user that has not been persisted yet
///
/// # Examples
///
/// ```
/// use anduril_core::NewUser;
///
/// let user = NewUser::new("segabare")
///     .with_name("Sean", "Gabaree")
///     .with_email("sean@example.com")
///     .staff();
///
/// assert_eq!(user.first_name, "Sean");
/// assert!(user.is_staff);
/// assert!(!user.is_superuser);
/// assert!(user.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub password: Option<String>,
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
}

impl Default for NewUser {
	fn default() -> Self {
		Self {
			username: String::new(),
			email: String::new(),
			first_name: String::new(),
			last_name: String::new(),
			password: None,
			is_active: true,
			is_staff: false,
			is_superuser: false,
		}
	}
}

impl NewUser {
	pub fn new(username: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			..Default::default()
		}
	}

	pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
		self.first_name = first_name.into();
		self.last_name = last_name.into();
		self
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = email.into();
		self
	}

	pub fn with_password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	pub fn staff(mut self) -> Self {
		self.is_staff = true;
		self
	}

	/// Staff and superuser
	pub fn superuser(mut self) -> Self {
		self.is_staff = true;
		self.is_superuser = true;
		self
	}

	/// Check the username against the handle rules.
	pub fn validate(&self) -> Result<()> {
		validate_username(&self.username)
	}
}

/// Usernames are 1 to 150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<()> {
	if username.is_empty() {
		return Err(Error::Validation("username must not be empty".to_string()));
	}
	if username.chars().count() > USERNAME_MAX_LENGTH {
		return Err(Error::Validation(format!(
			"username must be at most {} characters",
			USERNAME_MAX_LENGTH
		)));
	}
	if let Some(c) = username
		.chars()
		.find(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
	{
		return Err(Error::Validation(format!(
			"username contains invalid character {:?}",
			c
		)));
	}
	Ok(())
}

/// Login statistics kept 1:1 with a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatistics {
	pub id: i64,
	pub user_id: i64,
	pub first_login: Option<DateTime<Utc>>,
	pub login_count: i64,
}

impl UserStatistics {
	/// Count a successful login. The first one also stamps `first_login`.
	///
	/// ```
	/// use anduril_core::UserStatistics;
	/// use chrono::Utc;
	///
	/// let mut stats = UserStatistics { id: 1, user_id: 1, first_login: None, login_count: 0 };
	/// let first = Utc::now();
	/// stats.record_login(first);
	/// stats.record_login(Utc::now());
	///
	/// assert_eq!(stats.first_login, Some(first));
	/// assert_eq!(stats.login_count, 2);
	/// ```
	pub fn record_login(&mut self, now: DateTime<Utc>) {
		if self.login_count == 0 {
			self.first_login = Some(now);
		}
		self.login_count += 1;
	}
}

/// A persisted user
///
/// `profile` is only `None` for rows written without going through atomic
/// creation. Readers treat that as "no profile" rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub password_hash: Option<String>,
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
	pub date_joined: DateTime<Utc>,
	pub profile: Option<UserProfile>,
	pub statistics: Option<UserStatistics>,
}

impl User {
	pub fn profile(&self) -> Option<&UserProfile> {
		self.profile.as_ref()
	}

	pub fn profile_kind(&self) -> Option<UserKind> {
		self.profile.as_ref().map(UserProfile::kind)
	}

	/// Profile for call sites that cannot do without one
	pub fn require_profile(&self) -> Result<&UserProfile> {
		self.profile
			.as_ref()
			.ok_or_else(|| Error::MissingProfile(format!("user {}", self.username)))
	}

	/// Display first name if set, otherwise the stored first name
	pub fn effective_first_name(&self) -> &str {
		override_or(
			self.profile
				.as_ref()
				.and_then(|p| p.display_first_name.as_deref()),
			&self.first_name,
		)
	}

	/// Display last name if set, otherwise the stored last name
	pub fn effective_last_name(&self) -> &str {
		override_or(
			self.profile
				.as_ref()
				.and_then(|p| p.display_last_name.as_deref()),
			&self.last_name,
		)
	}

	/// Effective first and last name separated by a space
	pub fn full_name(&self) -> String {
		format!("{} {}", self.effective_first_name(), self.effective_last_name())
	}

	/// URL slug of the user
	pub fn slug(&self) -> String {
		format!("/users/{}", self.id)
	}
}

impl fmt::Display for User {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.profile_kind() {
			Some(kind) => write!(f, "<{} {}>", kind.label(), self.username),
			None => write!(f, "<User {}>", self.username),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::UserProfileDetails;
	use rstest::{fixture, rstest};

	#[fixture]
	fn user() -> User {
		User {
			id: 3,
			username: "segabare".to_string(),
			email: "sean@example.com".to_string(),
			first_name: "Sean".to_string(),
			last_name: "Gabaree".to_string(),
			password_hash: None,
			is_active: true,
			is_staff: false,
			is_superuser: false,
			date_joined: Utc::now(),
			profile: None,
			statistics: None,
		}
	}

	fn with_profile(mut user: User, first: Option<&str>, last: Option<&str>) -> User {
		let now = Utc::now();
		user.profile = Some(UserProfile {
			id: 1,
			user_id: user.id,
			middle_name: None,
			display_first_name: first.map(str::to_string),
			display_last_name: last.map(str::to_string),
			details: UserProfileDetails::Teacher,
			creation_time: now,
			modification_time: now,
		});
		user
	}

	#[rstest]
	fn test_missing_profile_degrades(user: User) {
		assert!(user.profile().is_none());
		assert_eq!(user.full_name(), "Sean Gabaree");
		assert_eq!(user.to_string(), "<User segabare>");
		assert!(matches!(user.require_profile(), Err(Error::MissingProfile(_))));
	}

	#[rstest]
	fn test_display_name_overrides(user: User) {
		let user = with_profile(user, Some("Shawn"), Some(""));
		assert_eq!(user.effective_first_name(), "Shawn");
		assert_eq!(user.effective_last_name(), "Gabaree");
		assert_eq!(user.full_name(), "Shawn Gabaree");
		assert_eq!(user.to_string(), "<Teacher segabare>");
	}

	#[rstest]
	fn test_slug(user: User) {
		assert_eq!(user.slug(), "/users/3");
	}

	#[rstest]
	#[case("nokim", true)]
	#[case("first.last+tag@school", true)]
	#[case("", false)]
	#[case("has space", false)]
	#[case("semi;colon", false)]
	fn test_validate_username(#[case] username: &str, #[case] valid: bool) {
		assert_eq!(validate_username(username).is_ok(), valid);
	}

	#[rstest]
	fn test_validate_username_length() {
		assert!(validate_username(&"a".repeat(150)).is_ok());
		assert!(validate_username(&"a".repeat(151)).is_err());
	}
}
