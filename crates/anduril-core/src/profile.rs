//! User profiles
//!
//! Every user owns exactly one profile. The profile is a tagged union: common
//! display-name overrides plus a [`UserProfileDetails`] payload that carries
//! the fields specific to the variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::fields::{FieldReader, ProfileFields};
use crate::registry::{Discriminator, user_profiles};

/// Maximum length of `student_id`
pub const STUDENT_ID_MAX_LENGTH: usize = 8;
/// Maximum length of the staff `title`
pub const STAFF_TITLE_MAX_LENGTH: usize = 30;
/// Maximum length of middle and display names
pub const NAME_MAX_LENGTH: usize = 60;

/// User profile discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
	Student,
	Teacher,
	Counselor,
	Staff,
	Alumnus,
}

impl Discriminator for UserKind {
	fn as_str(&self) -> &'static str {
		match self {
			UserKind::Student => "student",
			UserKind::Teacher => "teacher",
			UserKind::Counselor => "counselor",
			UserKind::Staff => "staff",
			UserKind::Alumnus => "alumnus",
		}
	}
}

impl UserKind {
	/// Display label from the registry
	pub fn label(&self) -> &'static str {
		user_profiles().get(*self).label()
	}
}

impl fmt::Display for UserKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for UserKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		user_profiles().resolve(s).map(|spec| spec.kind())
	}
}

/// Variant-specific profile fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserProfileDetails {
	Student {
		student_id: String,
		graduation_year: Option<i32>,
		counselor_id: Option<i64>,
	},
	Teacher,
	Counselor,
	Staff {
		title: String,
	},
	Alumnus {
		graduation_year: Option<i32>,
	},
}

impl UserProfileDetails {
	pub fn kind(&self) -> UserKind {
		match self {
			UserProfileDetails::Student { .. } => UserKind::Student,
			UserProfileDetails::Teacher => UserKind::Teacher,
			UserProfileDetails::Counselor => UserKind::Counselor,
			UserProfileDetails::Staff { .. } => UserKind::Staff,
			UserProfileDetails::Alumnus { .. } => UserKind::Alumnus,
		}
	}
}

/// Profile data validated for a variant but not yet attached to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserProfile {
	pub middle_name: Option<String>,
	pub display_first_name: Option<String>,
	pub display_last_name: Option<String>,
	pub details: UserProfileDetails,
}

impl NewUserProfile {
	/// Resolve `discriminator` and validate `fields` against the variant.
	///
	/// # Examples
	///
	/// ```
	/// use anduril_core::{NewUserProfile, ProfileFields, UserKind};
	/// use serde_json::json;
	///
	/// let mut fields = ProfileFields::new();
	/// fields.insert("student_id".to_string(), json!("20190042"));
	/// fields.insert("graduation_year".to_string(), json!(2023));
	///
	/// let profile = NewUserProfile::from_fields("student", &fields).unwrap();
	/// assert_eq!(profile.details.kind(), UserKind::Student);
	///
	/// assert!(NewUserProfile::from_fields("teacher", &fields).is_err());
	/// assert!(NewUserProfile::from_fields("wizard", &ProfileFields::new()).is_err());
	/// ```
	pub fn from_fields(discriminator: &str, fields: &ProfileFields) -> Result<Self> {
		let spec = user_profiles().resolve(discriminator)?;
		let reader = FieldReader::new(spec, fields)?;

		let details = match spec.kind() {
			UserKind::Student => UserProfileDetails::Student {
				student_id: reader.required_string("student_id", STUDENT_ID_MAX_LENGTH)?,
				graduation_year: reader.year("graduation_year")?,
				counselor_id: reader.id("counselor")?,
			},
			UserKind::Teacher => UserProfileDetails::Teacher,
			UserKind::Counselor => UserProfileDetails::Counselor,
			UserKind::Staff => UserProfileDetails::Staff {
				title: reader
					.string("title", STAFF_TITLE_MAX_LENGTH)?
					.unwrap_or_default(),
			},
			UserKind::Alumnus => UserProfileDetails::Alumnus {
				graduation_year: reader.year("graduation_year")?,
			},
		};

		Ok(Self {
			middle_name: reader.string("middle_name", NAME_MAX_LENGTH)?,
			display_first_name: reader.string("display_first_name", NAME_MAX_LENGTH)?,
			display_last_name: reader.string("display_last_name", NAME_MAX_LENGTH)?,
			details,
		})
	}

	/// Profile data for a variant with no extra fields and no overrides.
	pub fn plain(details: UserProfileDetails) -> Self {
		Self {
			middle_name: None,
			display_first_name: None,
			display_last_name: None,
			details,
		}
	}
}

/// Persisted user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: i64,
	pub user_id: i64,
	pub middle_name: Option<String>,
	pub display_first_name: Option<String>,
	pub display_last_name: Option<String>,
	#[serde(flatten)]
	pub details: UserProfileDetails,
	pub creation_time: DateTime<Utc>,
	pub modification_time: DateTime<Utc>,
}

impl UserProfile {
	pub fn kind(&self) -> UserKind {
		self.details.kind()
	}

	/// Discriminator stored with the profile
	pub fn discriminator(&self) -> &'static str {
		self.kind().as_str()
	}

	pub fn student_id(&self) -> Option<&str> {
		match &self.details {
			UserProfileDetails::Student { student_id, .. } => Some(student_id),
			_ => None,
		}
	}

	pub fn graduation_year(&self) -> Option<i32> {
		match &self.details {
			UserProfileDetails::Student {
				graduation_year, ..
			}
			| UserProfileDetails::Alumnus { graduation_year } => *graduation_year,
			_ => None,
		}
	}
}

/// Non-empty override, otherwise the stored value.
pub(crate) fn override_or<'a>(override_value: Option<&'a str>, stored: &'a str) -> &'a str {
	match override_value {
		Some(value) if !value.is_empty() => value,
		_ => stored,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::{Value, json};

	fn fields(pairs: &[(&str, Value)]) -> ProfileFields {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[rstest]
	fn test_student_requires_student_id() {
		let err = NewUserProfile::from_fields("student", &ProfileFields::new()).unwrap_err();
		assert!(matches!(
			err,
			Error::InvalidProfileField { variant: "student", ref field, .. } if field == "student_id"
		));
	}

	#[rstest]
	fn test_student_fields() {
		let input = fields(&[
			("student_id", json!(12345678)),
			("graduation_year", json!(2021)),
			("counselor", json!(7)),
			("display_first_name", json!("Sam")),
		]);
		let profile = NewUserProfile::from_fields("student", &input).unwrap();
		assert_eq!(
			profile.details,
			UserProfileDetails::Student {
				student_id: "12345678".to_string(),
				graduation_year: Some(2021),
				counselor_id: Some(7),
			}
		);
		assert_eq!(profile.display_first_name.as_deref(), Some("Sam"));
	}

	#[rstest]
	fn test_staff_title_defaults_to_empty() {
		let profile = NewUserProfile::from_fields("staff", &ProfileFields::new()).unwrap();
		assert_eq!(
			profile.details,
			UserProfileDetails::Staff {
				title: String::new()
			}
		);
	}

	#[rstest]
	#[case("teacher", UserKind::Teacher)]
	#[case("counselor", UserKind::Counselor)]
	#[case("alumnus", UserKind::Alumnus)]
	fn test_variants_without_required_fields(#[case] discriminator: &str, #[case] kind: UserKind) {
		let profile = NewUserProfile::from_fields(discriminator, &ProfileFields::new()).unwrap();
		assert_eq!(profile.details.kind(), kind);
	}

	#[rstest]
	fn test_teacher_rejects_student_fields() {
		let input = fields(&[("student_id", json!("1"))]);
		assert!(matches!(
			NewUserProfile::from_fields("teacher", &input),
			Err(Error::InvalidProfileField { .. })
		));
	}

	#[rstest]
	fn test_unknown_discriminator() {
		assert!(matches!(
			NewUserProfile::from_fields("janitor", &ProfileFields::new()),
			Err(Error::UnknownVariant { .. })
		));
	}

	#[rstest]
	#[case(Some("Sam"), "Samuel", "Sam")]
	#[case(Some(""), "Samuel", "Samuel")]
	#[case(None, "Samuel", "Samuel")]
	fn test_override_or(
		#[case] override_value: Option<&str>,
		#[case] stored: &str,
		#[case] expected: &str,
	) {
		assert_eq!(override_or(override_value, stored), expected);
	}

	#[rstest]
	fn test_kind_round_trips_through_registry() {
		for kind in [
			UserKind::Student,
			UserKind::Teacher,
			UserKind::Counselor,
			UserKind::Staff,
			UserKind::Alumnus,
		] {
			assert_eq!(kind.as_str().parse::<UserKind>().unwrap(), kind);
		}
		assert_eq!(UserKind::Alumnus.label(), "Alumnus");
	}
}
