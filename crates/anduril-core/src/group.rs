//! Groups, group profiles and memberships

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::fields::{FieldReader, ProfileFields};
use crate::profile::{NAME_MAX_LENGTH, override_or};
use crate::registry::{Discriminator, group_profiles};

/// Maximum length of a group name and title
pub const GROUP_NAME_MAX_LENGTH: usize = 80;
/// Maximum length of a membership role list
pub const ROLES_MAX_LENGTH: usize = 30;

/// Group profile discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
	Club,
	Academic,
	Administrative,
	External,
}

impl Discriminator for GroupKind {
	fn as_str(&self) -> &'static str {
		match self {
			GroupKind::Club => "club",
			GroupKind::Academic => "academic",
			GroupKind::Administrative => "administrative",
			GroupKind::External => "external",
		}
	}
}

impl GroupKind {
	pub const ALL: [GroupKind; 4] = [
		GroupKind::Club,
		GroupKind::Academic,
		GroupKind::Administrative,
		GroupKind::External,
	];

	pub fn label(&self) -> &'static str {
		group_profiles().get(*self).label()
	}

	/// Short description shown to users picking a group type
	pub fn about(&self) -> &'static str {
		match self {
			GroupKind::Club => {
				"Club groups are for organized extracurricular activities hosted at Blair, \
				 and include sports, academic, and hobby groups. Club groups require a \
				 teacher or staff sponsor and must be approved by the club administrator \
				 at Blair."
			}
			GroupKind::Academic => {
				"Academic groups are largely reserved for teachers, staff, and \
				 administrators at Blair. They provide a means of communication with \
				 students, and can serve as a platform for organizing school events."
			}
			GroupKind::Administrative => "Blah blah blah.",
			GroupKind::External => "Blah blah blah blah.",
		}
	}
}

impl fmt::Display for GroupKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for GroupKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		group_profiles().resolve(s).map(|spec| spec.kind())
	}
}

/// Variant-specific group profile fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupProfileDetails {
	Club {
		/// Sponsoring user ids, sorted
		#[serde(default)]
		sponsors: Vec<i64>,
	},
	Academic,
	Administrative,
	External,
}

impl GroupProfileDetails {
	pub fn kind(&self) -> GroupKind {
		match self {
			GroupProfileDetails::Club { .. } => GroupKind::Club,
			GroupProfileDetails::Academic => GroupKind::Academic,
			GroupProfileDetails::Administrative => GroupKind::Administrative,
			GroupProfileDetails::External => GroupKind::External,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroupProfile {
	pub display_title: Option<String>,
	pub details: GroupProfileDetails,
}

impl NewGroupProfile {
	/// Resolve `discriminator` and validate `fields` against the variant.
	pub fn from_fields(discriminator: &str, fields: &ProfileFields) -> Result<Self> {
		let spec = group_profiles().resolve(discriminator)?;
		let reader = FieldReader::new(spec, fields)?;

		let details = match spec.kind() {
			GroupKind::Club => GroupProfileDetails::Club {
				sponsors: reader.ids("sponsors")?,
			},
			GroupKind::Academic => GroupProfileDetails::Academic,
			GroupKind::Administrative => GroupProfileDetails::Administrative,
			GroupKind::External => GroupProfileDetails::External,
		};

		Ok(Self {
			display_title: reader.string("display_title", NAME_MAX_LENGTH)?,
			details,
		})
	}

	pub fn plain(details: GroupProfileDetails) -> Self {
		Self {
			display_title: None,
			details,
		}
	}
}

/// Persisted group profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
	pub id: i64,
	pub group_id: i64,
	pub display_title: Option<String>,
	#[serde(flatten)]
	pub details: GroupProfileDetails,
	pub creation_time: DateTime<Utc>,
	pub modification_time: DateTime<Utc>,
}

impl GroupProfile {
	pub fn kind(&self) -> GroupKind {
		self.details.kind()
	}

	pub fn discriminator(&self) -> &'static str {
		self.kind().as_str()
	}

	/// Sponsor ids for clubs, empty for every other variant
	pub fn sponsors(&self) -> &[i64] {
		match &self.details {
			GroupProfileDetails::Club { sponsors } => sponsors,
			_ => &[],
		}
	}
}

/// Owner fields for a group that has not been persisted yet
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
	pub name: String,
	pub title: String,
	pub description: String,
	pub hidden: bool,
}

impl NewGroup {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	pub fn validate(&self) -> Result<()> {
		let name = self.name.trim();
		if name.is_empty() {
			return Err(Error::Validation("group name must not be empty".to_string()));
		}
		if name.chars().count() > GROUP_NAME_MAX_LENGTH {
			return Err(Error::Validation(format!(
				"group name must be at most {} characters",
				GROUP_NAME_MAX_LENGTH
			)));
		}
		if self.title.chars().count() > GROUP_NAME_MAX_LENGTH {
			return Err(Error::Validation(format!(
				"group title must be at most {} characters",
				GROUP_NAME_MAX_LENGTH
			)));
		}
		Ok(())
	}
}

/// A persisted group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
	pub id: i64,
	pub name: String,
	pub title: String,
	pub description: String,
	pub hidden: bool,
	pub creation_time: DateTime<Utc>,
	pub modification_time: DateTime<Utc>,
	pub profile: Option<GroupProfile>,
}

impl Group {
	pub fn profile(&self) -> Option<&GroupProfile> {
		self.profile.as_ref()
	}

	pub fn profile_kind(&self) -> Option<GroupKind> {
		self.profile.as_ref().map(GroupProfile::kind)
	}

	pub fn require_profile(&self) -> Result<&GroupProfile> {
		self.profile
			.as_ref()
			.ok_or_else(|| Error::MissingProfile(format!("group {}", self.name)))
	}

	/// Profile display title, then the group title, then the name
	pub fn effective_title(&self) -> &str {
		let title = override_or(
			self.profile
				.as_ref()
				.and_then(|p| p.display_title.as_deref()),
			&self.title,
		);
		if title.is_empty() { &self.name } else { title }
	}

	pub fn slug(&self) -> String {
		format!("/groups/{}", self.id)
	}
}

impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.profile_kind() {
			Some(kind) => write!(f, "<Group.{} {}>", kind.label(), self.name),
			None => write!(f, "<Group {}>", self.name),
		}
	}
}

/// A user's membership in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
	pub id: i64,
	pub user_id: i64,
	pub group_id: i64,
	/// Free-form role text, e.g. "president"
	pub roles: String,
	pub creation_time: DateTime<Utc>,
	pub modification_time: DateTime<Utc>,
}

pub fn validate_roles(roles: &str) -> Result<()> {
	if roles.chars().count() > ROLES_MAX_LENGTH {
		return Err(Error::Validation(format!(
			"membership roles must be at most {} characters",
			ROLES_MAX_LENGTH
		)));
	}
	Ok(())
}
