//! Variant registries
//!
//! Maps profile discriminators to the variant they select. Each registry is a
//! static table built once on first access and never mutated afterwards, so it
//! can be read from any task without locking.
//!
//! ```
//! use anduril_core::registry::{group_profiles, user_profiles};
//! use anduril_core::{GroupKind, UserKind};
//!
//! let student = user_profiles().resolve("student").unwrap();
//! assert_eq!(student.kind(), UserKind::Student);
//! assert!(student.accepts("student_id"));
//!
//! let club = group_profiles().resolve("club").unwrap();
//! assert_eq!(club.kind(), GroupKind::Club);
//! assert!(user_profiles().resolve("wizard").is_err());
//! ```

use once_cell::sync::Lazy;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::group::GroupKind;
use crate::profile::UserKind;

/// A closed enumeration of profile variants.
pub trait Discriminator: Copy + Eq + Hash + Debug + Send + Sync + 'static {
	/// Discriminator value stored alongside the profile.
	fn as_str(&self) -> &'static str;
}

/// Registration entry for one profile variant.
#[derive(Debug, Clone)]
pub struct VariantSpec<K> {
	discriminator: &'static str,
	kind: K,
	label: &'static str,
	fields: &'static [&'static str],
	common_fields: &'static [&'static str],
}

impl<K: Discriminator> VariantSpec<K> {
	/// Discriminator this variant is registered under
	pub fn discriminator(&self) -> &'static str {
		self.discriminator
	}

	/// Typed kind for the variant
	pub fn kind(&self) -> K {
		self.kind
	}

	/// Human readable label ("Student", "Club", ...)
	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Fields specific to this variant
	pub fn fields(&self) -> &'static [&'static str] {
		self.fields
	}

	/// Whether `field` is a valid profile field for this variant, either shared
	/// by every variant of the registry or specific to this one.
	pub fn accepts(&self, field: &str) -> bool {
		self.common_fields.contains(&field) || self.fields.contains(&field)
	}
}

/// Immutable discriminator table for one family of profiles.
#[derive(Debug)]
pub struct VariantRegistry<K: 'static> {
	name: &'static str,
	common_fields: &'static [&'static str],
	variants: Vec<VariantSpec<K>>,
}

impl<K: Discriminator> VariantRegistry<K> {
	fn new(name: &'static str, common_fields: &'static [&'static str]) -> Self {
		Self {
			name,
			common_fields,
			variants: Vec::new(),
		}
	}

	fn register(mut self, kind: K, label: &'static str, fields: &'static [&'static str]) -> Self {
		debug_assert!(
			self.variants.iter().all(|v| v.kind != kind),
			"{:?} registered twice in {}",
			kind,
			self.name
		);
		self.variants.push(VariantSpec {
			discriminator: kind.as_str(),
			kind,
			label,
			fields,
			common_fields: self.common_fields,
		});
		self
	}

	/// Registry name used in error messages
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Fields shared by every variant
	pub fn common_fields(&self) -> &'static [&'static str] {
		self.common_fields
	}

	/// Resolve a discriminator to its variant.
	///
	/// Fails with [`Error::UnknownVariant`] for anything that was not
	/// registered; there is no default variant.
	pub fn resolve(&self, discriminator: &str) -> Result<&VariantSpec<K>> {
		self.variants
			.iter()
			.find(|v| v.discriminator == discriminator)
			.ok_or_else(|| Error::UnknownVariant {
				registry: self.name,
				discriminator: discriminator.to_string(),
			})
	}

	/// Look up the entry for an already typed kind
	pub fn get(&self, kind: K) -> &VariantSpec<K> {
		self.variants
			.iter()
			.find(|v| v.kind == kind)
			.unwrap_or_else(|| unreachable!("{:?} missing from {}", kind, self.name))
	}

	/// Registered variants in registration order
	pub fn variants(&self) -> impl Iterator<Item = &VariantSpec<K>> {
		self.variants.iter()
	}
}

static USER_PROFILES: Lazy<VariantRegistry<UserKind>> = Lazy::new(|| {
	VariantRegistry::new(
		"user profile",
		&["middle_name", "display_first_name", "display_last_name"],
	)
	.register(
		UserKind::Student,
		"Student",
		&["student_id", "graduation_year", "counselor"],
	)
	.register(UserKind::Teacher, "Teacher", &[])
	.register(UserKind::Counselor, "Counselor", &[])
	.register(UserKind::Staff, "Staff", &["title"])
	.register(UserKind::Alumnus, "Alumnus", &["graduation_year"])
});

static GROUP_PROFILES: Lazy<VariantRegistry<GroupKind>> = Lazy::new(|| {
	VariantRegistry::new("group profile", &["display_title"])
		.register(GroupKind::Club, "Club", &["sponsors"])
		.register(GroupKind::Academic, "Academic", &[])
		.register(GroupKind::Administrative, "Administrative", &[])
		.register(GroupKind::External, "External", &[])
});

/// Registry of user profile variants
pub fn user_profiles() -> &'static VariantRegistry<UserKind> {
	&USER_PROFILES
}

/// Registry of group profile variants
pub fn group_profiles() -> &'static VariantRegistry<GroupKind> {
	&GROUP_PROFILES
}
