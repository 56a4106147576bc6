//! Error types for owner and profile models.

use thiserror::Error;

/// Errors raised while building, validating or reading owners and profiles.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
	/// The discriminator is not registered in the named registry.
	#[error("Unknown {registry} variant: {discriminator}")]
	UnknownVariant {
		/// Registry that was consulted ("user profile" or "group profile").
		registry: &'static str,
		/// Discriminator that failed to resolve.
		discriminator: String,
	},

	/// A profile field does not fit the resolved variant.
	#[error("Invalid field `{field}` for {variant} profile: {reason}")]
	InvalidProfileField {
		/// Discriminator of the resolved variant.
		variant: &'static str,
		/// Offending field name.
		field: String,
		/// What is wrong with it.
		reason: String,
	},

	/// An owner was read without its profile.
	#[error("{0} has no attached profile")]
	MissingProfile(String),

	/// A lifecycle hook could not keep a side-record in sync.
	#[error("Lifecycle sync failed: {0}")]
	LifecycleSync(String),

	/// Owner-level validation failed.
	#[error("Validation error: {0}")]
	Validation(String),

	/// The caller is not allowed to perform the operation.
	#[error("Permission denied: {0}")]
	PermissionDenied(String),
}

impl Error {
	pub(crate) fn invalid_field(
		variant: &'static str,
		field: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		Error::InvalidProfileField {
			variant,
			field: field.into(),
			reason: reason.into(),
		}
	}
}

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unknown_variant_message() {
		let error = Error::UnknownVariant {
			registry: "user profile",
			discriminator: "wizard".to_string(),
		};
		assert_eq!(error.to_string(), "Unknown user profile variant: wizard");
	}

	#[rstest]
	fn test_invalid_profile_field_message() {
		let error = Error::invalid_field("teacher", "student_id", "not accepted by this variant");
		assert_eq!(
			error.to_string(),
			"Invalid field `student_id` for teacher profile: not accepted by this variant"
		);
	}
}
