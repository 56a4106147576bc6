//! Untyped profile field input
//!
//! Callers hand profile data over as a map from field name to JSON value, the
//! same shape management commands and API payloads produce. [`FieldReader`]
//! checks the map against a [`VariantSpec`] and pulls typed values out of it.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::registry::{Discriminator, VariantSpec};

/// Profile fields keyed by field name
pub type ProfileFields = BTreeMap<String, Value>;

pub(crate) struct FieldReader<'a> {
	variant: &'static str,
	fields: &'a ProfileFields,
}

impl<'a> FieldReader<'a> {
	/// Reject any key the variant does not accept, before reading values.
	pub(crate) fn new<K: Discriminator>(
		spec: &VariantSpec<K>,
		fields: &'a ProfileFields,
	) -> Result<Self> {
		if let Some(field) = fields.keys().find(|key| !spec.accepts(key)) {
			return Err(Error::invalid_field(
				spec.discriminator(),
				field.as_str(),
				"not accepted by this variant",
			));
		}
		Ok(Self {
			variant: spec.discriminator(),
			fields,
		})
	}

	fn present(&self, name: &str) -> Option<&'a Value> {
		self.fields.get(name).filter(|v| !v.is_null())
	}

	/// String value; numbers are accepted and rendered in decimal.
	pub(crate) fn string(&self, name: &str, max_len: usize) -> Result<Option<String>> {
		let value = match self.present(name) {
			None => return Ok(None),
			Some(Value::String(s)) => s.trim().to_string(),
			Some(Value::Number(n)) => n.to_string(),
			Some(_) => {
				return Err(Error::invalid_field(self.variant, name, "expected a string"));
			}
		};
		if value.chars().count() > max_len {
			return Err(Error::invalid_field(
				self.variant,
				name,
				format!("at most {} characters", max_len),
			));
		}
		Ok(Some(value))
	}

	pub(crate) fn required_string(&self, name: &str, max_len: usize) -> Result<String> {
		match self.string(name, max_len)? {
			Some(value) if !value.is_empty() => Ok(value),
			_ => Err(Error::invalid_field(self.variant, name, "required")),
		}
	}

	fn integer(&self, name: &str, value: &Value) -> Result<i64> {
		match value {
			Value::Number(n) => n.as_i64(),
			Value::String(s) => s.trim().parse().ok(),
			_ => None,
		}
		.ok_or_else(|| Error::invalid_field(self.variant, name, "expected an integer"))
	}

	pub(crate) fn year(&self, name: &str) -> Result<Option<i32>> {
		let Some(value) = self.present(name) else {
			return Ok(None);
		};
		let year = self.integer(name, value)?;
		i32::try_from(year)
			.map(Some)
			.map_err(|_| Error::invalid_field(self.variant, name, "year out of range"))
	}

	/// Reference to another owner by id
	pub(crate) fn id(&self, name: &str) -> Result<Option<i64>> {
		self.present(name)
			.map(|value| self.integer(name, value))
			.transpose()
	}

	/// List of owner ids; a single id is read as a one-element list.
	pub(crate) fn ids(&self, name: &str) -> Result<Vec<i64>> {
		let mut ids = match self.present(name) {
			None => Vec::new(),
			Some(Value::Array(items)) => items
				.iter()
				.map(|item| self.integer(name, item))
				.collect::<Result<Vec<_>>>()?,
			Some(value) => vec![self.integer(name, value)?],
		};
		ids.sort_unstable();
		ids.dedup();
		Ok(ids)
	}
}
