//! Mail domains and accounts
//!
//! Domains are the mail domains handled by this server. Exactly one of them
//! may be marked `main`. Accounts either store mail locally or forward it;
//! the address must repeat the domain name after the `@`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Maximum length of a domain name
pub const DOMAIN_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
	pub id: i64,
	pub name: String,
	pub main: bool,
}

impl fmt::Display for Domain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

pub fn validate_domain_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(Error::Validation("domain name must not be empty".to_string()));
	}
	if name.chars().count() > DOMAIN_NAME_MAX_LENGTH {
		return Err(Error::Validation(format!(
			"domain name must be at most {} characters",
			DOMAIN_NAME_MAX_LENGTH
		)));
	}
	Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	pub id: i64,
	pub domain_id: i64,
	pub address: String,
	/// Alias target; empty when mail is stored on this server
	pub forward: String,
}

impl Account {
	pub fn is_alias(&self) -> bool {
		!self.forward.is_empty()
	}
}

impl fmt::Display for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.address)
	}
}

/// The part of `address` after the `@` must equal `domain.name`.
///
/// ```
/// use anduril_core::mail::{Domain, validate_account_address};
///
/// let domain = Domain { id: 1, name: "school.org".to_string(), main: true };
/// assert!(validate_account_address("nokim@school.org", &domain).is_ok());
/// assert!(validate_account_address("nokim@elsewhere.org", &domain).is_err());
/// assert!(validate_account_address("nokim", &domain).is_err());
/// ```
pub fn validate_account_address(address: &str, domain: &Domain) -> Result<()> {
	match address.split_once('@') {
		Some((local, host)) if !local.is_empty() && host == domain.name => Ok(()),
		Some((_, host)) if !host.contains('@') => Err(Error::Validation(format!(
			"address {} does not belong to domain {}",
			address, domain.name
		))),
		_ => Err(Error::Validation(format!(
			"{} is not a valid mail address",
			address
		))),
	}
}
