//! Profile-based authorization
//!
//! Which group types a user may request, guards for call sites that only
//! serve some profile kinds, and per-kind dispatch.

use anduril_core::{Error, GroupKind, Result, User, UserKind};
use std::collections::{BTreeMap, BTreeSet};

/// Group types `user` is allowed to request.
///
/// | user                         | allowed                         |
/// |------------------------------|---------------------------------|
/// | superuser or staff flag      | every group type                |
/// | teacher or staff profile     | club, academic, external        |
/// | student profile              | club                            |
/// | anyone else                  | nothing                         |
pub fn allowed_group_types(user: &User) -> BTreeSet<GroupKind> {
	if user.is_superuser || user.is_staff {
		return GroupKind::ALL.into_iter().collect();
	}
	match user.profile_kind() {
		Some(UserKind::Teacher | UserKind::Staff) => {
			[GroupKind::Club, GroupKind::Academic, GroupKind::External]
				.into_iter()
				.collect()
		}
		Some(UserKind::Student) => BTreeSet::from([GroupKind::Club]),
		_ => BTreeSet::new(),
	}
}

/// Succeeds when the user's profile kind is one of `kinds`.
pub fn require_profile_kind(user: &User, kinds: &[UserKind]) -> Result<UserKind> {
	let kind = user.require_profile()?.kind();
	if kinds.contains(&kind) {
		Ok(kind)
	} else {
		Err(Error::PermissionDenied(format!(
			"{} profiles may not access this",
			kind
		)))
	}
}

/// Lookup from a user's profile kind to a value, with a fallback.
///
/// ```
/// use anduril_auth::ProfileDispatch;
/// use anduril_core::UserKind;
///
/// let home = ProfileDispatch::new("home/generic")
///     .on(UserKind::Student, "home/student")
///     .on(UserKind::Teacher, "home/teacher");
///
/// assert_eq!(*home.get(Some(UserKind::Student)), "home/student");
/// assert_eq!(*home.get(Some(UserKind::Alumnus)), "home/generic");
/// assert_eq!(*home.get(None), "home/generic");
/// ```
#[derive(Debug, Clone)]
pub struct ProfileDispatch<T> {
	handlers: BTreeMap<UserKind, T>,
	default: T,
}

impl<T> ProfileDispatch<T> {
	pub fn new(default: T) -> Self {
		Self {
			handlers: BTreeMap::new(),
			default,
		}
	}

	pub fn on(mut self, kind: UserKind, value: T) -> Self {
		self.handlers.insert(kind, value);
		self
	}

	pub fn get(&self, kind: Option<UserKind>) -> &T {
		kind.and_then(|k| self.handlers.get(&k))
			.unwrap_or(&self.default)
	}

	/// Value for the profile kind of `user`
	pub fn dispatch(&self, user: &User) -> &T {
		self.get(user.profile_kind())
	}
}
