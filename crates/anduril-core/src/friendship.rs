//! Friendships between users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered pair of users. `a` asked, `b` confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
	pub id: i64,
	pub a: i64,
	pub b: i64,
	pub confirmed: bool,
	pub creation_time: DateTime<Utc>,
	pub modification_time: DateTime<Utc>,
}

impl Friendship {
	/// Whether the friendship links `x` and `y` in either direction
	pub fn links(&self, x: i64, y: i64) -> bool {
		(self.a == x && self.b == y) || (self.a == y && self.b == x)
	}

	/// The user on the other side from `user`, if `user` is part of it
	pub fn other(&self, user: i64) -> Option<i64> {
		if self.a == user {
			Some(self.b)
		} else if self.b == user {
			Some(self.a)
		} else {
			None
		}
	}
}
