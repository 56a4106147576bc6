//! Username candidates
//!
//! [`generate_username`] proposes handles for a person in a fixed priority
//! order. It never checks availability; callers take the first candidate that
//! is not already taken.
//!
//! ```
//! use anduril_auth::generate_username;
//!
//! let mut candidates = generate_username("Sean H.", "Gabaree");
//! assert_eq!(candidates.next().as_deref(), Some("segabare"));
//! assert_eq!(candidates.next().as_deref(), Some("segabaree"));
//! assert_eq!(candidates.next().as_deref(), Some("seagabaree"));
//! ```

/// Short prefix of the first name used by the leading tiers
const FIRST_PREFIX: usize = 2;
/// Short prefix of the last name used by the leading tiers
const LAST_PREFIX: usize = 6;

/// Lowercase and keep ASCII letters only.
fn filter_name(name: &str) -> String {
	name.chars()
		.flat_map(char::to_lowercase)
		.filter(char::is_ascii_lowercase)
		.collect()
}

fn prefix(s: &str, n: usize) -> &str {
	// Only ASCII survives filter_name, so byte and char offsets agree.
	&s[..n.min(s.len())]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
	/// `fi` + `lastna`
	Short,
	/// `fi` + longer prefixes of the last name
	LongerLast(usize),
	/// longer prefixes of the first name + full last name
	LongerFirst(usize),
	/// full first name + longer prefixes of the last name
	FullFirst(usize),
	/// full first + full last + counter
	Numbered(u64),
}

/// Infinite, restartable sequence of username candidates.
///
/// Cloning the generator forks the sequence at its current position.
#[derive(Debug, Clone)]
pub struct UsernameGenerator {
	first: String,
	last: String,
	tier: Tier,
}

impl UsernameGenerator {
	pub fn new(first_name: &str, last_name: &str) -> Self {
		Self {
			first: filter_name(first_name),
			last: filter_name(last_name),
			tier: Tier::Short,
		}
	}
}

impl Iterator for UsernameGenerator {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		let first = self.first.as_str();
		let last = self.last.as_str();
		loop {
			match self.tier {
				Tier::Short => {
					self.tier = Tier::LongerLast(LAST_PREFIX + 1);
					return Some(format!(
						"{}{}",
						prefix(first, FIRST_PREFIX),
						prefix(last, LAST_PREFIX)
					));
				}
				Tier::LongerLast(n) if n <= last.len() => {
					self.tier = Tier::LongerLast(n + 1);
					return Some(format!("{}{}", prefix(first, FIRST_PREFIX), prefix(last, n)));
				}
				Tier::LongerLast(_) => self.tier = Tier::LongerFirst(FIRST_PREFIX + 1),
				Tier::LongerFirst(n) if n <= first.len() => {
					self.tier = Tier::LongerFirst(n + 1);
					return Some(format!("{}{}", prefix(first, n), last));
				}
				Tier::LongerFirst(_) => self.tier = Tier::FullFirst(LAST_PREFIX + 1),
				Tier::FullFirst(n) if n <= last.len() => {
					self.tier = Tier::FullFirst(n + 1);
					return Some(format!("{}{}", first, prefix(last, n)));
				}
				Tier::FullFirst(_) => self.tier = Tier::Numbered(0),
				Tier::Numbered(i) => {
					self.tier = Tier::Numbered(i + 1);
					return Some(format!("{}{}{}", first, last, i));
				}
			}
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(usize::MAX, None)
	}
}

/// Candidate usernames for a person, most preferred first.
pub fn generate_username(first_name: &str, last_name: &str) -> UsernameGenerator {
	UsernameGenerator::new(first_name, last_name)
}
