//! Command output

use console::style;

/// Output channel shared by all commands
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
	pub verbosity: u8,
}

impl CommandContext {
	pub fn new(verbosity: u8) -> Self {
		Self { verbosity }
	}

	pub fn info(&self, message: &str) {
		println!("{} {}", style("[INFO]").cyan(), message);
	}

	pub fn success(&self, message: &str) {
		println!("{} {}", style("[SUCCESS]").green().bold(), message);
	}

	pub fn warning(&self, message: &str) {
		eprintln!("{} {}", style("[WARNING]").yellow(), message);
	}

	/// Printed only with `-v`
	pub fn verbose(&self, message: &str) {
		if self.verbosity > 0 {
			println!("{} {}", style("[VERBOSE]").dim(), message);
		}
	}
}
