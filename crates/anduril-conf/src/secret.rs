//! Secret key storage
//!
//! The key lives in a plain text file next to the settings. It is read once
//! at startup and generated on first run.

use rand::Rng;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{ConfError, ConfResult};

/// Characters a generated key is drawn from
pub const SECRET_KEY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*(-_=+)";

pub const SECRET_KEY_LENGTH: usize = 50;

#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
	pub fn generate() -> Self {
		let mut rng = rand::thread_rng();
		let key = (0..SECRET_KEY_LENGTH)
			.map(|_| SECRET_KEY_CHARSET[rng.gen_range(0..SECRET_KEY_CHARSET.len())] as char)
			.collect();
		Self(key)
	}

	/// Read the key at `path`, or generate one and write it there.
	pub fn load_or_generate(path: &Path) -> ConfResult<Self> {
		if path.exists() {
			return Self::load(path);
		}
		let key = Self::generate();
		key.write(path)?;
		info!(path = %path.display(), "Generated new secret key");
		Ok(key)
	}

	pub fn load(path: &Path) -> ConfResult<Self> {
		let text = fs::read_to_string(path).map_err(|e| ConfError::io(path, e))?;
		let key = text.trim();
		if key.is_empty() {
			return Err(ConfError::EmptySecret(path.to_path_buf()));
		}
		Ok(Self(key.to_string()))
	}

	/// Write the key to `path`, replacing any existing file.
	pub fn write(&self, path: &Path) -> ConfResult<()> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| ConfError::io(parent, e))?;
		}
		fs::write(path, &self.0).map_err(|e| ConfError::io(path, e))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretKey(**redacted**)")
	}
}
