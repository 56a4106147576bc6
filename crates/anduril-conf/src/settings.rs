//! Layered settings
//!
//! Settings are merged in priority order: environment variables
//! (`ANDURIL_*`) over the TOML file over the defaults.
//!
//! ```
//! use anduril_conf::Settings;
//!
//! let env = vec![("ANDURIL_DEBUG".to_string(), "on".to_string())];
//! let settings = Settings::load_from(None, env).unwrap();
//! assert!(settings.debug);
//! assert_eq!(settings.max_connections, 5);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfError, ConfResult};

/// Prefix of the environment variables read by [`Settings::load`]
pub const ENV_PREFIX: &str = "ANDURIL_";

/// Settings file read when no path is given
pub const DEFAULT_SETTINGS_FILE: &str = "anduril.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub debug: bool,
	pub database_url: String,
	pub max_connections: u32,
	pub secret_key_path: PathBuf,
	pub site_url: String,
	pub allowed_hosts: Vec<String>,
	/// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
	pub log_filter: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			database_url: "sqlite://anduril.db?mode=rwc".to_string(),
			max_connections: 5,
			secret_key_path: PathBuf::from("secret.txt"),
			site_url: "http://localhost:8000".to_string(),
			allowed_hosts: vec!["localhost".to_string()],
			log_filter: "info".to_string(),
		}
	}
}

impl Settings {
	/// Load settings from `path` (if it exists) and the process environment.
	pub fn load(path: Option<&Path>) -> ConfResult<Self> {
		Self::load_from(path, std::env::vars())
	}

	/// Load settings from `path` (if it exists) and the given environment.
	pub fn load_from<I>(path: Option<&Path>, env: I) -> ConfResult<Self>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut merged = match serde_json::to_value(Self::default())? {
			Value::Object(map) => map,
			_ => Map::new(),
		};

		if let Some(path) = path {
			if path.exists() {
				merged.extend(read_toml(path)?);
				debug!(path = %path.display(), "Loaded settings file");
			} else {
				debug!(path = %path.display(), "Settings file not found, using defaults");
			}
		}

		for (key, value) in env {
			let Some(name) = key.strip_prefix(ENV_PREFIX) else {
				continue;
			};
			let name = name.to_lowercase();
			if !merged.contains_key(&name) {
				debug!(variable = %key, "Ignoring unknown setting");
				continue;
			}
			let parsed = parse_env_value(&name, &value)?;
			merged.insert(name, parsed);
		}

		let settings: Self = serde_json::from_value(Value::Object(merged))?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn validate(&self) -> ConfResult<()> {
		if self.database_url.trim().is_empty() {
			return Err(ConfError::invalid("database_url", "must not be empty"));
		}
		if self.max_connections == 0 {
			return Err(ConfError::invalid("max_connections", "must be at least 1"));
		}
		Ok(())
	}
}

fn read_toml(path: &Path) -> ConfResult<Map<String, Value>> {
	let text = fs::read_to_string(path).map_err(|e| ConfError::io(path, e))?;
	let table: toml::Table = toml::from_str(&text)?;
	match serde_json::to_value(table)? {
		Value::Object(map) => Ok(map),
		_ => Ok(Map::new()),
	}
}

fn parse_env_value(name: &str, value: &str) -> ConfResult<Value> {
	match name {
		"debug" => match value.trim().to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
			"false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
			other => Err(ConfError::invalid(name, format!("'{}' is not a boolean", other))),
		},
		"max_connections" => value
			.trim()
			.parse::<u32>()
			.map(Value::from)
			.map_err(|e| ConfError::invalid(name, e.to_string())),
		"allowed_hosts" => Ok(Value::Array(
			value
				.split(',')
				.map(str::trim)
				.filter(|host| !host.is_empty())
				.map(|host| Value::String(host.to_string()))
				.collect(),
		)),
		_ => Ok(Value::String(value.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn settings_file(contents: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[rstest]
	fn test_defaults_without_sources() {
		let settings = Settings::load_from(None, Vec::new()).unwrap();
		assert_eq!(settings, Settings::default());
	}

	#[rstest]
	fn test_file_overrides_defaults() {
		// Arrange
		let file = settings_file(
			"debug = true\nsite_url = \"https://school.org\"\nallowed_hosts = [\"school.org\"]\n",
		);

		// Act
		let settings = Settings::load_from(Some(file.path()), Vec::new()).unwrap();

		// Assert
		assert!(settings.debug);
		assert_eq!(settings.site_url, "https://school.org");
		assert_eq!(settings.allowed_hosts, vec!["school.org"]);
		assert_eq!(settings.max_connections, 5);
	}

	#[rstest]
	fn test_env_overrides_file() {
		let file = settings_file("max_connections = 8\nlog_filter = \"debug\"\n");
		let env = env(&[
			("ANDURIL_MAX_CONNECTIONS", "12"),
			("ANDURIL_ALLOWED_HOSTS", "a.org, b.org,"),
			("OTHER_DEBUG", "true"),
		]);

		let settings = Settings::load_from(Some(file.path()), env).unwrap();

		assert_eq!(settings.max_connections, 12);
		assert_eq!(settings.log_filter, "debug");
		assert_eq!(settings.allowed_hosts, vec!["a.org", "b.org"]);
		assert!(!settings.debug);
	}

	#[rstest]
	#[case("1", true)]
	#[case("yes", true)]
	#[case("OFF", false)]
	#[case("false", false)]
	fn test_env_debug_values(#[case] raw: &str, #[case] expected: bool) {
		let settings = Settings::load_from(None, env(&[("ANDURIL_DEBUG", raw)])).unwrap();
		assert_eq!(settings.debug, expected);
	}

	#[rstest]
	#[case("ANDURIL_DEBUG", "maybe")]
	#[case("ANDURIL_MAX_CONNECTIONS", "many")]
	#[case("ANDURIL_MAX_CONNECTIONS", "0")]
	fn test_invalid_env_values(#[case] key: &str, #[case] raw: &str) {
		let result = Settings::load_from(None, env(&[(key, raw)]));
		assert!(matches!(result, Err(ConfError::InvalidValue { .. })));
	}

	#[rstest]
	fn test_unknown_env_keys_are_ignored() {
		let settings = Settings::load_from(None, env(&[("ANDURIL_COLOR", "blue")])).unwrap();
		assert_eq!(settings, Settings::default());
	}

	#[rstest]
	fn test_unknown_file_keys_are_rejected() {
		let file = settings_file("colour = \"blue\"\n");
		let result = Settings::load_from(Some(file.path()), Vec::new());
		assert!(matches!(result, Err(ConfError::Settings(_))));
	}

	#[rstest]
	fn test_malformed_file() {
		let file = settings_file("debug = \n");
		let result = Settings::load_from(Some(file.path()), Vec::new());
		assert!(matches!(result, Err(ConfError::Toml(_))));
	}

	#[rstest]
	fn test_missing_file_falls_back_to_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing.toml");
		let settings = Settings::load_from(Some(&path), Vec::new()).unwrap();
		assert_eq!(settings, Settings::default());
	}
}
