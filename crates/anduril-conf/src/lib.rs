//! # Anduril Conf
//!
//! Settings for the Anduril portal, layered from defaults, an optional TOML
//! file and `ANDURIL_*` environment variables, plus the secret key file.

pub mod error;
pub mod secret;
pub mod settings;

pub use error::{ConfError, ConfResult};
pub use secret::SecretKey;
pub use settings::{DEFAULT_SETTINGS_FILE, ENV_PREFIX, Settings};
