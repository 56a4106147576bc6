//! # Anduril Commands
//!
//! Management commands run through the `manage` binary:
//!
//! - `migrate`: create the schema
//! - `createuser`: create a user and profile, generating the username
//! - `createstudent` and `addme`: replace a user with a student superuser
//! - `hashpasswords`: hash the password column of a CSV dump
//! - `newsecret`: write a new secret key

pub mod cli;
pub mod context;
pub mod error;
pub mod hashpasswords;
pub mod runner;
pub mod users;

pub use cli::{Cli, Commands};
pub use context::CommandContext;
pub use error::{CommandError, CommandResult};
pub use runner::{apply_overrides, init_logging, run};
