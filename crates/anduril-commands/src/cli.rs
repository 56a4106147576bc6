//! Command-line interface for the `manage` binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anduril_conf::DEFAULT_SETTINGS_FILE;

/// Anduril management interface
#[derive(Debug, Parser)]
#[command(name = "manage")]
#[command(about = "Anduril management interface", long_about = None)]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	pub verbosity: u8,

	/// Settings file
	#[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_FILE, global = true)]
	pub settings: PathBuf,

	/// Database URL, overriding the settings
	#[arg(long, value_name = "URL", global = true)]
	pub database: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
	/// Create the database schema
	Migrate,

	/// Create a user with a profile, generating the username if needed
	Createuser {
		/// Profile type: student, teacher, counselor, staff or alumnus
		#[arg(short, long, value_name = "TYPE")]
		kind: String,

		#[arg(long, value_name = "NAME")]
		first_name: String,

		#[arg(long, value_name = "NAME")]
		last_name: String,

		#[arg(short, long)]
		username: Option<String>,

		#[arg(short, long)]
		email: Option<String>,

		/// Profile field, e.g. `--profile student_id=20230001`
		#[arg(short, long = "profile", value_name = "KEY=VALUE", value_parser = parse_key_value)]
		profile: Vec<(String, String)>,
	},

	/// Replace a user with a student superuser that can log in
	Createstudent {
		#[arg(short, long)]
		username: String,

		#[arg(long, value_name = "NAME")]
		first_name: String,

		#[arg(long, value_name = "NAME")]
		last_name: String,

		#[arg(long, value_name = "ID")]
		student_id: String,

		/// Prompted for when omitted
		#[arg(short, long)]
		password: Option<String>,
	},

	/// Create the development user
	Addme,

	/// Hash the password column of a CSV dump
	Hashpasswords {
		/// The CSV file of student information
		#[arg(value_name = "DUMP")]
		dump: PathBuf,

		/// Password column number, starting at 1. Used only without --header.
		#[arg(short, long)]
		index: Option<usize>,

		/// The first row holds column names
		#[arg(long)]
		header: bool,

		/// Password column name
		#[arg(short, long)]
		name: Option<String>,
	},

	/// Write a new secret key
	Newsecret {
		/// Key file, defaulting to the configured path
		#[arg(long, value_name = "PATH")]
		path: Option<PathBuf>,
	},
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((key, value)) if !key.trim().is_empty() => {
			Ok((key.trim().to_string(), value.to_string()))
		}
		_ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
	}
}
