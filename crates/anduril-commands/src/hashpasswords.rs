//! Hash the password column of a CSV dump
//!
//! The output keeps every other column as-is and lands next to the input,
//! with `.hashed` inserted before the extension.

use anduril_auth::PasswordHasher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};

/// Column holding the passwords
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordColumn {
	/// 1-based column number in a dump without a header row
	Index(usize),
	/// Case-insensitive header name
	Name(String),
}

impl PasswordColumn {
	/// An index only applies without a header; otherwise the column is found
	/// by name, `password` unless given.
	pub fn select(index: Option<usize>, header: bool, name: Option<String>) -> Self {
		match index {
			Some(index) if !header => Self::Index(index),
			_ => Self::Name(name.unwrap_or_else(|| "password".to_string())),
		}
	}
}

/// `/path/to/file.csv` becomes `/path/to/file.hashed.csv`.
pub fn hashed_filename(path: &Path) -> PathBuf {
	let stem = path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_default();
	let name = match path.extension() {
		Some(extension) => format!("{}.hashed.{}", stem, extension.to_string_lossy()),
		None => format!("{}.hashed", stem),
	};
	path.with_file_name(name)
}

/// Drop characters outside printable ASCII and ASCII whitespace.
pub fn printable(text: &str) -> String {
	text.chars()
		.filter(|c| c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'))
		.collect()
}

/// Rewrite `input` with the selected column hashed.
///
/// Nothing is produced when the column cannot be found. Returns the new CSV
/// and the number of hashed rows.
pub fn hash_passwords(
	input: &str,
	column: &PasswordColumn,
	hasher: &dyn PasswordHasher,
) -> CommandResult<(String, usize)> {
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(input.as_bytes());
	let mut records = reader.records();
	let mut writer = csv::Writer::from_writer(Vec::new());

	let index = match column {
		PasswordColumn::Index(0) => {
			return Err(CommandError::InvalidArgument(
				"column numbering starts at 1".to_string(),
			));
		}
		PasswordColumn::Index(index) => index - 1,
		PasswordColumn::Name(name) => {
			let header = match records.next() {
				Some(header) => header?,
				None => return Err(CommandError::ColumnNotFound(name.clone())),
			};
			let wanted = name.to_lowercase();
			let index = header
				.iter()
				.position(|column| column.to_lowercase() == wanted)
				.ok_or_else(|| CommandError::ColumnNotFound(name.clone()))?;
			writer.write_record(&header)?;
			index
		}
	};

	let mut hashed = 0;
	for record in records {
		let record = record?;
		if index >= record.len() {
			return Err(CommandError::InvalidArgument(format!(
				"row {} has no column {}",
				hashed + 1,
				index + 1
			)));
		}
		let row: Vec<String> = record
			.iter()
			.enumerate()
			.map(|(i, field)| {
				if i == index {
					hasher.hash(field)
				} else {
					Ok(field.to_string())
				}
			})
			.collect::<Result<_, _>>()?;
		writer.write_record(&row)?;
		hashed += 1;
	}

	let bytes = writer
		.into_inner()
		.map_err(|e| CommandError::io("<csv>", e.into_error()))?;
	Ok((String::from_utf8_lossy(&bytes).into_owned(), hashed))
}

/// Hash `dump` into its `.hashed` sibling.
pub fn run(
	ctx: &CommandContext,
	dump: &Path,
	column: &PasswordColumn,
	hasher: &dyn PasswordHasher,
) -> CommandResult<PathBuf> {
	ctx.info(&format!("Hashing passwords in {}", dump.display()));
	let bytes = fs::read(dump).map_err(|e| CommandError::io(dump, e))?;
	let input = printable(&String::from_utf8_lossy(&bytes));
	let (output, rows) = hash_passwords(&input, column, hasher)?;

	let target = hashed_filename(dump);
	fs::write(&target, output).map_err(|e| CommandError::io(&target, e))?;
	info!(dump = %dump.display(), rows, "Hashed passwords");
	ctx.success(&format!("Wrote {} rows to {}", rows, target.display()));
	Ok(target)
}

#[cfg(test)]
mod tests {
	use super::*;
	use anduril_auth::{Argon2Hasher, AuthResult};
	use rstest::rstest;

	/// Reversible stand-in so assertions can read the output
	struct TagHasher;

	impl PasswordHasher for TagHasher {
		fn hash(&self, password: &str) -> AuthResult<String> {
			Ok(format!("hashed:{}", password))
		}

		fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
			Ok(hash == format!("hashed:{}", password))
		}
	}

	// ========================================================================
	// Column selection
	// ========================================================================

	#[rstest]
	#[case(Some(2), false, None, PasswordColumn::Index(2))]
	#[case(Some(2), true, None, PasswordColumn::Name("password".to_string()))]
	#[case(None, false, None, PasswordColumn::Name("password".to_string()))]
	#[case(None, true, Some("Secret".to_string()), PasswordColumn::Name("Secret".to_string()))]
	fn test_select_column(
		#[case] index: Option<usize>,
		#[case] header: bool,
		#[case] name: Option<String>,
		#[case] expected: PasswordColumn,
	) {
		assert_eq!(PasswordColumn::select(index, header, name), expected);
	}

	#[rstest]
	#[case("/data/dump.csv", "/data/dump.hashed.csv")]
	#[case("dump.tar.csv", "dump.tar.hashed.csv")]
	#[case("dump", "dump.hashed")]
	fn test_hashed_filename(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(hashed_filename(Path::new(input)), PathBuf::from(expected));
	}

	#[rstest]
	fn test_printable_strips_control_characters() {
		assert_eq!(printable("na\u{0}me,p\u{7f}w\u{e9}\r\n"), "name,pw\r\n");
	}

	// ========================================================================
	// Hashing
	// ========================================================================

	#[rstest]
	fn test_hash_by_header_name() {
		// Arrange
		let input = "id,Name,PASSWORD\n1,Sean,asdf\n2,Noah,qwer\n";

		// Act
		let (output, rows) =
			hash_passwords(input, &PasswordColumn::Name("password".to_string()), &TagHasher)
				.unwrap();

		// Assert
		assert_eq!(rows, 2);
		assert_eq!(
			output,
			"id,Name,PASSWORD\n1,Sean,hashed:asdf\n2,Noah,hashed:qwer\n"
		);
	}

	#[rstest]
	fn test_hash_by_index_without_header() {
		let input = "1,asdf,Sean\n2,qwer,Noah\n";

		let (output, rows) = hash_passwords(input, &PasswordColumn::Index(2), &TagHasher).unwrap();

		assert_eq!(rows, 2);
		assert_eq!(output, "1,hashed:asdf,Sean\n2,hashed:qwer,Noah\n");
	}

	#[rstest]
	fn test_unknown_column_name_produces_nothing() {
		let result = hash_passwords(
			"id,name\n1,Sean\n",
			&PasswordColumn::Name("password".to_string()),
			&TagHasher,
		);
		assert!(matches!(result, Err(CommandError::ColumnNotFound(name)) if name == "password"));
	}

	#[rstest]
	#[case(0)]
	#[case(4)]
	fn test_index_out_of_range(#[case] index: usize) {
		let result = hash_passwords("1,asdf,Sean\n", &PasswordColumn::Index(index), &TagHasher);
		assert!(matches!(result, Err(CommandError::InvalidArgument(_))));
	}

	#[rstest]
	fn test_argon2_hashes_verify() {
		let hasher = Argon2Hasher::new();

		let (output, _) = hash_passwords("1,asdf\n", &PasswordColumn::Index(2), &hasher).unwrap();

		let mut reader = csv::ReaderBuilder::new()
			.has_headers(false)
			.from_reader(output.as_bytes());
		let record = reader.records().next().unwrap().unwrap();
		let hash = &record[1];
		assert!(hash.starts_with("$argon2"));
		assert!(hasher.verify("asdf", hash).unwrap());
	}

	#[rstest]
	fn test_run_writes_sibling_file() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let dump = dir.path().join("students.csv");
		fs::write(&dump, "name,password\nSean,asdf\n").unwrap();

		// Act
		let target = run(
			&CommandContext::default(),
			&dump,
			&PasswordColumn::select(None, true, None),
			&TagHasher,
		)
		.unwrap();

		// Assert
		assert_eq!(target, dir.path().join("students.hashed.csv"));
		assert_eq!(
			fs::read_to_string(target).unwrap(),
			"name,password\nSean,hashed:asdf\n"
		);
	}

	#[rstest]
	fn test_run_unknown_column_writes_no_file() {
		let dir = tempfile::tempdir().unwrap();
		let dump = dir.path().join("students.csv");
		fs::write(&dump, "name,secret\nSean,asdf\n").unwrap();

		let result = run(
			&CommandContext::default(),
			&dump,
			&PasswordColumn::select(None, true, None),
			&TagHasher,
		);

		assert!(result.is_err());
		assert!(!dir.path().join("students.hashed.csv").exists());
	}
}
