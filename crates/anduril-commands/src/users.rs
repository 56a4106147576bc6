//! User management commands

use anduril_core::{NewUser, ProfileFields, User};
use anduril_db::{CAN_LOGIN, UserManager};
use serde_json::Value;
use tracing::info;

use crate::context::CommandContext;
use crate::error::CommandResult;

/// Development account created by `addme`
pub const DEVELOPER_USERNAME: &str = "nokim";
pub const DEVELOPER_STUDENT_ID: &str = "12345678";
pub const DEVELOPER_PASSWORD: &str = "asdf";

/// Arguments of `createuser`
#[derive(Debug, Clone, Default)]
pub struct CreateUserOptions {
	pub kind: String,
	pub first_name: String,
	pub last_name: String,
	pub username: Option<String>,
	pub email: Option<String>,
	pub profile: Vec<(String, String)>,
}

/// Create a user and profile; the username is generated when not given.
pub async fn create_user(
	ctx: &CommandContext,
	users: &UserManager,
	options: CreateUserOptions,
) -> CommandResult<User> {
	let fields: ProfileFields = options
		.profile
		.into_iter()
		.map(|(key, value)| (key, Value::String(value)))
		.collect();

	let mut new_user = NewUser::default().with_name(options.first_name, options.last_name);
	if let Some(email) = options.email {
		new_user = new_user.with_email(email);
	}

	let user = match options.username {
		Some(username) => {
			new_user.username = username;
			users.create_user(new_user, &options.kind, &fields).await?
		}
		None => {
			users
				.create_user_with_generated_username(new_user, &options.kind, &fields)
				.await?
		}
	};

	info!(user = %user, "Created user");
	ctx.success(&format!("Created {} ({})", user.username, user.full_name()));
	Ok(user)
}

/// Arguments of `createstudent`
#[derive(Debug, Clone)]
pub struct StudentOptions {
	pub username: String,
	pub first_name: String,
	pub last_name: String,
	pub student_id: String,
	pub password: String,
}

impl StudentOptions {
	pub fn developer() -> Self {
		Self {
			username: DEVELOPER_USERNAME.to_string(),
			first_name: String::new(),
			last_name: String::new(),
			student_id: DEVELOPER_STUDENT_ID.to_string(),
			password: DEVELOPER_PASSWORD.to_string(),
		}
	}
}

/// Replace any user named `options.username` with a student superuser that
/// holds the login permission.
pub async fn create_student(
	ctx: &CommandContext,
	users: &UserManager,
	options: StudentOptions,
) -> CommandResult<User> {
	if users.delete_by_username(&options.username).await? {
		ctx.warning(&format!("Replaced existing user {}", options.username));
	}

	let mut fields = ProfileFields::new();
	fields.insert("student_id".to_string(), Value::String(options.student_id));

	let new_user = NewUser::new(options.username)
		.with_name(options.first_name, options.last_name)
		.with_password(options.password)
		.superuser();
	let user = users.create_user(new_user, "student", &fields).await?;
	users.grant_permission(&user, CAN_LOGIN).await?;

	info!(user = %user, "Created student superuser");
	ctx.success(&format!("Created student {}", user.username));
	Ok(user)
}

/// Prompt for a password on the terminal.
pub fn prompt_password() -> CommandResult<String> {
	let password = dialoguer::Password::with_theme(&dialoguer::theme::ColorfulTheme::default())
		.with_prompt("Password")
		.interact()?;
	Ok(password)
}
