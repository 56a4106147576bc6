//! Anduril management binary

use anduril_commands::{Cli, CommandContext, apply_overrides, init_logging, run};
use anduril_conf::Settings;
use anyhow::Context;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();

	let cli = Cli::parse();
	let settings = Settings::load(Some(&cli.settings))
		.with_context(|| format!("loading settings from {}", cli.settings.display()))?;
	let settings = apply_overrides(&cli, settings);
	init_logging(&settings, cli.verbosity);

	let ctx = CommandContext::new(cli.verbosity);
	run(cli.command, &settings, &ctx).await?;
	Ok(())
}
