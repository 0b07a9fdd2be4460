mod auth;
mod config;
mod run;

use crate::cli::{AuthAction, Cli, Commands, ConfigAction};
use crate::context::CommandContext;
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::new(&cli);
	match cli.command {
		Commands::Auth { action } => match action {
			AuthAction::Login { no_browser } => auth::login(&ctx, no_browser).await,
			AuthAction::Refresh => auth::refresh(&ctx).await,
			AuthAction::Validate => auth::validate(&ctx).await,
			AuthAction::Show => auth::show(&ctx),
		},
		Commands::Config { action } => match action {
			ConfigAction::Show => config::show(&ctx),
			ConfigAction::Path => config::path(&ctx),
			ConfigAction::SetChannel { channel } => config::set_channel(&ctx, &channel),
			ConfigAction::SetSort { option } => config::set_sort(&ctx, &option),
		},
		Commands::Run { no_browser } => run::execute(&ctx, no_browser).await,
	}
}
