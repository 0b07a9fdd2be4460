use serde_json::json;
use viewerq::SortOption;
use viewerq_runtime::credential::mask;

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{ResultBuilder, print_result};

pub fn show(ctx: &CommandContext) -> Result<()> {
	let mut config = ctx.store.snapshot();
	config.access_token = mask(&config.access_token);
	config.refresh_token = mask(&config.refresh_token);
	config.client_secret = mask(&config.client_secret);

	let result = ResultBuilder::new("config show").data(serde_json::to_value(&config)?).build();
	print_result(&result, ctx.format);
	Ok(())
}

pub fn path(ctx: &CommandContext) -> Result<()> {
	let result = ResultBuilder::new("config path")
		.data(json!({
			"path": ctx.config_path,
			"exists": ctx.config_path.exists(),
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

pub fn set_channel(ctx: &CommandContext, channel: &str) -> Result<()> {
	let channel = channel.trim().trim_start_matches('#').to_ascii_lowercase();
	if channel.is_empty() {
		return Err(CliError::InvalidInput("channel must not be empty".into()));
	}
	let config = ctx.store.update(|c| c.channel = channel)?;

	let result = ResultBuilder::new("config set-channel")
		.data(json!({ "channel": config.channel }))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

pub fn set_sort(ctx: &CommandContext, option: &str) -> Result<()> {
	let option: SortOption = option.parse().map_err(|err: viewerq::UnknownSortOption| CliError::InvalidInput(err.to_string()))?;
	let config = ctx.store.update(|c| c.sort_option = option)?;

	let result = ResultBuilder::new("config set-sort")
		.data(json!({
			"sortOption": config.sort_option,
			"label": config.sort_option.label(),
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
