use serde_json::json;
use tracing::info;
use viewerq::EventBus;
use viewerq_runtime::TokenValidator;
use viewerq_runtime::credential::mask;

use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{ResultBuilder, print_result};

pub async fn login(ctx: &CommandContext, no_browser: bool) -> Result<()> {
	let auth = ctx.authenticator(EventBus::default(), no_browser)?;
	let url = auth.authorize_url()?;
	eprintln!("Authorize at: {url}");

	auth.start_authorization().await?;
	info!(target = "viewerq.auth", "login complete");

	let credential = auth.credential();
	let result = ResultBuilder::new("auth login")
		.data(json!({
			"phase": format!("{:?}", auth.phase()),
			"scopes": credential.scopes,
			"accessToken": mask(&credential.access_token),
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

pub async fn refresh(ctx: &CommandContext) -> Result<()> {
	let auth = ctx.authenticator(EventBus::default(), true)?;
	let token = auth.refresh().await?;

	let result = ResultBuilder::new("auth refresh")
		.data(json!({ "accessToken": mask(&token) }))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

/// Checks the stored token; no request is made when there is none.
pub async fn validate(ctx: &CommandContext) -> Result<()> {
	let config = ctx.store.snapshot();
	let valid = if config.access_token.trim().is_empty() {
		false
	} else {
		ctx.validator()?.is_valid(&config.access_token).await
	};

	let result = ResultBuilder::new("auth validate")
		.data(json!({
			"valid": valid,
			"hasToken": !config.access_token.trim().is_empty(),
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

pub fn show(ctx: &CommandContext) -> Result<()> {
	let config = ctx.store.snapshot();
	let result = ResultBuilder::new("auth show")
		.data(json!({
			"clientId": config.client_id,
			"clientSecret": mask(&config.client_secret),
			"accessToken": mask(&config.access_token),
			"refreshToken": mask(&config.refresh_token),
			"redirectUri": config.redirect_uri,
			"scopes": config.scopes,
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}
