use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use viewerq::EventBus;
use viewerq_runtime::{AuthError, AuthSettings, ConfigStore, HelixValidator, NoBrowser, SessionAuthenticator};

use crate::cli::Cli;
use crate::error::Result;
use crate::output::OutputFormat;

/// Shared state handed to every command.
pub struct CommandContext {
	pub format: OutputFormat,
	pub config_path: PathBuf,
	pub store: Arc<ConfigStore>,
}

impl CommandContext {
	pub fn new(cli: &Cli) -> Self {
		let config_path = ConfigStore::resolve_path(cli.config.as_deref());
		debug!(target = "viewerq.config", path = %config_path.display(), "using config file");
		let store = Arc::new(ConfigStore::load(config_path.clone()));
		Self {
			format: cli.format,
			config_path,
			store,
		}
	}

	/// Authenticator over the config store, publishing on `bus`.
	pub fn authenticator(&self, bus: EventBus, no_browser: bool) -> Result<SessionAuthenticator> {
		let settings = AuthSettings::from_config(&self.store.snapshot());
		let auth = SessionAuthenticator::new(self.store.clone(), settings, bus)?;
		Ok(if no_browser {
			auth.with_browser(Arc::new(NoBrowser))
		} else {
			auth
		})
	}

	pub fn validator(&self) -> Result<HelixValidator> {
		let config = self.store.snapshot();
		HelixValidator::new(
			&config.provider.api_base_url,
			config.client_id.clone(),
			Duration::from_secs(config.timeouts.validate_secs),
		)
		.map_err(|err| AuthError::Http(err).into())
	}
}
