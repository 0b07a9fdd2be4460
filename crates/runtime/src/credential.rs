use std::fmt;

use crate::config::{AppConfig, ConfigStore};
use crate::error::ConfigError;

/// OAuth client registration plus the current token pair.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
	pub access_token: String,
	pub refresh_token: String,
	pub client_id: String,
	pub client_secret: String,
	pub redirect_uri: String,
	pub scopes: Vec<String>,
	pub channel: String,
}

impl Credential {
	pub fn from_config(config: &AppConfig) -> Self {
		Self {
			access_token: config.access_token.clone(),
			refresh_token: config.refresh_token.clone(),
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			redirect_uri: config.redirect_uri.clone(),
			scopes: config.scopes.clone(),
			channel: config.channel.clone(),
		}
	}

	pub fn has_access_token(&self) -> bool {
		!self.access_token.trim().is_empty()
	}
}

/// Shows the first four characters of a secret.
pub fn mask(secret: &str) -> String {
	if secret.is_empty() {
		return String::new();
	}
	let visible: String = secret.chars().take(4).collect();
	format!("{visible}…")
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credential")
			.field("access_token", &mask(&self.access_token))
			.field("refresh_token", &mask(&self.refresh_token))
			.field("client_id", &self.client_id)
			.field("client_secret", &mask(&self.client_secret))
			.field("redirect_uri", &self.redirect_uri)
			.field("scopes", &self.scopes)
			.field("channel", &self.channel)
			.finish()
	}
}

/// Where the authenticator reads its starting credential and writes new tokens.
pub trait CredentialStore: Send + Sync {
	fn load_credential(&self) -> Credential;

	fn persist_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), ConfigError>;
}

impl CredentialStore for ConfigStore {
	fn load_credential(&self) -> Credential {
		Credential::from_config(&self.snapshot())
	}

	fn persist_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), ConfigError> {
		self.update(|config| {
			config.access_token = access_token.to_string();
			config.refresh_token = refresh_token.to_string();
		})
		.map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_output_masks_secrets() {
		let credential = Credential {
			access_token: "abcdefgh".into(),
			client_secret: "s3cr3t-value".into(),
			..Credential::default()
		};
		let rendered = format!("{credential:?}");
		assert!(!rendered.contains("abcdefgh"));
		assert!(!rendered.contains("s3cr3t-value"));
		assert!(rendered.contains("abcd…"));
	}

	#[test]
	fn config_store_persists_token_pair() {
		let store = ConfigStore::in_memory(AppConfig {
			client_id: "cid".into(),
			..AppConfig::default()
		});
		store.persist_tokens("new-access", "new-refresh").unwrap();
		let credential = store.load_credential();
		assert_eq!(credential.access_token, "new-access");
		assert_eq!(credential.refresh_token, "new-refresh");
		assert_eq!(credential.client_id, "cid");
	}
}
