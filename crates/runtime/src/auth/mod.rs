//! OAuth session authentication.
//!
//! [`SessionAuthenticator`] runs the authorization-code flow (browser
//! redirect, loopback listener, token POST) and the refresh flow, owns the
//! current [`Credential`] and persists every new token pair through a
//! [`CredentialStore`]. Both flows share one async flow guard: a second
//! authorization is rejected immediately, a refresh waits its turn.

mod browser;
mod listener;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use viewerq::EventBus;
use viewerq_protocol::{AuthorizationCodeGrant, RefreshTokenGrant, TokenErrorBody, TokenResponse};

pub use browser::{BrowserOpener, NoBrowser, SystemBrowser};
pub use listener::CallbackListener;

use crate::config::AppConfig;
use crate::supervisor::StopHandle;
use crate::credential::{Credential, CredentialStore};
use crate::error::AuthError;

/// Progress of the authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
	Idle,
	AwaitingRedirect,
	CodeReceived,
	ExchangingToken,
	Authorized,
	Failed,
}

impl AuthPhase {
	fn describe(self) -> &'static str {
		match self {
			AuthPhase::Idle => "Authorization idle",
			AuthPhase::AwaitingRedirect => "Waiting for Twitch authorization...",
			AuthPhase::CodeReceived => "Authorization code received",
			AuthPhase::ExchangingToken => "Exchanging code for token...",
			AuthPhase::Authorized => "Twitch authentication successful!",
			AuthPhase::Failed => "Twitch authentication failed",
		}
	}

	/// Phases operators hear about. `CodeReceived` is immediately followed
	/// by `ExchangingToken`, and `Failed` is reported as a Fatal instead.
	fn announced(self) -> bool {
		!matches!(self, AuthPhase::CodeReceived | AuthPhase::Failed)
	}
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
	pub auth_base_url: String,
	pub callback_port: u16,
	pub callback_timeout: Duration,
	pub http_timeout: Duration,
}

impl AuthSettings {
	pub fn from_config(config: &AppConfig) -> Self {
		Self {
			auth_base_url: config.provider.auth_base_url.trim_end_matches('/').to_string(),
			callback_port: config.effective_callback_port(),
			callback_timeout: Duration::from_secs(config.timeouts.callback_secs),
			http_timeout: Duration::from_secs(config.timeouts.http_secs),
		}
	}
}

/// What the connection supervisor needs from an authenticator.
#[async_trait]
pub trait Authenticator: Send + Sync {
	/// Current access token, if any.
	fn access_token(&self) -> Option<String>;

	/// Trades the refresh token for a new access token.
	async fn refresh(&self) -> Result<String, AuthError>;
}

pub struct SessionAuthenticator {
	credential: RwLock<Credential>,
	store: Arc<dyn CredentialStore>,
	settings: AuthSettings,
	client: reqwest::Client,
	browser: Arc<dyn BrowserOpener>,
	bus: EventBus,
	phase: watch::Sender<AuthPhase>,
	flow: Mutex<()>,
}

impl SessionAuthenticator {
	pub fn new(store: Arc<dyn CredentialStore>, settings: AuthSettings, bus: EventBus) -> Result<Self, AuthError> {
		let client = reqwest::Client::builder().timeout(settings.http_timeout).build()?;
		let credential = store.load_credential();
		let (phase, _) = watch::channel(AuthPhase::Idle);
		Ok(Self {
			credential: RwLock::new(credential),
			store,
			settings,
			client,
			browser: Arc::new(SystemBrowser),
			bus,
			phase,
			flow: Mutex::new(()),
		})
	}

	pub fn with_browser(mut self, browser: Arc<dyn BrowserOpener>) -> Self {
		self.browser = browser;
		self
	}

	pub fn phase(&self) -> AuthPhase {
		*self.phase.borrow()
	}

	pub fn subscribe_phase(&self) -> watch::Receiver<AuthPhase> {
		self.phase.subscribe()
	}

	pub fn credential(&self) -> Credential {
		self.credential.read().clone()
	}

	pub fn access_token(&self) -> Option<String> {
		let credential = self.credential.read();
		credential.has_access_token().then(|| credential.access_token.clone())
	}

	/// Client registration is present, so a flow can be attempted.
	pub fn has_credentials(&self) -> bool {
		let credential = self.credential.read();
		!credential.client_id.is_empty() && !credential.client_secret.is_empty()
	}

	/// `<auth base>/oauth2/authorize` with client id, redirect URI and scopes.
	pub fn authorize_url(&self) -> Result<Url, AuthError> {
		let credential = self.credential.read();
		let mut url = Url::parse(&format!("{}/oauth2/authorize", self.settings.auth_base_url))?;
		url.query_pairs_mut()
			.append_pair("client_id", &credential.client_id)
			.append_pair("response_type", "code")
			.append_pair("redirect_uri", &credential.redirect_uri)
			.append_pair("scope", &credential.scopes.join(" "));
		Ok(url)
	}

	/// Runs the full authorization-code flow.
	///
	/// # Errors
	///
	/// [`AuthError::InProgress`] if another flow holds the guard; any other
	/// error leaves the authenticator in [`AuthPhase::Failed`].
	pub async fn start_authorization(&self) -> Result<(), AuthError> {
		let _guard = self.flow.try_lock().map_err(|_| AuthError::InProgress)?;
		let result = self.authorize().await;
		if let Err(err) = &result {
			warn!(target = "viewerq.auth", error = %err, "authorization failed");
			self.set_phase(AuthPhase::Failed);
			self.bus.fatal(format!("Twitch authorization failed: {err}"));
		}
		result
	}

	/// Runs [`SessionAuthenticator::start_authorization`] on its own task.
	/// A failure halts the supervision behind `stop`, since no token will
	/// arrive; a flow already in progress is left to finish.
	pub fn authorize_in_background(self: &Arc<Self>, stop: StopHandle) -> JoinHandle<()> {
		let auth = Arc::clone(self);
		tokio::spawn(async move {
			match auth.start_authorization().await {
				Ok(()) => {}
				Err(err) if err.is_in_progress() => {
					debug!(target = "viewerq.auth", "authorization already running");
				}
				Err(err) => stop.halt(format!("Twitch authorization failed: {err}")),
			}
		})
	}

	async fn authorize(&self) -> Result<(), AuthError> {
		self.require_client()?;
		let url = self.authorize_url()?;
		let listener = CallbackListener::bind(self.settings.callback_port).await?;

		self.set_phase(AuthPhase::AwaitingRedirect);
		info!(target = "viewerq.auth", %url, addr = %listener.local_addr(), "starting authorization");
		if let Err(err) = self.browser.open(url.as_str()) {
			warn!(target = "viewerq.auth", error = %err, "could not open browser");
			self.bus.warning(format!("Open this URL to authorize: {url}"));
		}

		let code = listener.wait_for_code(self.settings.callback_timeout).await?;
		self.set_phase(AuthPhase::CodeReceived);

		self.set_phase(AuthPhase::ExchangingToken);
		let response = {
			let credential = self.credential.read().clone();
			let grant = AuthorizationCodeGrant::new(
				&credential.client_id,
				&credential.client_secret,
				&code,
				&credential.redirect_uri,
			);
			self.request_tokens(&grant).await?
		};
		let access_token = non_empty(response.access_token).ok_or(AuthError::MissingField("access_token"))?;
		let refresh_token = non_empty(response.refresh_token).ok_or(AuthError::MissingField("refresh_token"))?;

		self.apply_tokens(access_token, refresh_token);
		self.persist_or_warn();
		self.set_phase(AuthPhase::Authorized);
		Ok(())
	}

	/// Trades the stored refresh token for a new access token.
	///
	/// Waits for an in-flight flow to finish first. The refresh token is kept
	/// when the provider does not rotate it. Failures are returned, not
	/// published; the caller decides how to surface them.
	pub async fn refresh(&self) -> Result<String, AuthError> {
		let _guard = self.flow.lock().await;
		self.require_client()?;
		let credential = self.credential.read().clone();
		if credential.refresh_token.is_empty() {
			return Err(AuthError::MissingCredential("refreshToken"));
		}

		let grant = RefreshTokenGrant::new(&credential.refresh_token, &credential.client_id, &credential.client_secret);
		let response = self.request_tokens(&grant).await?;
		let access_token = non_empty(response.access_token).ok_or(AuthError::MissingField("access_token"))?;
		let refresh_token = non_empty(response.refresh_token).unwrap_or(credential.refresh_token);

		self.apply_tokens(access_token.clone(), refresh_token);
		self.persist_or_warn();
		info!(target = "viewerq.auth", "token refresh successful");
		self.bus.info("Token refresh successful!");
		Ok(access_token)
	}

	/// Replaces the token pair with manually entered values and persists it.
	pub fn set_tokens(&self, access_token: impl Into<String>, refresh_token: impl Into<String>) -> Result<(), AuthError> {
		self.apply_tokens(access_token.into(), refresh_token.into());
		self.persist()
	}

	/// Writes the current token pair through the credential store.
	pub fn persist(&self) -> Result<(), AuthError> {
		let (access, refresh) = {
			let credential = self.credential.read();
			(credential.access_token.clone(), credential.refresh_token.clone())
		};
		self.store.persist_tokens(&access, &refresh)?;
		debug!(target = "viewerq.auth", "tokens persisted");
		Ok(())
	}

	fn persist_or_warn(&self) {
		if let Err(err) = self.persist() {
			warn!(target = "viewerq.auth", error = %err, "token persistence failed");
			self.bus.warning(format!("New tokens could not be saved: {err}"));
		}
	}

	fn apply_tokens(&self, access_token: String, refresh_token: String) {
		let mut credential = self.credential.write();
		credential.access_token = access_token;
		credential.refresh_token = refresh_token;
	}

	fn require_client(&self) -> Result<(), AuthError> {
		let credential = self.credential.read();
		if credential.client_id.is_empty() {
			return Err(AuthError::MissingCredential("clientId"));
		}
		if credential.client_secret.is_empty() {
			return Err(AuthError::MissingCredential("clientSecret"));
		}
		Ok(())
	}

	async fn request_tokens<T: Serialize + ?Sized>(&self, form: &T) -> Result<TokenResponse, AuthError> {
		let url = format!("{}/oauth2/token", self.settings.auth_base_url);
		let response = self.client.post(&url).form(form).send().await?;
		let status = response.status();
		let body = response.text().await?;
		debug!(target = "viewerq.auth", %status, "token endpoint responded");

		if !status.is_success() {
			let message = serde_json::from_str::<TokenErrorBody>(&body)
				.ok()
				.and_then(|b| b.summary())
				.unwrap_or_else(|| body.trim().to_string());
			return Err(AuthError::Rejected {
				status: status.as_u16(),
				message,
			});
		}
		serde_json::from_str(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))
	}

	fn set_phase(&self, phase: AuthPhase) {
		self.phase.send_replace(phase);
		debug!(target = "viewerq.auth", ?phase, "auth phase");
		if phase.announced() {
			self.bus.info(phase.describe());
		}
	}
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
	fn access_token(&self) -> Option<String> {
		SessionAuthenticator::access_token(self)
	}

	async fn refresh(&self) -> Result<String, AuthError> {
		SessionAuthenticator::refresh(self).await
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{AppConfig, ConfigStore};

	fn authenticator(config: AppConfig) -> SessionAuthenticator {
		let settings = AuthSettings::from_config(&config);
		let store = Arc::new(ConfigStore::in_memory(config));
		SessionAuthenticator::new(store, settings, EventBus::default()).unwrap()
	}

	#[test]
	fn authorize_url_carries_client_redirect_and_scopes() {
		let auth = authenticator(AppConfig {
			client_id: "cid".into(),
			..AppConfig::default()
		});
		let url = auth.authorize_url().unwrap();
		assert_eq!(url.host_str(), Some("id.twitch.tv"));
		assert_eq!(url.path(), "/oauth2/authorize");
		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
		assert_eq!(
			pairs,
			vec![
				("client_id".into(), "cid".into()),
				("response_type".into(), "code".into()),
				("redirect_uri".into(), "http://localhost:8080".into()),
				("scope".into(), "chat:read chat:edit".into()),
			]
		);
	}

	#[test]
	fn access_token_is_none_when_blank() {
		let auth = authenticator(AppConfig::default());
		assert_eq!(auth.access_token(), None);
		assert!(!auth.has_credentials());
		auth.set_tokens("tok", "ref").unwrap();
		assert_eq!(auth.access_token().as_deref(), Some("tok"));
	}

	#[tokio::test]
	async fn refresh_without_client_registration_fails_fast() {
		let auth = authenticator(AppConfig::default());
		assert!(matches!(auth.refresh().await, Err(AuthError::MissingCredential("clientId"))));
	}

	#[tokio::test]
	async fn refresh_without_refresh_token_fails_fast() {
		let auth = authenticator(AppConfig {
			client_id: "cid".into(),
			client_secret: "secret".into(),
			..AppConfig::default()
		});
		assert!(matches!(auth.refresh().await, Err(AuthError::MissingCredential("refreshToken"))));
	}
}
