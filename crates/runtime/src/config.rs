//! Persisted application record.
//!
//! The file is JSON with camelCase keys. Loading never fails: a missing,
//! partial or malformed file falls back to defaults field by field and logs a
//! warning. Saving writes a sibling temp file and renames it over the
//! original so readers never observe a half-written record.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use viewerq::SortOption;

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "VIEWERQ_CONFIG";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";
pub const DEFAULT_CALLBACK_PORT: u16 = 8080;

fn default_scopes() -> Vec<String> {
	vec!["chat:read".into(), "chat:edit".into()]
}

/// Everything the process reads from (and writes back to) the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
	pub access_token: String,
	pub refresh_token: String,
	pub client_id: String,
	pub client_secret: String,
	#[serde(alias = "redirectURI")]
	pub redirect_uri: String,
	pub scopes: Vec<String>,
	pub channel: String,
	/// Login used for `NICK`; the channel name when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bot_login: Option<String>,
	#[serde(deserialize_with = "lenient_sort_option")]
	pub sort_option: SortOption,
	/// Loopback port for the OAuth redirect; derived from `redirectUri` when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub callback_port: Option<u16>,
	pub provider: ProviderConfig,
	pub timeouts: TimeoutConfig,
	pub supervisor: SupervisorConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			access_token: String::new(),
			refresh_token: String::new(),
			client_id: String::new(),
			client_secret: String::new(),
			redirect_uri: DEFAULT_REDIRECT_URI.into(),
			scopes: default_scopes(),
			channel: String::new(),
			bot_login: None,
			sort_option: SortOption::default(),
			callback_port: None,
			provider: ProviderConfig::default(),
			timeouts: TimeoutConfig::default(),
			supervisor: SupervisorConfig::default(),
		}
	}
}

impl AppConfig {
	/// Port the callback listener binds.
	pub fn effective_callback_port(&self) -> u16 {
		self.callback_port
			.or_else(|| url::Url::parse(&self.redirect_uri).ok().and_then(|u| u.port_or_known_default()))
			.unwrap_or(DEFAULT_CALLBACK_PORT)
	}

	/// `botLogin`, else the channel name without its `#`.
	pub fn nick(&self) -> &str {
		self.bot_login
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.unwrap_or_else(|| self.channel.trim().trim_start_matches('#'))
	}
}

/// Base URLs of the OAuth provider, the API and the chat gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
	pub auth_base_url: String,
	pub api_base_url: String,
	pub chat_url: String,
}

impl Default for ProviderConfig {
	fn default() -> Self {
		Self {
			auth_base_url: "https://id.twitch.tv".into(),
			api_base_url: "https://api.twitch.tv".into(),
			chat_url: "wss://irc-ws.chat.twitch.tv:443".into(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutConfig {
	pub http_secs: u64,
	pub validate_secs: u64,
	pub callback_secs: u64,
}

impl Default for TimeoutConfig {
	fn default() -> Self {
		Self {
			http_secs: 10,
			validate_secs: 5,
			callback_secs: 120,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupervisorConfig {
	pub max_restarts: u32,
	pub backoff_ms: u64,
	pub token_poll_ms: u64,
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		Self {
			max_restarts: 3,
			backoff_ms: 2000,
			token_poll_ms: 2000,
		}
	}
}

/// Accepts the kebab-case name, or the combo-box index older builds stored.
/// Anything else falls back to the default ordering.
fn lenient_sort_option<'de, D>(deserializer: D) -> Result<SortOption, D::Error>
where
	D: Deserializer<'de>,
{
	let value = serde_json::Value::deserialize(deserializer)?;
	let option = match &value {
		serde_json::Value::String(name) => name.parse().ok(),
		serde_json::Value::Number(n) => n
			.as_u64()
			.and_then(|index| SortOption::ALL.get(index as usize).copied()),
		_ => None,
	};
	Ok(option.unwrap_or_else(|| {
		warn!(target = "viewerq.config", %value, "unknown sort option, using default");
		SortOption::default()
	}))
}

/// Shared handle to the config file.
#[derive(Debug)]
pub struct ConfigStore {
	path: Option<PathBuf>,
	current: RwLock<AppConfig>,
	write_lock: Mutex<()>,
}

impl ConfigStore {
	/// `<config dir>/viewerq/config.json`, or `config.json` in the working
	/// directory when the platform has no config dir.
	pub fn default_path() -> PathBuf {
		dirs::config_dir()
			.map(|dir| dir.join("viewerq").join("config.json"))
			.unwrap_or_else(|| PathBuf::from("config.json"))
	}

	/// Explicit path, then `VIEWERQ_CONFIG`, then [`ConfigStore::default_path`].
	pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
		explicit
			.map(Path::to_path_buf)
			.or_else(|| std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
			.unwrap_or_else(Self::default_path)
	}

	pub fn load(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let config = read_config(&path);
		Self {
			path: Some(path),
			current: RwLock::new(config),
			write_lock: Mutex::new(()),
		}
	}

	/// Store that never touches disk.
	pub fn in_memory(config: AppConfig) -> Self {
		Self {
			path: None,
			current: RwLock::new(config),
			write_lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn snapshot(&self) -> AppConfig {
		self.current.read().clone()
	}

	/// Applies `mutate` and writes the result. The in-memory record is only
	/// replaced once the write succeeded.
	pub fn update(&self, mutate: impl FnOnce(&mut AppConfig)) -> Result<AppConfig, ConfigError> {
		let _guard = self.write_lock.lock();
		let mut next = self.current.read().clone();
		mutate(&mut next);
		if let Some(path) = &self.path {
			write_atomic(path, &next)?;
		}
		*self.current.write() = next.clone();
		Ok(next)
	}
}

fn read_config(path: &Path) -> AppConfig {
	let content = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			debug!(target = "viewerq.config", path = %path.display(), "no config file, using defaults");
			return AppConfig::default();
		}
		Err(err) => {
			warn!(target = "viewerq.config", path = %path.display(), error = %err, "config unreadable, using defaults");
			return AppConfig::default();
		}
	};
	match serde_json::from_str(&content) {
		Ok(config) => config,
		Err(err) => {
			warn!(target = "viewerq.config", path = %path.display(), error = %err, "config malformed, using defaults");
			AppConfig::default()
		}
	}
}

fn write_atomic(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
	let io_err = |source| ConfigError::Write {
		path: path.to_path_buf(),
		source,
	};
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(io_err)?;
	}
	let json = serde_json::to_string_pretty(config)?;
	let tmp = path.with_extension("json.tmp");
	fs::write(&tmp, json).map_err(io_err)?;
	fs::rename(&tmp, path).map_err(io_err)?;
	debug!(target = "viewerq.config", path = %path.display(), "config saved");
	Ok(())
}
