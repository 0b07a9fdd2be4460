use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to write config {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to serialize config: {0}")]
	Serialize(#[from] serde_json::Error),
}

/// Failures of the authorization-code and refresh flows.
///
/// Every variant other than [`AuthError::InProgress`] is a permanent failure
/// for the attempt that produced it.
#[derive(Debug, Error)]
pub enum AuthError {
	#[error("an authorization flow is already in progress")]
	InProgress,

	#[error("missing credential field: {0}")]
	MissingCredential(&'static str),

	#[error("callback listener could not bind 127.0.0.1:{port}: {source}")]
	ListenerBind {
		port: u16,
		#[source]
		source: std::io::Error,
	},

	#[error("no authorization callback received within {secs}s")]
	CallbackTimeout { secs: u64 },

	#[error("callback listener stopped before a code arrived")]
	ListenerClosed,

	#[error("invalid authorize URL: {0}")]
	AuthorizeUrl(#[from] url::ParseError),

	#[error("token request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("token endpoint rejected the request ({status}): {message}")]
	Rejected { status: u16, message: String },

	#[error("token response is missing `{0}`")]
	MissingField(&'static str),

	#[error("malformed token response: {0}")]
	MalformedResponse(String),

	#[error("failed to persist tokens: {0}")]
	Persist(#[from] ConfigError),
}

impl AuthError {
	pub fn is_in_progress(&self) -> bool {
		matches!(self, AuthError::InProgress)
	}
}

#[derive(Debug, Error)]
pub enum ChatError {
	#[error("chat transport error: {0}")]
	Transport(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("no channel configured")]
	MissingChannel,

	#[error("chat connection closed by server")]
	Closed,
}
