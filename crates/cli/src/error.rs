use thiserror::Error;
use viewerq_runtime::{AuthError, ChatError, ConfigError};

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Chat(#[from] ChatError),

	#[error("supervision halted: {0}")]
	Halted(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Maps the error onto a stable code for the output envelope.
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::InvalidInput(_) => (ErrorCode::InvalidInput, None),
			CliError::Auth(err) => auth_code(err),
			CliError::Config(_) => (ErrorCode::ConfigError, None),
			CliError::Chat(ChatError::MissingChannel) => (ErrorCode::InvalidInput, None),
			CliError::Chat(_) => (ErrorCode::ChatError, None),
			CliError::Halted(_) => (ErrorCode::SupervisorHalted, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) | CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};
		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

fn auth_code(err: &AuthError) -> (ErrorCode, Option<serde_json::Value>) {
	match err {
		AuthError::InProgress => (ErrorCode::AuthInProgress, None),
		AuthError::CallbackTimeout { secs } => (ErrorCode::Timeout, Some(serde_json::json!({ "timeoutSecs": secs }))),
		AuthError::ListenerBind { port, .. } => (ErrorCode::IoError, Some(serde_json::json!({ "port": port }))),
		AuthError::Http(_) => (ErrorCode::NetworkError, None),
		AuthError::Rejected { status, .. } => (ErrorCode::AuthError, Some(serde_json::json!({ "status": status }))),
		AuthError::MissingCredential(field) | AuthError::MissingField(field) => {
			(ErrorCode::AuthError, Some(serde_json::json!({ "field": field })))
		}
		AuthError::Persist(_) => (ErrorCode::ConfigError, None),
		AuthError::ListenerClosed | AuthError::AuthorizeUrl(_) | AuthError::MalformedResponse(_) => {
			(ErrorCode::AuthError, None)
		}
	}
}
