//! Session runtime: configuration, OAuth, token liveness, the chat session
//! and the supervisor that keeps it alive.

pub mod auth;
pub mod chat;
pub mod config;
pub mod credential;
pub mod error;
pub mod supervisor;
pub mod validator;

pub use auth::{AuthPhase, AuthSettings, Authenticator, BrowserOpener, CallbackListener, NoBrowser, SessionAuthenticator, SystemBrowser};
pub use chat::{ChatSettings, TwitchChat};
pub use config::{AppConfig, ConfigStore};
pub use credential::{Credential, CredentialStore};
pub use error::{AuthError, ChatError, ConfigError};
pub use supervisor::{
	ChatConnector, ConnectionAttempt, ConnectionSupervisor, DisconnectCause, RestartPolicy, SessionReporter, StopHandle,
	SupervisorOutcome, SupervisorState,
};
pub use validator::{HelixValidator, TokenValidator};
