//! Keeps one chat session authenticated and alive.
//!
//! A run waits for a valid token, then starts session attempts one at a time,
//! each in its own spawned task. Auth-related disconnects trigger a refresh
//! and a bounded number of restarts; any other disconnect ends the run.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use viewerq::EventBus;

use crate::auth::Authenticator;
use crate::config::SupervisorConfig;
use crate::validator::TokenValidator;

const STOP_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
	/// Restarts allowed per run before giving up.
	pub max_restarts: u32,
	pub backoff: Duration,
	/// Interval between token checks while waiting for a usable credential.
	pub token_poll: Duration,
}

impl Default for RestartPolicy {
	fn default() -> Self {
		SupervisorConfig::default().into()
	}
}

impl From<SupervisorConfig> for RestartPolicy {
	fn from(config: SupervisorConfig) -> Self {
		Self {
			max_restarts: config.max_restarts,
			backoff: Duration::from_millis(config.backoff_ms),
			token_poll: Duration::from_millis(config.token_poll_ms),
		}
	}
}

/// Why a session attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
	/// Clean shutdown.
	None,
	/// The chat server rejected the credential.
	AuthError(String),
	OtherError(String),
}

impl fmt::Display for DisconnectCause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DisconnectCause::None => f.write_str("clean shutdown"),
			DisconnectCause::AuthError(reason) => write!(f, "authentication error: {reason}"),
			DisconnectCause::OtherError(reason) => f.write_str(reason),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
	Idle,
	WaitingForToken,
	Connecting,
	Connected,
	Disconnected(DisconnectCause),
	Exhausted,
	Terminated,
	Halted,
	Stopped,
}

impl SupervisorState {
	pub fn is_final(&self) -> bool {
		matches!(
			self,
			SupervisorState::Exhausted | SupervisorState::Terminated | SupervisorState::Halted | SupervisorState::Stopped
		)
	}
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
	Terminated,
	Exhausted { restarts: u32 },
	Halted(String),
	Stopped,
}

/// Bookkeeping for one session attempt.
#[derive(Debug, Clone)]
pub struct ConnectionAttempt {
	pub number: u32,
	pub started_at: Instant,
	pub ended_at: Option<Instant>,
	pub cause: Option<DisconnectCause>,
}

impl ConnectionAttempt {
	fn start(number: u32) -> Self {
		Self {
			number,
			started_at: Instant::now(),
			ended_at: None,
			cause: None,
		}
	}

	fn finish(&mut self, cause: DisconnectCause) {
		self.ended_at = Some(Instant::now());
		self.cause = Some(cause);
	}

	pub fn duration(&self) -> Option<Duration> {
		self.ended_at.map(|end| end.duration_since(self.started_at))
	}
}

/// A chat session that runs until it disconnects.
#[async_trait]
pub trait ChatConnector: Send + Sync + 'static {
	async fn run_session(&self, token: String, reporter: SessionReporter) -> DisconnectCause;
}

/// Handed to each attempt so the session can announce progress.
#[derive(Clone)]
pub struct SessionReporter {
	state: Arc<watch::Sender<SupervisorState>>,
	bus: EventBus,
	stop: watch::Receiver<bool>,
}

impl SessionReporter {
	pub fn connected(&self) {
		self.state.send_replace(SupervisorState::Connected);
		self.bus.connection(true);
		info!(target = "viewerq.supervisor", "chat session connected");
	}

	pub fn info(&self, text: impl Into<String>) {
		self.bus.info(text);
	}

	pub fn warning(&self, text: impl Into<String>) {
		self.bus.warning(text);
	}

	/// Resolves once supervision is being stopped. The session then has a
	/// short grace period to leave cleanly before its task is aborted.
	pub async fn stopped(&self) {
		let mut stop = self.stop.clone();
		let _ = stop.wait_for(|stopped| *stopped).await;
	}
}

/// Requests a cooperative stop; an in-flight attempt is aborted.
#[derive(Clone)]
pub struct StopHandle {
	tx: Arc<watch::Sender<bool>>,
	halt_reason: Arc<Mutex<Option<String>>>,
}

impl StopHandle {
	pub fn stop(&self) {
		self.tx.send_replace(true);
	}

	/// Stops the run so that it ends as [`SupervisorOutcome::Halted`]. Used
	/// when a failure outside the supervisor leaves no way to get a token.
	/// The reason is not republished; the caller has already reported it.
	pub fn halt(&self, reason: impl Into<String>) {
		self.halt_reason.lock().get_or_insert_with(|| reason.into());
		self.stop();
	}
}

pub struct ConnectionSupervisor {
	validator: Arc<dyn TokenValidator>,
	auth: Arc<dyn Authenticator>,
	connector: Arc<dyn ChatConnector>,
	policy: RestartPolicy,
	bus: EventBus,
	state: Arc<watch::Sender<SupervisorState>>,
	stop: Arc<watch::Sender<bool>>,
	halt_reason: Arc<Mutex<Option<String>>>,
}

impl ConnectionSupervisor {
	pub fn new(
		validator: Arc<dyn TokenValidator>,
		auth: Arc<dyn Authenticator>,
		connector: Arc<dyn ChatConnector>,
		policy: RestartPolicy,
		bus: EventBus,
	) -> Self {
		let (state, _) = watch::channel(SupervisorState::Idle);
		let (stop, _) = watch::channel(false);
		Self {
			validator,
			auth,
			connector,
			policy,
			bus,
			state: Arc::new(state),
			stop: Arc::new(stop),
			halt_reason: Arc::default(),
		}
	}

	pub fn state(&self) -> watch::Receiver<SupervisorState> {
		self.state.subscribe()
	}

	pub fn stop_handle(&self) -> StopHandle {
		StopHandle {
			tx: Arc::clone(&self.stop),
			halt_reason: Arc::clone(&self.halt_reason),
		}
	}

	/// Supervises until the run terminates, exhausts its restarts, halts on
	/// an auth failure, or is stopped. The restart counter starts at zero on
	/// every call.
	pub async fn run(&self) -> SupervisorOutcome {
		let mut stop_rx = self.stop.subscribe();
		let outcome = match self.supervise(&mut stop_rx).await {
			SupervisorOutcome::Stopped => match self.halt_reason.lock().clone() {
				Some(reason) => SupervisorOutcome::Halted(reason),
				None => SupervisorOutcome::Stopped,
			},
			outcome => outcome,
		};
		let state = match &outcome {
			SupervisorOutcome::Terminated => SupervisorState::Terminated,
			SupervisorOutcome::Exhausted { .. } => SupervisorState::Exhausted,
			SupervisorOutcome::Halted(_) => SupervisorState::Halted,
			SupervisorOutcome::Stopped => SupervisorState::Stopped,
		};
		self.set_state(state);
		info!(target = "viewerq.supervisor", ?outcome, "supervision ended");
		outcome
	}

	async fn supervise(&self, stop_rx: &mut watch::Receiver<bool>) -> SupervisorOutcome {
		let mut token = match self.wait_for_token(stop_rx).await {
			Ok(token) => token,
			Err(outcome) => return outcome,
		};
		let mut restarts = 0u32;
		let mut number = 0u32;

		loop {
			number += 1;
			self.set_state(SupervisorState::Connecting);
			self.bus.info("Connecting to chat...");
			let mut attempt = ConnectionAttempt::start(number);
			info!(target = "viewerq.supervisor", attempt = number, restarts, "starting session attempt");

			let Some(cause) = self.run_attempt(token.clone(), stop_rx).await else {
				self.bus.connection(false);
				return SupervisorOutcome::Stopped;
			};
			attempt.finish(cause.clone());
			self.bus.connection(false);
			self.set_state(SupervisorState::Disconnected(cause.clone()));
			debug!(
				target = "viewerq.supervisor",
				attempt = attempt.number,
				elapsed_ms = attempt.duration().map(|d| d.as_millis() as u64).unwrap_or(0),
				%cause,
				"session attempt ended"
			);

			match cause {
				DisconnectCause::AuthError(reason) => {
					warn!(target = "viewerq.supervisor", %reason, "chat rejected the token");
					self.bus.info("Detected invalid or expired token. Attempting token refresh...");
					token = match self.auth.refresh().await {
						Ok(token) => token,
						Err(err) => return self.halt(format!("Failed to refresh tokens: {err}")),
					};
					restarts += 1;
					if restarts >= self.policy.max_restarts {
						warn!(target = "viewerq.supervisor", restarts, "restart limit reached");
						self.bus.warning(format!(
							"Chat connection failed {restarts} times in a row. Restart the bot manually."
						));
						return SupervisorOutcome::Exhausted { restarts };
					}
					if !self.pause(self.policy.backoff, stop_rx).await {
						return SupervisorOutcome::Stopped;
					}
				}
				DisconnectCause::OtherError(reason) => {
					warn!(target = "viewerq.supervisor", %reason, "chat session failed");
					self.bus.warning(format!("Bot disconnected: {reason}"));
					return SupervisorOutcome::Terminated;
				}
				DisconnectCause::None => {
					self.bus.info("Bot disconnected");
					return SupervisorOutcome::Terminated;
				}
			}
		}
	}

	async fn wait_for_token(&self, stop_rx: &mut watch::Receiver<bool>) -> Result<String, SupervisorOutcome> {
		self.set_state(SupervisorState::WaitingForToken);
		let mut announced_missing = false;

		loop {
			if *stop_rx.borrow() {
				return Err(SupervisorOutcome::Stopped);
			}
			match self.auth.access_token() {
				Some(token) => {
					if self.validator.is_valid(&token).await {
						self.bus.info("Token is valid");
						return Ok(token);
					}
					self.bus.info("Token invalid or expired, refreshing...");
					if let Err(err) = self.auth.refresh().await {
						return Err(self.halt(format!("Failed to refresh tokens: {err}")));
					}
				}
				None if !announced_missing => {
					announced_missing = true;
					info!(target = "viewerq.supervisor", "no token yet");
					self.bus.info("No token found. Waiting for authorization...");
				}
				None => {}
			}
			if !self.pause(self.policy.token_poll, stop_rx).await {
				return Err(SupervisorOutcome::Stopped);
			}
		}
	}

	/// `None` when the attempt was aborted by a stop request.
	async fn run_attempt(&self, token: String, stop_rx: &mut watch::Receiver<bool>) -> Option<DisconnectCause> {
		let connector = Arc::clone(&self.connector);
		let reporter = SessionReporter {
			state: Arc::clone(&self.state),
			bus: self.bus.clone(),
			stop: stop_rx.clone(),
		};
		let mut task = tokio::spawn(async move { connector.run_session(token, reporter).await });

		let outcome = tokio::select! {
			joined = &mut task => Some(match joined {
				Ok(cause) => cause,
				Err(err) => DisconnectCause::OtherError(format!("session task failed: {err}")),
			}),
			_ = stop_rx.wait_for(|stopped| *stopped) => None,
		};
		if outcome.is_none() && tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
			task.abort();
		}
		outcome
	}

	/// Sleeps for `duration`; `false` if a stop was requested meanwhile.
	async fn pause(&self, duration: Duration, stop_rx: &mut watch::Receiver<bool>) -> bool {
		let slept = tokio::select! {
			_ = tokio::time::sleep(duration) => true,
			_ = stop_rx.wait_for(|stopped| *stopped) => false,
		};
		slept && !*stop_rx.borrow()
	}

	fn halt(&self, reason: String) -> SupervisorOutcome {
		warn!(target = "viewerq.supervisor", %reason, "supervision halted");
		self.bus.fatal(reason.clone());
		SupervisorOutcome::Halted(reason)
	}

	fn set_state(&self, state: SupervisorState) {
		debug!(target = "viewerq.supervisor", ?state, "state");
		self.state.send_replace(state);
	}
}
