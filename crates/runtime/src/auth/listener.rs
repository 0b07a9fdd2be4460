//! Single-use loopback listener for the OAuth redirect.
//!
//! Accepts exactly one `GET /?code=...`. Requests without a code get a 400
//! and leave the caller waiting; only the fail-safe timeout ends that wait.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{Method, StatusCode};
use axum::routing::any;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AuthError;

const SUCCESS_BODY: &str = "Authorization successful. You can close this window now.";
const FAILURE_BODY: &str = "Authorization failed.";

#[derive(Clone)]
struct CallbackState {
	code_tx: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

pub struct CallbackListener {
	addr: SocketAddr,
	code_rx: oneshot::Receiver<String>,
	shutdown_tx: Option<oneshot::Sender<()>>,
	server: JoinHandle<()>,
}

impl CallbackListener {
	/// Binds `127.0.0.1:<port>` and starts serving. Port 0 picks a free port.
	pub async fn bind(port: u16) -> Result<Self, AuthError> {
		let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
			.await
			.map_err(|source| AuthError::ListenerBind { port, source })?;
		let addr = listener
			.local_addr()
			.map_err(|source| AuthError::ListenerBind { port, source })?;

		let (code_tx, code_rx) = oneshot::channel();
		let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
		let state = CallbackState {
			code_tx: Arc::new(Mutex::new(Some(code_tx))),
		};
		let app = Router::new()
			.route("/", any(handle_callback))
			.fallback(reject)
			.with_state(state);

		let server = tokio::spawn(async move {
			let shutdown = async {
				let _ = shutdown_rx.await;
			};
			if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
				warn!(target = "viewerq.auth", error = %err, "callback listener failed");
			}
		});
		debug!(target = "viewerq.auth", %addr, "callback listener started");

		Ok(Self {
			addr,
			code_rx,
			shutdown_tx: Some(shutdown_tx),
			server,
		})
	}

	pub fn local_addr(&self) -> SocketAddr {
		self.addr
	}

	/// Waits for the first callback carrying a code, then shuts the listener down.
	pub async fn wait_for_code(mut self, timeout: Duration) -> Result<String, AuthError> {
		let result = match tokio::time::timeout(timeout, &mut self.code_rx).await {
			Ok(Ok(code)) => Ok(code),
			Ok(Err(_)) => Err(AuthError::ListenerClosed),
			Err(_) => Err(AuthError::CallbackTimeout { secs: timeout.as_secs() }),
		};
		self.close().await;
		result
	}

	/// Graceful shutdown, forced after a short grace period.
	pub async fn close(mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(());
		}
		if tokio::time::timeout(Duration::from_secs(2), &mut self.server).await.is_err() {
			self.server.abort();
		}
		debug!(target = "viewerq.auth", addr = %self.addr, "callback listener stopped");
	}
}

impl Drop for CallbackListener {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(());
			self.server.abort();
		}
	}
}

async fn handle_callback(
	State(state): State<CallbackState>,
	method: Method,
	RawQuery(query): RawQuery,
) -> (StatusCode, &'static str) {
	if method != Method::GET {
		return (StatusCode::BAD_REQUEST, FAILURE_BODY);
	}
	let code = query.as_deref().and_then(|q| {
		url::form_urlencoded::parse(q.as_bytes())
			.find(|(key, _)| key == "code")
			.map(|(_, value)| value.into_owned())
			.filter(|value| !value.is_empty())
	});
	let Some(code) = code else {
		debug!(target = "viewerq.auth", "callback without code");
		return (StatusCode::BAD_REQUEST, FAILURE_BODY);
	};
	let Some(tx) = state.code_tx.lock().take() else {
		debug!(target = "viewerq.auth", "callback after code was already captured");
		return (StatusCode::BAD_REQUEST, FAILURE_BODY);
	};
	match tx.send(code) {
		Ok(()) => (StatusCode::OK, SUCCESS_BODY),
		Err(_) => (StatusCode::BAD_REQUEST, FAILURE_BODY),
	}
}

async fn reject() -> (StatusCode, &'static str) {
	(StatusCode::BAD_REQUEST, FAILURE_BODY)
}
