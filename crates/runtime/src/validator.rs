//! Token liveness probe.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Single liveness check of an access token.
///
/// Network failures and unexpected statuses both mean "not valid"; callers
/// decide what to do about it.
#[async_trait]
pub trait TokenValidator: Send + Sync {
	async fn is_valid(&self, token: &str) -> bool;
}

/// Validates against the Helix `users` endpoint.
#[derive(Debug, Clone)]
pub struct HelixValidator {
	client: reqwest::Client,
	endpoint: String,
	client_id: String,
}

impl HelixValidator {
	pub fn new(api_base_url: &str, client_id: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			endpoint: format!("{}/helix/users", api_base_url.trim_end_matches('/')),
			client_id: client_id.into(),
		})
	}
}

#[async_trait]
impl TokenValidator for HelixValidator {
	async fn is_valid(&self, token: &str) -> bool {
		if token.trim().is_empty() {
			return false;
		}
		let response = self
			.client
			.get(&self.endpoint)
			.bearer_auth(token)
			.header("Client-Id", &self.client_id)
			.send()
			.await;
		match response {
			Ok(r) => {
				let status = r.status();
				debug!(target = "viewerq.auth", %status, "token validation response");
				status == reqwest::StatusCode::OK
			}
			Err(err) => {
				debug!(target = "viewerq.auth", error = %err, "token validation request failed");
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use axum::Router;
	use axum::http::{HeaderMap, StatusCode};
	use axum::routing::get;

	async fn users(headers: HeaderMap) -> StatusCode {
		let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
		let client_id = headers.get("client-id").and_then(|v| v.to_str().ok());
		match (bearer, client_id) {
			(Some("Bearer good"), Some("cid")) => StatusCode::OK,
			(Some("Bearer flaky"), _) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::UNAUTHORIZED,
		}
	}

	async fn serve() -> String {
		let app = Router::new().route("/helix/users", get(users));
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{addr}")
	}

	#[tokio::test]
	async fn maps_statuses_to_validity() {
		let base = serve().await;
		let validator = HelixValidator::new(&base, "cid", Duration::from_secs(5)).unwrap();
		assert!(validator.is_valid("good").await);
		assert!(!validator.is_valid("expired").await);
		assert!(!validator.is_valid("flaky").await);
		assert!(!validator.is_valid("").await);
	}

	#[tokio::test]
	async fn unreachable_api_is_invalid() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);
		let validator = HelixValidator::new(&format!("http://{addr}"), "cid", Duration::from_millis(500)).unwrap();
		assert!(!validator.is_valid("good").await);
	}
}
