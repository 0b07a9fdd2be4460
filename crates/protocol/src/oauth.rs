//! OAuth 2.0 token endpoint wire types.

use serde::{Deserialize, Serialize};

/// Form body for the `authorization_code` grant.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationCodeGrant<'a> {
	pub client_id: &'a str,
	pub client_secret: &'a str,
	pub code: &'a str,
	pub grant_type: &'static str,
	pub redirect_uri: &'a str,
}

impl<'a> AuthorizationCodeGrant<'a> {
	pub fn new(client_id: &'a str, client_secret: &'a str, code: &'a str, redirect_uri: &'a str) -> Self {
		Self {
			client_id,
			client_secret,
			code,
			grant_type: "authorization_code",
			redirect_uri,
		}
	}
}

/// Form body for the `refresh_token` grant.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenGrant<'a> {
	pub grant_type: &'static str,
	pub refresh_token: &'a str,
	pub client_id: &'a str,
	pub client_secret: &'a str,
}

impl<'a> RefreshTokenGrant<'a> {
	pub fn new(refresh_token: &'a str, client_id: &'a str, client_secret: &'a str) -> Self {
		Self {
			grant_type: "refresh_token",
			refresh_token,
			client_id,
			client_secret,
		}
	}
}

/// Granted scopes. Twitch returns a JSON array, RFC 6749 a space-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrantedScope {
	List(Vec<String>),
	Joined(String),
}

impl GrantedScope {
	pub fn to_vec(&self) -> Vec<String> {
		match self {
			GrantedScope::List(list) => list.clone(),
			GrantedScope::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
		}
	}
}

/// Token endpoint response for both grants.
///
/// Every field is optional: a 200 response without `access_token` is still a
/// failed exchange, and the caller decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	#[serde(default)]
	pub access_token: Option<String>,
	#[serde(default)]
	pub refresh_token: Option<String>,
	#[serde(default)]
	pub expires_in: Option<u64>,
	#[serde(default)]
	pub scope: Option<GrantedScope>,
	#[serde(default)]
	pub token_type: Option<String>,
}

/// Error body returned by the token endpoint.
///
/// Twitch answers `{"status": 400, "message": "..."}`; standard servers use
/// `error` / `error_description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenErrorBody {
	#[serde(default)]
	pub status: Option<u16>,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub error_description: Option<String>,
}

impl TokenErrorBody {
	/// Best human-readable description, if the body carried one.
	pub fn summary(&self) -> Option<String> {
		match (&self.error, &self.error_description, &self.message) {
			(Some(error), Some(description), _) => Some(format!("{error}: {description}")),
			(_, Some(description), _) => Some(description.clone()),
			(_, _, Some(message)) => Some(message.clone()),
			(Some(error), None, None) => Some(error.clone()),
			(None, None, None) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn twitch_token_response_parses_scope_array() {
		let body = r#"{
  "access_token": "at-1",
  "refresh_token": "rt-1",
  "expires_in": 14124,
  "scope": ["chat:read", "chat:edit"],
  "token_type": "bearer"
}"#;
		let parsed: TokenResponse = serde_json::from_str(body).unwrap();
		assert_eq!(parsed.access_token.as_deref(), Some("at-1"));
		assert_eq!(parsed.refresh_token.as_deref(), Some("rt-1"));
		assert_eq!(parsed.scope.unwrap().to_vec(), vec!["chat:read", "chat:edit"]);
	}

	#[test]
	fn rfc_token_response_parses_joined_scope() {
		let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"x","scope":"a b"}"#).unwrap();
		assert_eq!(parsed.scope.unwrap().to_vec(), vec!["a", "b"]);
		assert!(parsed.refresh_token.is_none());
	}

	#[test]
	fn refresh_grant_serializes_grant_type() {
		let form = serde_json::to_value(RefreshTokenGrant::new("rt", "cid", "secret")).unwrap();
		assert_eq!(form["grant_type"], "refresh_token");
		assert_eq!(form["refresh_token"], "rt");
	}

	#[test]
	fn error_summary_prefers_description() {
		let body: TokenErrorBody = serde_json::from_str(r#"{"error":"invalid_grant","error_description":"expired"}"#).unwrap();
		assert_eq!(body.summary().as_deref(), Some("invalid_grant: expired"));

		let twitch: TokenErrorBody = serde_json::from_str(r#"{"status":400,"message":"Invalid refresh token"}"#).unwrap();
		assert_eq!(twitch.summary().as_deref(), Some("Invalid refresh token"));
		assert_eq!(TokenErrorBody::default().summary(), None);
	}
}
