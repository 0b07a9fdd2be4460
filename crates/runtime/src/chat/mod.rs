//! Twitch chat session over IRC-on-WebSocket.
//!
//! One [`TwitchChat::run_session`] call is one connection attempt. It reports
//! `Connected` on the server welcome, forwards queue commands to the
//! [`QueueController`], and ends with a structured [`DisconnectCause`].

pub mod commands;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use viewerq::QueueController;
use viewerq_protocol::{ClientLine, IrcMessage};

use crate::config::AppConfig;
use crate::error::ChatError;
use crate::supervisor::{ChatConnector, DisconnectCause, SessionReporter};

const CAPABILITIES: &[&str] = &["twitch.tv/tags", "twitch.tv/commands"];

/// NOTICE texts the server sends when it refuses the credential.
const AUTH_FAILURE_NOTICES: &[&str] = &["login authentication failed", "improperly formatted auth"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
	pub url: String,
	pub channel: String,
	pub nick: String,
}

impl ChatSettings {
	pub fn from_config(config: &AppConfig) -> Result<Self, ChatError> {
		let channel = config.channel.trim().trim_start_matches('#').to_ascii_lowercase();
		if channel.is_empty() {
			return Err(ChatError::MissingChannel);
		}
		Ok(Self {
			url: config.provider.chat_url.clone(),
			nick: config.nick().trim_start_matches('#').to_ascii_lowercase(),
			channel,
		})
	}
}

pub struct TwitchChat {
	settings: ChatSettings,
	controller: Arc<QueueController>,
}

impl TwitchChat {
	pub fn new(settings: ChatSettings, controller: Arc<QueueController>) -> Self {
		Self { settings, controller }
	}

	async fn session(&self, token: &str, reporter: &SessionReporter) -> Result<DisconnectCause, ChatError> {
		let (socket, _) = tokio_tungstenite::connect_async(self.settings.url.as_str()).await?;
		let (mut sink, mut stream) = socket.split();
		debug!(target = "viewerq.chat", url = %self.settings.url, "socket open");

		send(&mut sink, ClientLine::CapReq(CAPABILITIES)).await?;
		send(&mut sink, ClientLine::Pass(token)).await?;
		send(&mut sink, ClientLine::Nick(&self.settings.nick)).await?;
		send(&mut sink, ClientLine::Join(&self.settings.channel)).await?;

		loop {
			let frame = tokio::select! {
				frame = stream.next() => frame,
				_ = reporter.stopped() => {
					send(&mut sink, ClientLine::Part(&self.settings.channel)).await?;
					let _ = sink.close().await;
					return Ok(DisconnectCause::None);
				}
			};
			let text = match frame {
				None => return Err(ChatError::Closed),
				Some(frame) => match frame? {
					Message::Text(text) => text,
					Message::Ping(payload) => {
						sink.send(Message::Pong(payload)).await?;
						continue;
					}
					Message::Close(_) => return Err(ChatError::Closed),
					_ => continue,
				},
			};

			for line in text.split("\r\n") {
				let Some(msg) = IrcMessage::parse(line) else {
					continue;
				};
				if let Some(cause) = self.dispatch(&msg, &mut sink, reporter).await? {
					return Ok(cause);
				}
			}
		}
	}

	/// Handles one server line; `Some` ends the session.
	async fn dispatch<S>(
		&self,
		msg: &IrcMessage,
		sink: &mut S,
		reporter: &SessionReporter,
	) -> Result<Option<DisconnectCause>, ChatError>
	where
		S: Sink<Message, Error = tungstenite::Error> + Unpin,
	{
		match msg.command.as_str() {
			"PING" => {
				send(sink, ClientLine::Pong(msg.trailing().unwrap_or("tmi.twitch.tv"))).await?;
			}
			"001" => {
				info!(target = "viewerq.chat", nick = %self.settings.nick, "logged in");
				reporter.connected();
			}
			"JOIN" if msg.nick() == Some(self.settings.nick.as_str()) => {
				reporter.info(format!("Joined #{}", self.settings.channel));
			}
			"NOTICE" => {
				if let Some(reason) = auth_failure(msg) {
					warn!(target = "viewerq.chat", %reason, "server rejected credential");
					return Ok(Some(DisconnectCause::AuthError(reason)));
				}
				debug!(target = "viewerq.chat", notice = msg.trailing().unwrap_or_default(), "notice");
			}
			"RECONNECT" => {
				return Ok(Some(DisconnectCause::OtherError("server requested reconnect".into())));
			}
			"PRIVMSG" => {
				if let Some(reply) = commands::handle(&self.controller, msg) {
					send(
						sink,
						ClientLine::Privmsg {
							channel: &self.settings.channel,
							text: &reply,
						},
					)
					.await?;
				}
			}
			_ => {}
		}
		Ok(None)
	}
}

#[async_trait]
impl ChatConnector for TwitchChat {
	async fn run_session(&self, token: String, reporter: SessionReporter) -> DisconnectCause {
		match self.session(&token, &reporter).await {
			Ok(cause) => cause,
			Err(err) => {
				debug!(target = "viewerq.chat", error = %err, "session ended with error");
				DisconnectCause::OtherError(err.to_string())
			}
		}
	}
}

/// Credential rejection reported by the server, if `msg` is one.
pub fn auth_failure(msg: &IrcMessage) -> Option<String> {
	let text = msg.trailing()?;
	let lower = text.to_ascii_lowercase();
	AUTH_FAILURE_NOTICES
		.iter()
		.any(|needle| lower.contains(needle))
		.then(|| text.to_string())
}

async fn send<S>(sink: &mut S, line: ClientLine<'_>) -> Result<(), ChatError>
where
	S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
	if !matches!(line, ClientLine::Pass(_)) {
		debug!(target = "viewerq.chat", %line, "send");
	}
	sink.send(Message::Text(line.to_string())).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn settings_require_a_channel() {
		assert!(matches!(
			ChatSettings::from_config(&AppConfig::default()),
			Err(ChatError::MissingChannel)
		));
		let settings = ChatSettings::from_config(&AppConfig {
			channel: "#Streamer".into(),
			..AppConfig::default()
		})
		.unwrap();
		assert_eq!(settings.channel, "streamer");
		assert_eq!(settings.nick, "streamer");
		assert_eq!(settings.url, "wss://irc-ws.chat.twitch.tv:443");
	}

	#[test]
	fn recognizes_auth_failure_notices() {
		let failed = IrcMessage::parse(":tmi.twitch.tv NOTICE * :Login authentication failed").unwrap();
		assert_eq!(auth_failure(&failed).as_deref(), Some("Login authentication failed"));
		let malformed = IrcMessage::parse(":tmi.twitch.tv NOTICE * :Improperly formatted auth").unwrap();
		assert!(auth_failure(&malformed).is_some());
		let other = IrcMessage::parse(":tmi.twitch.tv NOTICE #chan :This room is in slow mode.").unwrap();
		assert_eq!(auth_failure(&other), None);
	}
}
