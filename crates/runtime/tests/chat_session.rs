use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use viewerq::{Event, EventBus, QueueController, SortOption};
use viewerq_runtime::{
	AppConfig, AuthError, Authenticator, ChatSettings, ConnectionSupervisor, RestartPolicy, SupervisorOutcome,
	SupervisorState, TokenValidator, TwitchChat,
};

/// Scripted IRC server: replays `script` after the client has sent its four
/// login lines, then closes. `<expect>` reads one client line into `seen`.
async fn irc_server(script: Vec<&'static str>) -> (String, mpsc::UnboundedReceiver<String>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (seen_tx, seen_rx) = mpsc::unbounded_channel();

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

		for _ in 0..4 {
			if let Some(Ok(Message::Text(line))) = socket.next().await {
				let _ = seen_tx.send(line);
			}
		}
		for line in script {
			if line == "<expect>" {
				if let Some(Ok(Message::Text(reply))) = socket.next().await {
					let _ = seen_tx.send(reply);
				}
				continue;
			}
			socket.send(Message::Text(line.to_string())).await.unwrap();
		}
		let _ = socket.close(None).await;
	});

	(format!("ws://{addr}"), seen_rx)
}

fn chat(url: String, controller: Arc<QueueController>) -> TwitchChat {
	let mut config = AppConfig {
		channel: "Streamer".into(),
		bot_login: Some("queuebot".into()),
		..AppConfig::default()
	};
	config.provider.chat_url = url;
	TwitchChat::new(ChatSettings::from_config(&config).unwrap(), controller)
}

struct AlwaysValid;

#[async_trait]
impl TokenValidator for AlwaysValid {
	async fn is_valid(&self, _token: &str) -> bool {
		true
	}
}

struct StaticAuth;

#[async_trait]
impl Authenticator for StaticAuth {
	fn access_token(&self) -> Option<String> {
		Some("tok".into())
	}

	async fn refresh(&self) -> Result<String, AuthError> {
		Err(AuthError::MissingCredential("refreshToken"))
	}
}

fn supervisor(chat: TwitchChat, bus: EventBus) -> ConnectionSupervisor {
	ConnectionSupervisor::new(
		Arc::new(AlwaysValid),
		Arc::new(StaticAuth),
		Arc::new(chat),
		RestartPolicy {
			max_restarts: 3,
			backoff: Duration::from_millis(5),
			token_poll: Duration::from_millis(5),
		},
		bus,
	)
}

#[tokio::test]
async fn login_join_command_and_clean_server_close() {
	let (url, mut seen) = irc_server(vec![
		":tmi.twitch.tv 001 queuebot :Welcome, GLHF!",
		"PING :tmi.twitch.tv",
		"<expect>",
		"@badges=subscriber/3012;display-name=Alice :alice!alice@alice.tmi.twitch.tv PRIVMSG #streamer :!join",
		"<expect>",
	])
	.await;
	let bus = EventBus::default();
	let controller = Arc::new(QueueController::new(bus.clone(), SortOption::default()));
	let supervisor = supervisor(chat(url, Arc::clone(&controller)), bus);

	let outcome = supervisor.run().await;

	let mut lines = Vec::new();
	while let Ok(line) = seen.try_recv() {
		lines.push(line);
	}
	assert_eq!(
		lines,
		vec![
			"CAP REQ :twitch.tv/tags twitch.tv/commands",
			"PASS oauth:tok",
			"NICK queuebot",
			"JOIN #streamer",
			"PONG :tmi.twitch.tv",
			"PRIVMSG #streamer :@alice, you joined the queue!",
		]
	);
	let waiting = controller.waiting();
	assert_eq!(waiting.len(), 1);
	assert_eq!(waiting[0].username, "alice");
	assert_eq!(waiting[0].sub_tier, 3);
	assert_eq!(outcome, SupervisorOutcome::Terminated);
}

#[tokio::test]
async fn auth_notice_becomes_structured_cause() {
	let (url, _seen) = irc_server(vec![":tmi.twitch.tv NOTICE * :Login authentication failed"]).await;
	let controller = Arc::new(QueueController::new(EventBus::default(), SortOption::default()));
	let chat = chat(url, controller);

	let supervisor = supervisor(chat, EventBus::default());
	// Refresh is refused by the fake authenticator, so the auth cause halts the run.
	assert!(matches!(supervisor.run().await, SupervisorOutcome::Halted(_)));
	let state = supervisor.state().borrow().clone();
	assert!(state.is_final());
}

#[tokio::test]
async fn reconnect_request_is_an_other_error() {
	let (url, _seen) = irc_server(vec![":tmi.twitch.tv RECONNECT"]).await;
	let controller = Arc::new(QueueController::new(EventBus::default(), SortOption::default()));
	let chat = chat(url, controller);
	let supervisor = supervisor(chat, EventBus::default());
	let mut state = supervisor.state();
	assert_eq!(supervisor.run().await, SupervisorOutcome::Terminated);
	assert!(state.has_changed().unwrap());
	assert_eq!(*state.borrow_and_update(), SupervisorState::Terminated);
}

#[tokio::test]
async fn unreachable_server_is_an_other_error() {
	let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
	let controller = Arc::new(QueueController::new(EventBus::default(), SortOption::default()));
	let chat = chat(format!("ws://127.0.0.1:{port}"), controller);
	let bus = EventBus::default();
	let mut events = bus.subscribe();
	let supervisor = supervisor(chat, bus);
	assert_eq!(supervisor.run().await, SupervisorOutcome::Terminated);

	while let Ok(event) = events.try_recv() {
		assert!(!matches!(event, Event::ConnectionStatus { connected: true }));
	}
}
