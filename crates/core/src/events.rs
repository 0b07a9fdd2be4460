//! One-way notification channel from the engine to front ends.
//!
//! Publishing never blocks: subscribers that fall behind observe
//! `RecvError::Lagged` instead of stalling the publisher, and publishing
//! with no subscribers is a no-op.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::entry::QueueEntry;

const DEFAULT_CAPACITY: usize = 256;

/// Severity of a [`StatusMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
	Info,
	Warning,
	Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
	pub level: StatusLevel,
	pub text: String,
}

/// Everything a front end needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
	QueueChanged { waiting: Vec<QueueEntry> },
	SelectedChanged { selected: Vec<QueueEntry> },
	ConnectionStatus { connected: bool },
	Status(StatusMessage),
}

/// Cloneable broadcast publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
	tx: broadcast::Sender<Event>,
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.tx.subscribe()
	}

	pub fn publish(&self, event: Event) {
		let _ = self.tx.send(event);
	}

	pub fn connection(&self, connected: bool) {
		self.publish(Event::ConnectionStatus { connected });
	}

	pub fn status(&self, level: StatusLevel, text: impl Into<String>) {
		self.publish(Event::Status(StatusMessage { level, text: text.into() }));
	}

	pub fn info(&self, text: impl Into<String>) {
		self.status(StatusLevel::Info, text);
	}

	pub fn warning(&self, text: impl Into<String>) {
		self.status(StatusLevel::Warning, text);
	}

	pub fn fatal(&self, text: impl Into<String>) {
		self.status(StatusLevel::Fatal, text);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn subscribers_receive_published_events_in_order() {
		let bus = EventBus::default();
		let mut rx = bus.subscribe();
		bus.connection(true);
		bus.warning("token expired");

		assert_eq!(rx.recv().await.unwrap(), Event::ConnectionStatus { connected: true });
		assert_eq!(
			rx.recv().await.unwrap(),
			Event::Status(StatusMessage {
				level: StatusLevel::Warning,
				text: "token expired".into()
			})
		);
	}

	#[test]
	fn publishing_without_subscribers_is_silent() {
		let bus = EventBus::new(1);
		bus.info("nobody listening");
		bus.fatal("still fine");
	}

	#[test]
	fn events_serialize_with_type_tag() {
		let json = serde_json::to_value(Event::ConnectionStatus { connected: false }).unwrap();
		assert_eq!(json["type"], "connection_status");
		assert_eq!(json["connected"], false);
	}
}
