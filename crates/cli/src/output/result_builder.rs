use std::io::{self, Write};
use std::time::Instant;

use serde::Serialize;
use viewerq::{Event, QueueEntry, StatusLevel};

use crate::output::format::OutputFormat;
use crate::output::model::{CommandError, CommandResult, ErrorCode};

/// Assembles a [`CommandResult`]; the duration defaults to the time since
/// [`ResultBuilder::new`].
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	started: Instant,
	duration_ms: Option<u64>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			started: Instant::now(),
			duration_ms: None,
		}
	}

	pub fn data(self, data: T) -> Self {
		Self { data: Some(data), ..self }
	}

	pub fn error(self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.with_error(code, message.into(), None)
	}

	pub fn error_with_details(self, code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
		self.with_error(code, message.into(), Some(details))
	}

	pub fn duration_ms(self, duration_ms: u64) -> Self {
		Self {
			duration_ms: Some(duration_ms),
			..self
		}
	}

	fn with_error(self, code: ErrorCode, message: String, details: Option<serde_json::Value>) -> Self {
		Self {
			error: Some(CommandError { code, message, details }),
			..self
		}
	}

	/// A result is `ok` only with data and without an error.
	pub fn build(self) -> CommandResult<T> {
		let elapsed = self.started.elapsed().as_millis() as u64;
		CommandResult {
			ok: self.error.is_none() && self.data.is_some(),
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.duration_ms.unwrap_or(elapsed)),
		}
	}
}

/// Print a command result to stdout in the specified format.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();
	match (&result.error, &result.data) {
		(Some(error), _) => {
			let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
			if let Some(json) = error.details.as_ref().and_then(|d| serde_json::to_string_pretty(d).ok()) {
				let _ = writeln!(stdout, "Details: {json}");
			}
		}
		(None, Some(data)) => {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(stdout, "{json}");
			}
		}
		(None, None) => {}
	}
}

/// Print an error to stderr in human-readable format.
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// Print one engine event: a readable line, or one compact JSON object per line.
pub fn print_event(event: &Event, format: OutputFormat) {
	let line = match format {
		OutputFormat::Json => match serde_json::to_string(event) {
			Ok(json) => json,
			Err(_) => return,
		},
		OutputFormat::Text => render_event(event),
	};
	let mut stdout = io::stdout().lock();
	let _ = writeln!(stdout, "{line}");
}

pub(crate) fn render_event(event: &Event) -> String {
	match event {
		Event::QueueChanged { waiting } => format!("waiting ({}): {}", waiting.len(), render_entries(waiting)),
		Event::SelectedChanged { selected } => format!("selected ({}): {}", selected.len(), render_entries(selected)),
		Event::ConnectionStatus { connected: true } => "chat: connected".to_string(),
		Event::ConnectionStatus { connected: false } => "chat: disconnected".to_string(),
		Event::Status(msg) => {
			let level = match msg.level {
				StatusLevel::Info => "info",
				StatusLevel::Warning => "warning",
				StatusLevel::Fatal => "fatal",
			};
			format!("[{level}] {}", msg.text)
		}
	}
}

fn render_entries(entries: &[QueueEntry]) -> String {
	if entries.is_empty() {
		return "-".to_string();
	}
	entries
		.iter()
		.map(|e| format!("{} (tier {}, queued {})", e.username, e.sub_tier, e.times_queued))
		.collect::<Vec<_>>()
		.join(", ")
}
