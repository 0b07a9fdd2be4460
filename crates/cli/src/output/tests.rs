use serde_json::json;
use viewerq::{Event, QueueEntry, StatusLevel, StatusMessage};

use super::result_builder::render_event;
use super::*;

#[test]
fn success_envelope_has_data_and_no_error() {
	let result = ResultBuilder::new("config path").data(json!({ "path": "/tmp/x" })).duration_ms(3).build();
	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "config path");
	assert_eq!(value["data"]["path"], "/tmp/x");
	assert_eq!(value["durationMs"], 3);
	assert!(value.get("error").is_none());
}

#[test]
fn error_envelope_is_not_ok_even_with_data() {
	let result = ResultBuilder::new("auth refresh")
		.data(json!({}))
		.error(ErrorCode::AuthError, "missing credential field: clientId")
		.build();
	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], false);
	assert_eq!(value["error"]["code"], "AUTH_ERROR");
	assert_eq!(value["error"]["message"], "missing credential field: clientId");
}

#[test]
fn builder_without_data_is_not_ok() {
	let result: CommandResult<()> = ResultBuilder::new("run").build();
	assert!(!result.ok);
}

#[test]
fn error_codes_display_like_their_wire_form() {
	for code in [ErrorCode::AuthInProgress, ErrorCode::SupervisorHalted, ErrorCode::InvalidInput] {
		let wire = serde_json::to_value(code).unwrap();
		assert_eq!(wire, code.to_string());
	}
}

#[test]
fn format_parses_case_insensitively() {
	assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
	assert!("toon".parse::<OutputFormat>().is_err());
}

#[test]
fn events_render_as_readable_lines() {
	let waiting = vec![QueueEntry::new("alice", 2, 1, 10.0), QueueEntry::new("bob", 0, 0, 11.0)];
	assert_eq!(
		render_event(&Event::QueueChanged { waiting }),
		"waiting (2): alice (tier 2, queued 1), bob (tier 0, queued 0)"
	);
	assert_eq!(render_event(&Event::SelectedChanged { selected: vec![] }), "selected (0): -");
	assert_eq!(render_event(&Event::ConnectionStatus { connected: true }), "chat: connected");
	assert_eq!(
		render_event(&Event::Status(StatusMessage {
			level: StatusLevel::Fatal,
			text: "Failed to refresh tokens".into(),
		})),
		"[fatal] Failed to refresh tokens"
	);
}
