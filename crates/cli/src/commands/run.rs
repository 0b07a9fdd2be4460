use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use viewerq::{EventBus, QueueController};
use viewerq_runtime::{ChatSettings, ConnectionSupervisor, RestartPolicy, SupervisorOutcome, TwitchChat};

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::operator::OperatorCommand;
use crate::output::{ResultBuilder, print_event, print_result};

/// Runs the chat session under supervision, printing every bus event until
/// the run ends or Ctrl+C stops it.
pub async fn execute(ctx: &CommandContext, no_browser: bool) -> Result<()> {
	let config = ctx.store.snapshot();
	let bus = EventBus::default();
	let mut events = bus.subscribe();

	let controller = Arc::new(QueueController::new(bus.clone(), config.sort_option));
	let chat = TwitchChat::new(ChatSettings::from_config(&config)?, Arc::clone(&controller));
	let auth = Arc::new(ctx.authenticator(bus.clone(), no_browser)?);
	let validator = Arc::new(ctx.validator()?);

	let supervisor = ConnectionSupervisor::new(
		validator,
		auth.clone(),
		Arc::new(chat),
		RestartPolicy::from(config.supervisor),
		bus.clone(),
	);
	let stop = supervisor.stop_handle();

	if auth.access_token().is_none() && auth.has_credentials() {
		auth.authorize_in_background(stop.clone());
	}

	info!(target = "viewerq.supervisor", channel = %config.channel, "starting chat session");
	let run = supervisor.run();
	tokio::pin!(run);
	let mut stopping = false;
	let mut stdin = BufReader::new(tokio::io::stdin()).lines();
	let mut stdin_open = true;

	let outcome = loop {
		tokio::select! {
			outcome = &mut run => break outcome,
			event = events.recv() => match event {
				Ok(event) => print_event(&event, ctx.format),
				Err(RecvError::Lagged(skipped)) => warn!(target = "viewerq.queue", skipped, "event renderer lagged"),
				Err(RecvError::Closed) => {}
			},
			line = stdin.next_line(), if stdin_open => match line {
				Ok(Some(line)) => operate(ctx, &controller, &line),
				Ok(None) => stdin_open = false,
				Err(err) => {
					warn!(target = "viewerq.queue", error = %err, "operator input closed");
					stdin_open = false;
				}
			},
			_ = tokio::signal::ctrl_c(), if !stopping => {
				info!(target = "viewerq.supervisor", "interrupt received, stopping");
				stopping = true;
				stop.stop();
			}
		}
	};
	while let Ok(event) = events.try_recv() {
		print_event(&event, ctx.format);
	}

	let summary = match &outcome {
		SupervisorOutcome::Halted(reason) => return Err(CliError::Halted(reason.clone())),
		SupervisorOutcome::Terminated => json!({ "outcome": "terminated" }),
		SupervisorOutcome::Exhausted { restarts } => json!({ "outcome": "exhausted", "restarts": restarts }),
		SupervisorOutcome::Stopped => json!({ "outcome": "stopped" }),
	};
	let result = ResultBuilder::new("run")
		.data(json!({
			"run": summary,
			"waiting": controller.waiting().len(),
			"selected": controller.selected().len(),
		}))
		.build();
	print_result(&result, ctx.format);
	Ok(())
}

/// Applies one operator line; replies go to stderr so stdout stays a
/// clean event stream.
fn operate(ctx: &CommandContext, controller: &QueueController, line: &str) {
	let command = match OperatorCommand::parse(line) {
		Ok(Some(command)) => command,
		Ok(None) => return,
		Err(message) => {
			eprintln!("{message}");
			return;
		}
	};
	match command.apply(controller) {
		Ok(reply) => eprintln!("{reply}"),
		Err(message) => eprintln!("error: {message}"),
	}
	if let OperatorCommand::Sort { option } = command {
		if let Err(err) = ctx.store.update(|c| c.sort_option = option) {
			warn!(target = "viewerq.config", error = %err, "sort option not saved");
		}
	}
}
