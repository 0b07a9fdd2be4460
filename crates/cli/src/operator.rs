//! Line commands an operator types into `viewerq run`.
//!
//! Each stdin line is parsed with clap (no binary name) and applied to the
//! [`QueueController`]; the reply is a single human-readable line.

use clap::{Parser, Subcommand};
use viewerq::{LeaveOutcome, QueueController, SortOption};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "queue")]
struct OperatorLine {
	#[command(subcommand)]
	command: OperatorCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
	/// Pick a waiting viewer
	Select { user: String },
	/// Return a selected viewer to the waiting list
	Back { user: String },
	/// Finish with a selected viewer
	Done {
		user: String,
		/// Do not count this turn toward the viewer's history
		#[arg(long)]
		uncounted: bool,
	},
	/// Remove a viewer from the waiting list
	Remove { user: String },
	/// Change the waiting-list ordering
	Sort {
		#[arg(value_parser = parse_sort)]
		option: SortOption,
	},
	/// Print both lists
	List,
}

fn parse_sort(value: &str) -> Result<SortOption, String> {
	value.parse().map_err(|err: viewerq::UnknownSortOption| err.to_string())
}

impl OperatorCommand {
	/// `Ok(None)` for blank lines; `Err` carries clap's rendered message.
	pub fn parse(line: &str) -> Result<Option<Self>, String> {
		let words: Vec<&str> = line.split_whitespace().collect();
		if words.is_empty() {
			return Ok(None);
		}
		OperatorLine::try_parse_from(words)
			.map(|parsed| Some(parsed.command))
			.map_err(|err| err.render().to_string().trim_end().to_string())
	}

	pub fn apply(&self, controller: &QueueController) -> Result<String, String> {
		match self {
			OperatorCommand::Select { user } => {
				let user = normalize(user);
				if controller.select(&user) {
					Ok(format!("{user} selected"))
				} else {
					Err(format!("{user} is not waiting"))
				}
			}
			OperatorCommand::Back { user } => {
				let user = normalize(user);
				if controller.unselect(&user) {
					Ok(format!("{user} is waiting again"))
				} else {
					Err(format!("{user} is not selected"))
				}
			}
			OperatorCommand::Done { user, uncounted } => {
				let user = normalize(user);
				if !controller.complete(&user, !uncounted) {
					return Err(format!("{user} is not selected"));
				}
				Ok(if *uncounted {
					format!("{user} removed without counting")
				} else {
					format!("{user} done, queued {} times", controller.times_queued(&user))
				})
			}
			OperatorCommand::Remove { user } => {
				let user = normalize(user);
				match controller.leave(&user) {
					LeaveOutcome::Left => Ok(format!("{user} removed from the queue")),
					LeaveOutcome::IsSelected => Err(format!("{user} is selected; use `done` or `back`")),
					LeaveOutcome::NotQueued => Err(format!("{user} is not in the queue")),
				}
			}
			OperatorCommand::Sort { option } => {
				controller.set_sort_option(*option);
				Ok(format!("sorting by {}", option.label()))
			}
			OperatorCommand::List => Ok(format!(
				"waiting: {} | selected: {}",
				names(&controller.waiting()),
				names(&controller.selected())
			)),
		}
	}
}

fn normalize(user: &str) -> String {
	user.trim_start_matches('@').to_ascii_lowercase()
}

fn names(entries: &[viewerq::QueueEntry]) -> String {
	if entries.is_empty() {
		return "-".to_string();
	}
	entries.iter().map(|e| e.username.as_str()).collect::<Vec<_>>().join(", ")
}
