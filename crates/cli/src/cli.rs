use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "viewerq")]
#[command(about = "Chat-driven viewer queue with an authenticated Twitch session")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file to read and update
	#[arg(long, global = true, value_name = "FILE", env = "VIEWERQ_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// OAuth credential management
	Auth {
		#[command(subcommand)]
		action: AuthAction,
	},

	/// Inspect or edit the config file
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},

	/// Connect to chat and run the queue until Ctrl+C
	Run {
		/// Do not open a browser when authorization is needed; print the URL instead
		#[arg(long)]
		no_browser: bool,
	},
}

impl Commands {
	/// Dotted name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Auth { action } => match action {
				AuthAction::Login { .. } => "auth login",
				AuthAction::Refresh => "auth refresh",
				AuthAction::Validate => "auth validate",
				AuthAction::Show => "auth show",
			},
			Commands::Config { action } => match action {
				ConfigAction::Show => "config show",
				ConfigAction::Path => "config path",
				ConfigAction::SetChannel { .. } => "config set-channel",
				ConfigAction::SetSort { .. } => "config set-sort",
			},
			Commands::Run { .. } => "run",
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
	/// Run the authorization-code flow in the browser
	Login {
		/// Print the authorize URL instead of opening a browser
		#[arg(long)]
		no_browser: bool,
	},
	/// Trade the stored refresh token for a new access token
	Refresh,
	/// Check the stored access token against the API
	Validate,
	/// Print the stored credential with secrets masked
	Show,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
	/// Print the effective config with secrets masked
	Show,
	/// Print the config file location
	Path,
	/// Set the chat channel to join
	SetChannel {
		/// Channel name, with or without the leading '#'
		channel: String,
	},
	/// Set the waiting-list ordering
	SetSort {
		/// times-queued-sub-tier, sub-tier, times-queued or time-joined
		option: String,
	},
}
