use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// How results and bus events are written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Readable lines for an operator watching the terminal
	#[default]
	Text,
	/// One envelope per command, one object per event
	Json,
}

impl OutputFormat {
	pub fn as_str(self) -> &'static str {
		match self {
			OutputFormat::Text => "text",
			OutputFormat::Json => "json",
		}
	}
}

impl FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let wanted = s.trim().to_ascii_lowercase();
		[OutputFormat::Text, OutputFormat::Json]
			.into_iter()
			.find(|format| format.as_str() == wanted)
			.ok_or_else(|| format!("unknown format: {s}"))
	}
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
