//! IRCv3 line codec used by the chat service.
//!
//! Parses lines of the form
//! `@tag=value;tag2 :nick!user@host COMMAND middle :trailing text`
//! and renders the handful of client commands the bot sends.

use std::collections::BTreeMap;
use std::fmt;

/// One parsed IRC line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcMessage {
	pub tags: BTreeMap<String, String>,
	pub prefix: Option<String>,
	pub command: String,
	pub params: Vec<String>,
}

impl IrcMessage {
	/// Parses a single line. Returns `None` for blank or malformed lines.
	pub fn parse(line: &str) -> Option<Self> {
		let mut rest = line.trim_end_matches(['\r', '\n']);
		if rest.trim().is_empty() {
			return None;
		}

		let mut tags = BTreeMap::new();
		if let Some(stripped) = rest.strip_prefix('@') {
			let (raw_tags, tail) = stripped.split_once(' ')?;
			for pair in raw_tags.split(';').filter(|pair| !pair.is_empty()) {
				let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
				tags.insert(key.to_string(), unescape_tag_value(value));
			}
			rest = tail.trim_start_matches(' ');
		}

		let mut prefix = None;
		if let Some(stripped) = rest.strip_prefix(':') {
			let (raw_prefix, tail) = stripped.split_once(' ')?;
			prefix = Some(raw_prefix.to_string());
			rest = tail.trim_start_matches(' ');
		}

		let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
		if command.is_empty() {
			return None;
		}

		let mut params = Vec::new();
		loop {
			rest = rest.trim_start_matches(' ');
			if rest.is_empty() {
				break;
			}
			if let Some(trailing) = rest.strip_prefix(':') {
				params.push(trailing.to_string());
				break;
			}
			match rest.split_once(' ') {
				Some((param, tail)) => {
					params.push(param.to_string());
					rest = tail;
				}
				None => {
					params.push(rest.to_string());
					break;
				}
			}
		}

		Some(Self {
			tags,
			prefix,
			command: command.to_ascii_uppercase(),
			params,
		})
	}

	/// Returns a tag value, treating an empty value as absent.
	pub fn tag(&self, key: &str) -> Option<&str> {
		self.tags.get(key).map(String::as_str).filter(|value| !value.is_empty())
	}

	/// Nick portion of a `nick!user@host` prefix.
	pub fn nick(&self) -> Option<&str> {
		self.prefix.as_deref().and_then(|prefix| prefix.split('!').next()).filter(|nick| !nick.is_empty())
	}

	/// Last parameter, which carries the message body for PRIVMSG/NOTICE.
	pub fn trailing(&self) -> Option<&str> {
		self.params.last().map(String::as_str)
	}

	/// Version of the badge `name` from the `badges` tag (`subscriber/3009,premium/1`).
	pub fn badge(&self, name: &str) -> Option<&str> {
		self.tag("badges")?
			.split(',')
			.filter_map(|badge| badge.split_once('/'))
			.find(|(badge, _)| *badge == name)
			.map(|(_, version)| version)
	}
}

fn unescape_tag_value(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();
	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}
		match chars.next() {
			Some(':') => out.push(';'),
			Some('s') => out.push(' '),
			Some('\\') => out.push('\\'),
			Some('r') => out.push('\r'),
			Some('n') => out.push('\n'),
			Some(other) => out.push(other),
			None => {}
		}
	}
	out
}

/// Client-to-server lines the chat session sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine<'a> {
	CapReq(&'a [&'a str]),
	Pass(&'a str),
	Nick(&'a str),
	Join(&'a str),
	Part(&'a str),
	Pong(&'a str),
	Privmsg { channel: &'a str, text: &'a str },
}

impl fmt::Display for ClientLine<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClientLine::CapReq(caps) => write!(f, "CAP REQ :{}", caps.join(" ")),
			ClientLine::Pass(token) => write!(f, "PASS oauth:{}", token.trim_start_matches("oauth:")),
			ClientLine::Nick(nick) => write!(f, "NICK {}", nick.to_ascii_lowercase()),
			ClientLine::Join(channel) => write!(f, "JOIN #{}", channel.trim_start_matches('#').to_ascii_lowercase()),
			ClientLine::Part(channel) => write!(f, "PART #{}", channel.trim_start_matches('#').to_ascii_lowercase()),
			ClientLine::Pong(token) => write!(f, "PONG :{token}"),
			ClientLine::Privmsg { channel, text } => {
				write!(f, "PRIVMSG #{} :{text}", channel.trim_start_matches('#').to_ascii_lowercase())
			}
		}
	}
}
