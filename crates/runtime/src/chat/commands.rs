//! `!join` / `!leave` handling.

use viewerq::{JoinOutcome, LeaveOutcome, QueueController, now_ts};
use viewerq_protocol::IrcMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
	Join,
	Leave,
}

impl ChatCommand {
	/// First word of a chat message, case-insensitive.
	pub fn parse(text: &str) -> Option<Self> {
		let word = text.split_whitespace().next()?;
		if word.eq_ignore_ascii_case("!join") {
			Some(ChatCommand::Join)
		} else if word.eq_ignore_ascii_case("!leave") {
			Some(ChatCommand::Leave)
		} else {
			None
		}
	}
}

/// Subscriber badge versions encode tier and months (`3009` is tier 3,
/// `4` is tier 1); non-subscribers are tier 0.
pub fn sub_tier(msg: &IrcMessage) -> u32 {
	match msg.badge("subscriber").and_then(|v| v.parse::<u32>().ok()) {
		Some(raw) => (raw / 1000).max(1),
		None => 0,
	}
}

/// Applies a chat command to the queue and returns the reply to send.
pub fn handle(controller: &QueueController, msg: &IrcMessage) -> Option<String> {
	let command = ChatCommand::parse(msg.trailing()?)?;
	let username = msg.nick()?;
	let reply = match command {
		ChatCommand::Join => match controller.join(username, sub_tier(msg), now_ts()) {
			JoinOutcome::Joined => format!("@{username}, you joined the queue!"),
			JoinOutcome::AlreadyQueued => format!("@{username}, you're already in the queue!"),
		},
		ChatCommand::Leave => match controller.leave(username) {
			LeaveOutcome::Left => format!("@{username}, you left the queue!"),
			LeaveOutcome::IsSelected => format!("@{username}, you're not in the queue! You are selected!"),
			LeaveOutcome::NotQueued => format!("@{username}, you're not in the queue!"),
		},
	};
	Some(reply)
}

#[cfg(test)]
mod tests {
	use super::*;
	use viewerq::{EventBus, SortOption};

	fn privmsg(nick: &str, badges: &str, text: &str) -> IrcMessage {
		let line = format!("@badges={badges};color= :{nick}!{nick}@{nick}.tmi.twitch.tv PRIVMSG #streamer :{text}");
		IrcMessage::parse(&line).unwrap()
	}

	#[test]
	fn parses_commands_from_first_word() {
		assert_eq!(ChatCommand::parse("!join"), Some(ChatCommand::Join));
		assert_eq!(ChatCommand::parse("!JOIN please"), Some(ChatCommand::Join));
		assert_eq!(ChatCommand::parse("  !leave"), Some(ChatCommand::Leave));
		assert_eq!(ChatCommand::parse("hello !join"), None);
		assert_eq!(ChatCommand::parse("!joined"), None);
		assert_eq!(ChatCommand::parse(""), None);
	}

	#[test]
	fn sub_tier_from_badge_version() {
		assert_eq!(sub_tier(&privmsg("a", "subscriber/3009,premium/1", "hi")), 3);
		assert_eq!(sub_tier(&privmsg("a", "subscriber/2011", "hi")), 2);
		assert_eq!(sub_tier(&privmsg("a", "subscriber/4", "hi")), 1);
		assert_eq!(sub_tier(&privmsg("a", "subscriber/0", "hi")), 1);
		assert_eq!(sub_tier(&privmsg("a", "moderator/1", "hi")), 0);
		assert_eq!(sub_tier(&privmsg("a", "", "hi")), 0);
	}

	#[test]
	fn join_and_leave_replies() {
		let controller = QueueController::new(EventBus::default(), SortOption::default());

		let join = privmsg("alice", "subscriber/2003", "!join");
		assert_eq!(handle(&controller, &join).unwrap(), "@alice, you joined the queue!");
		assert_eq!(controller.waiting()[0].sub_tier, 2);
		assert_eq!(handle(&controller, &join).unwrap(), "@alice, you're already in the queue!");

		let leave = privmsg("alice", "", "!leave");
		assert_eq!(handle(&controller, &leave).unwrap(), "@alice, you left the queue!");
		assert_eq!(handle(&controller, &leave).unwrap(), "@alice, you're not in the queue!");
	}

	#[test]
	fn selected_viewer_cannot_leave() {
		let controller = QueueController::new(EventBus::default(), SortOption::default());
		handle(&controller, &privmsg("bob", "", "!join")).unwrap();
		assert!(controller.select("bob"));
		assert_eq!(
			handle(&controller, &privmsg("bob", "", "!leave")).unwrap(),
			"@bob, you're not in the queue! You are selected!"
		);
		assert_eq!(controller.selected().len(), 1);
	}

	#[test]
	fn ordinary_chatter_is_ignored() {
		let controller = QueueController::new(EventBus::default(), SortOption::default());
		assert_eq!(handle(&controller, &privmsg("cara", "", "good game")), None);
		assert!(controller.waiting().is_empty());
	}
}
