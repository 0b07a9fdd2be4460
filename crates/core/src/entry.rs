use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A viewer's place in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
	pub username: String,
	/// 0 for non-subscribers, otherwise the subscription tier.
	pub sub_tier: u32,
	/// How many times this viewer was previously selected and completed.
	pub times_queued: u32,
	/// Unix timestamp in seconds.
	pub join_timestamp: f64,
}

impl QueueEntry {
	pub fn new(username: impl Into<String>, sub_tier: u32, times_queued: u32, join_timestamp: f64) -> Self {
		Self {
			username: username.into(),
			sub_tier,
			times_queued,
			join_timestamp,
		}
	}
}

/// Current Unix time in fractional seconds.
pub fn now_ts() -> f64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}
