//! Waiting-list ordering strategies.
//!
//! [`QueueStore`](crate::QueueStore) only sees the [`SortPolicy`] trait; the
//! named [`SortOption`]s exposed to operators map onto concrete policies.
//! Entries that compare equal keep their insertion order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::QueueEntry;

/// Comparator strategy for the waiting list.
pub trait SortPolicy: Send + Sync + fmt::Debug {
	/// Stable identifier used in logs.
	fn name(&self) -> &'static str;

	fn compare(&self, a: &QueueEntry, b: &QueueEntry) -> Ordering;
}

/// `(times_queued ↑, sub_tier ↓, join_timestamp ↑)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimesQueuedThenTier;

impl SortPolicy for TimesQueuedThenTier {
	fn name(&self) -> &'static str {
		"times-queued-sub-tier"
	}

	fn compare(&self, a: &QueueEntry, b: &QueueEntry) -> Ordering {
		a.times_queued
			.cmp(&b.times_queued)
			.then_with(|| b.sub_tier.cmp(&a.sub_tier))
			.then_with(|| a.join_timestamp.total_cmp(&b.join_timestamp))
	}
}

/// `(sub_tier ↓, join_timestamp ↑)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubTierFirst;

impl SortPolicy for SubTierFirst {
	fn name(&self) -> &'static str {
		"sub-tier"
	}

	fn compare(&self, a: &QueueEntry, b: &QueueEntry) -> Ordering {
		b.sub_tier.cmp(&a.sub_tier).then_with(|| a.join_timestamp.total_cmp(&b.join_timestamp))
	}
}

/// `(times_queued ↑, join_timestamp ↑)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimesQueuedFirst;

impl SortPolicy for TimesQueuedFirst {
	fn name(&self) -> &'static str {
		"times-queued"
	}

	fn compare(&self, a: &QueueEntry, b: &QueueEntry) -> Ordering {
		a.times_queued
			.cmp(&b.times_queued)
			.then_with(|| a.join_timestamp.total_cmp(&b.join_timestamp))
	}
}

/// First come, first served.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeJoined;

impl SortPolicy for TimeJoined {
	fn name(&self) -> &'static str {
		"time-joined"
	}

	fn compare(&self, a: &QueueEntry, b: &QueueEntry) -> Ordering {
		a.join_timestamp.total_cmp(&b.join_timestamp)
	}
}

/// Named orderings selectable from the front end and persisted in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
	#[default]
	TimesQueuedSubTier,
	SubTier,
	TimesQueued,
	TimeJoined,
}

impl SortOption {
	pub const ALL: [SortOption; 4] = [
		SortOption::TimesQueuedSubTier,
		SortOption::SubTier,
		SortOption::TimesQueued,
		SortOption::TimeJoined,
	];

	/// Strategy object implementing this ordering.
	pub fn policy(self) -> Arc<dyn SortPolicy> {
		match self {
			SortOption::TimesQueuedSubTier => Arc::new(TimesQueuedThenTier),
			SortOption::SubTier => Arc::new(SubTierFirst),
			SortOption::TimesQueued => Arc::new(TimesQueuedFirst),
			SortOption::TimeJoined => Arc::new(TimeJoined),
		}
	}

	/// Label shown to operators.
	pub fn label(self) -> &'static str {
		match self {
			SortOption::TimesQueuedSubTier => "Times queued, Sub tier",
			SortOption::SubTier => "Sub tier",
			SortOption::TimesQueued => "Times queued",
			SortOption::TimeJoined => "Time joined",
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SortOption::TimesQueuedSubTier => "times-queued-sub-tier",
			SortOption::SubTier => "sub-tier",
			SortOption::TimesQueued => "times-queued",
			SortOption::TimeJoined => "time-joined",
		}
	}
}

impl fmt::Display for SortOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort option `{0}` (expected one of: times-queued-sub-tier, sub-tier, times-queued, time-joined)")]
pub struct UnknownSortOption(pub String);

impl std::str::FromStr for SortOption {
	type Err = UnknownSortOption;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
		SortOption::ALL
			.into_iter()
			.find(|option| option.as_str() == normalized)
			.ok_or_else(|| UnknownSortOption(s.to_string()))
	}
}
