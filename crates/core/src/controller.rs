//! Queue façade used by the chat-command layer and front ends.
//!
//! Owns the times-queued history (the store itself never counts) and
//! publishes fresh snapshots on the [`EventBus`] after each successful
//! mutation.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::info;

use crate::entry::QueueEntry;
use crate::events::{Event, EventBus};
use crate::sort::SortOption;
use crate::store::QueueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
	Joined,
	AlreadyQueued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
	Left,
	/// The viewer has already been picked and can no longer leave on their own.
	IsSelected,
	NotQueued,
}

#[derive(Debug)]
pub struct QueueController {
	store: QueueStore,
	history: RwLock<HashMap<String, u32>>,
	bus: EventBus,
}

impl QueueController {
	pub fn new(bus: EventBus, sort: SortOption) -> Self {
		Self {
			store: QueueStore::with_policy(sort.policy()),
			history: RwLock::new(HashMap::new()),
			bus,
		}
	}

	pub fn store(&self) -> &QueueStore {
		&self.store
	}

	pub fn bus(&self) -> &EventBus {
		&self.bus
	}

	/// Number of completed selections recorded for `username`.
	pub fn times_queued(&self, username: &str) -> u32 {
		self.history.read().get(username).copied().unwrap_or(0)
	}

	/// Handles `!join`.
	pub fn join(&self, username: &str, sub_tier: u32, joined_at: f64) -> JoinOutcome {
		let times_queued = self.times_queued(username);
		if !self.store.enqueue(username, sub_tier, times_queued, joined_at) {
			return JoinOutcome::AlreadyQueued;
		}
		info!(target = "viewerq.queue", %username, sub_tier, times_queued, "viewer joined");
		self.publish_waiting();
		JoinOutcome::Joined
	}

	/// Handles `!leave`.
	pub fn leave(&self, username: &str) -> LeaveOutcome {
		if self.store.is_selected(username) {
			return LeaveOutcome::IsSelected;
		}
		if !self.store.remove_from_queue(username) {
			return LeaveOutcome::NotQueued;
		}
		info!(target = "viewerq.queue", %username, "viewer left");
		self.publish_waiting();
		LeaveOutcome::Left
	}

	/// Picks a waiting viewer.
	pub fn select(&self, username: &str) -> bool {
		let moved = self.store.move_to_selected(username);
		if moved {
			self.publish_both();
		}
		moved
	}

	/// Returns a selected viewer to the waiting list.
	pub fn unselect(&self, username: &str) -> bool {
		let moved = self.store.move_back_to_queue(username);
		if moved {
			self.publish_both();
		}
		moved
	}

	/// Drops a selected viewer; `counted` bumps their history so they sort
	/// behind first-timers next time they join.
	pub fn complete(&self, username: &str, counted: bool) -> bool {
		if !self.store.remove_selected(username, counted) {
			return false;
		}
		if counted {
			*self.history.write().entry(username.to_string()).or_insert(0) += 1;
		}
		self.publish_selected();
		true
	}

	pub fn set_sort_option(&self, option: SortOption) {
		self.store.set_policy(option.policy());
		self.publish_waiting();
	}

	pub fn waiting(&self) -> Vec<QueueEntry> {
		self.store.snapshot_waiting()
	}

	pub fn selected(&self) -> Vec<QueueEntry> {
		self.store.snapshot_selected()
	}

	fn publish_waiting(&self) {
		self.bus.publish(Event::QueueChanged {
			waiting: self.store.snapshot_waiting(),
		});
	}

	fn publish_selected(&self) {
		self.bus.publish(Event::SelectedChanged {
			selected: self.store.snapshot_selected(),
		});
	}

	fn publish_both(&self) {
		let (waiting, selected) = self.store.snapshot();
		self.bus.publish(Event::QueueChanged { waiting });
		self.bus.publish(Event::SelectedChanged { selected });
	}
}
