//! Synchronized two-list queue store.
//!
//! Every mutation runs under a single write guard, so a reader never observes
//! a username in both lists (or in neither) halfway through a move. Expected
//! outcomes such as duplicates and missing usernames are reported as `false`.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::entry::QueueEntry;
use crate::sort::{SortOption, SortPolicy};

#[derive(Debug)]
struct Slot {
	entry: QueueEntry,
	/// Insertion sequence; breaks ties between entries the policy considers
	/// equal. Kept while selected so a move back restores the old position.
	seq: u64,
}

#[derive(Debug)]
struct QueueState {
	waiting: Vec<Slot>,
	selected: Vec<Slot>,
	policy: Arc<dyn SortPolicy>,
	next_seq: u64,
}

impl QueueState {
	fn contains(&self, username: &str) -> bool {
		self.waiting_index(username).is_some() || self.selected_index(username).is_some()
	}

	fn waiting_index(&self, username: &str) -> Option<usize> {
		self.waiting.iter().position(|slot| slot.entry.username == username)
	}

	fn selected_index(&self, username: &str) -> Option<usize> {
		self.selected.iter().position(|slot| slot.entry.username == username)
	}

	fn push_waiting(&mut self, entry: QueueEntry) {
		let seq = self.next_seq;
		self.next_seq += 1;
		self.insert_waiting(Slot { entry, seq });
	}

	fn insert_waiting(&mut self, slot: Slot) {
		self.waiting.push(slot);
		self.sort();
	}

	fn sort(&mut self) {
		let policy = Arc::clone(&self.policy);
		self.waiting
			.sort_by(|a, b| policy.compare(&a.entry, &b.entry).then_with(|| a.seq.cmp(&b.seq)));
	}
}

/// In-memory waiting/selected store ordered by a [`SortPolicy`].
#[derive(Debug)]
pub struct QueueStore {
	state: RwLock<QueueState>,
}

impl Default for QueueStore {
	fn default() -> Self {
		Self::new()
	}
}

impl QueueStore {
	/// Creates an empty store using the default ordering.
	pub fn new() -> Self {
		Self::with_policy(SortOption::default().policy())
	}

	pub fn with_policy(policy: Arc<dyn SortPolicy>) -> Self {
		Self {
			state: RwLock::new(QueueState {
				waiting: Vec::new(),
				selected: Vec::new(),
				policy,
				next_seq: 0,
			}),
		}
	}

	/// Replaces the ordering strategy and re-sorts the waiting list.
	pub fn set_policy(&self, policy: Arc<dyn SortPolicy>) {
		let mut state = self.state.write();
		debug!(target = "viewerq.queue", from = state.policy.name(), to = policy.name(), "sort policy changed");
		state.policy = policy;
		state.sort();
	}

	pub fn policy_name(&self) -> &'static str {
		self.state.read().policy.name()
	}

	/// Adds a viewer to the waiting list.
	///
	/// Returns `false` without mutating anything if the username is already
	/// waiting or selected.
	pub fn enqueue(&self, username: &str, sub_tier: u32, times_queued: u32, join_timestamp: f64) -> bool {
		let mut state = self.state.write();
		if state.contains(username) {
			debug!(target = "viewerq.queue", %username, "enqueue rejected: already present");
			return false;
		}
		state.push_waiting(QueueEntry::new(username, sub_tier, times_queued, join_timestamp));
		debug!(target = "viewerq.queue", %username, sub_tier, times_queued, "enqueued");
		true
	}

	/// Removes a viewer from the waiting list only.
	pub fn remove_from_queue(&self, username: &str) -> bool {
		let mut state = self.state.write();
		match state.waiting_index(username) {
			Some(index) => {
				state.waiting.remove(index);
				debug!(target = "viewerq.queue", %username, "removed from waiting");
				true
			}
			None => false,
		}
	}

	/// Removes a viewer from the selected list.
	///
	/// `count_toward_history` is recorded in the log only; history itself is
	/// kept by the caller (see [`QueueController::complete`](crate::QueueController::complete)).
	pub fn remove_selected(&self, username: &str, count_toward_history: bool) -> bool {
		let mut state = self.state.write();
		match state.selected_index(username) {
			Some(index) => {
				state.selected.remove(index);
				debug!(target = "viewerq.queue", %username, counted = count_toward_history, "removed from selected");
				true
			}
			None => false,
		}
	}

	/// Moves a viewer from waiting to the end of selected.
	pub fn move_to_selected(&self, username: &str) -> bool {
		let mut state = self.state.write();
		let Some(index) = state.waiting_index(username) else {
			return false;
		};
		let slot = state.waiting.remove(index);
		state.selected.push(slot);
		debug!(target = "viewerq.queue", %username, "moved to selected");
		true
	}

	/// Moves a viewer from selected back into the waiting list and re-sorts.
	pub fn move_back_to_queue(&self, username: &str) -> bool {
		let mut state = self.state.write();
		let Some(index) = state.selected_index(username) else {
			return false;
		};
		let slot = state.selected.remove(index);
		state.insert_waiting(slot);
		debug!(target = "viewerq.queue", %username, "moved back to waiting");
		true
	}

	/// Ordered copy of the waiting list.
	pub fn snapshot_waiting(&self) -> Vec<QueueEntry> {
		self.state.read().waiting.iter().map(|slot| slot.entry.clone()).collect()
	}

	/// Copy of the selected list in selection order.
	pub fn snapshot_selected(&self) -> Vec<QueueEntry> {
		self.state.read().selected.iter().map(|slot| slot.entry.clone()).collect()
	}

	/// Both lists taken under one read guard.
	pub fn snapshot(&self) -> (Vec<QueueEntry>, Vec<QueueEntry>) {
		let state = self.state.read();
		(
			state.waiting.iter().map(|slot| slot.entry.clone()).collect(),
			state.selected.iter().map(|slot| slot.entry.clone()).collect(),
		)
	}

	pub fn contains(&self, username: &str) -> bool {
		self.state.read().contains(username)
	}

	pub fn is_waiting(&self, username: &str) -> bool {
		self.state.read().waiting_index(username).is_some()
	}

	pub fn is_selected(&self, username: &str) -> bool {
		self.state.read().selected_index(username).is_some()
	}

	pub fn len_waiting(&self) -> usize {
		self.state.read().waiting.len()
	}

	pub fn len_selected(&self) -> usize {
		self.state.read().selected.len()
	}
}
