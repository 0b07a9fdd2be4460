//! Viewer queue engine.
//!
//! The queue is split into two lists: viewers *waiting* to be picked and
//! viewers already *selected*. A username lives in at most one of them.
//! The waiting list is always ordered by a pluggable [`SortPolicy`].
//!
//! - [`QueueStore`]: the synchronized two-list store
//! - [`QueueController`]: history bookkeeping and change notifications
//! - [`EventBus`]: one-way broadcast of queue and connection events

pub mod controller;
pub mod entry;
pub mod events;
pub mod sort;
pub mod store;

pub use controller::{JoinOutcome, LeaveOutcome, QueueController};
pub use entry::{QueueEntry, now_ts};
pub use events::{Event, EventBus, StatusLevel, StatusMessage};
pub use sort::{SortOption, SortPolicy, UnknownSortOption};
pub use store::QueueStore;
