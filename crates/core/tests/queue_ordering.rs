use std::cmp::Ordering;

use viewerq::{QueueEntry, QueueStore, SortOption, SortPolicy};

/// Small deterministic generator so the sequences are reproducible.
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> u64 {
		self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
		self.0 >> 33
	}

	fn below(&mut self, bound: u64) -> u64 {
		self.next() % bound
	}
}

fn assert_sorted(store: &QueueStore, policy: &dyn SortPolicy) {
	let waiting = store.snapshot_waiting();
	for pair in waiting.windows(2) {
		assert_ne!(
			policy.compare(&pair[0], &pair[1]),
			Ordering::Greater,
			"{} sorted after {}",
			pair[0].username,
			pair[1].username
		);
	}
}

fn assert_disjoint(store: &QueueStore) {
	let (waiting, selected) = store.snapshot();
	for entry in &waiting {
		assert!(
			!selected.iter().any(|s| s.username == entry.username),
			"{} is in both lists",
			entry.username
		);
	}
}

#[test]
fn distinct_enqueues_grow_waiting_by_one_and_stay_sorted() {
	for option in SortOption::ALL {
		let policy = option.policy();
		let store = QueueStore::with_policy(option.policy());
		let mut rng = Lcg(7 + option as u64);

		for i in 0..200 {
			let before = store.len_waiting();
			let entry = QueueEntry::new(
				format!("viewer{i}"),
				rng.below(4) as u32,
				rng.below(3) as u32,
				rng.below(10_000) as f64 / 10.0,
			);
			assert!(store.enqueue(&entry.username, entry.sub_tier, entry.times_queued, entry.join_timestamp));
			assert_eq!(store.len_waiting(), before + 1);
			assert_sorted(&store, policy.as_ref());
		}
	}
}

#[test]
fn random_mutation_sequences_preserve_invariants() {
	let store = QueueStore::new();
	let policy = SortOption::default().policy();
	let mut rng = Lcg(42);

	for _ in 0..2_000 {
		let name = format!("u{}", rng.below(25));
		let total_before = store.len_waiting() + store.len_selected();
		let changed = match rng.below(5) {
			0 => store.enqueue(&name, rng.below(4) as u32, rng.below(3) as u32, rng.below(1_000) as f64),
			1 => store.remove_from_queue(&name),
			2 => store.move_to_selected(&name),
			3 => store.move_back_to_queue(&name),
			_ => store.remove_selected(&name, rng.below(2) == 0),
		};
		let total_after = store.len_waiting() + store.len_selected();
		if !changed {
			assert_eq!(total_before, total_after);
		}
		assert_sorted(&store, policy.as_ref());
		assert_disjoint(&store);
	}
}

#[test]
fn failed_calls_stay_failed_when_repeated() {
	let store = QueueStore::new();
	assert!(store.enqueue("a", 0, 0, 1.0));
	for _ in 0..3 {
		assert!(!store.enqueue("a", 0, 0, 1.0));
		assert!(!store.move_back_to_queue("a"));
		assert!(!store.remove_selected("a", true));
		assert!(!store.remove_from_queue("ghost"));
	}
	assert_eq!(store.len_waiting(), 1);
}

#[test]
fn concurrent_writers_never_break_membership() {
	let store = std::sync::Arc::new(QueueStore::new());
	let handles: Vec<_> = (0..8)
		.map(|worker| {
			let store = std::sync::Arc::clone(&store);
			std::thread::spawn(move || {
				let mut rng = Lcg(worker);
				for _ in 0..500 {
					let name = format!("u{}", rng.below(10));
					match rng.below(4) {
						0 => {
							store.enqueue(&name, 0, 0, rng.below(100) as f64);
						}
						1 => {
							store.move_to_selected(&name);
						}
						2 => {
							store.move_back_to_queue(&name);
						}
						_ => {
							store.remove_selected(&name, false);
						}
					}
					assert_disjoint(&store);
				}
			})
		})
		.collect();

	for handle in handles {
		handle.join().unwrap();
	}
	assert_disjoint(&store);
}
