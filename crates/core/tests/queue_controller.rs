use tokio::sync::broadcast::error::TryRecvError;
use viewerq::{Event, EventBus, JoinOutcome, LeaveOutcome, QueueController, SortOption};

fn names(entries: &[viewerq::QueueEntry]) -> Vec<&str> {
	entries.iter().map(|e| e.username.as_str()).collect()
}

#[test]
fn join_reports_duplicates_across_both_lists() {
	let controller = QueueController::new(EventBus::default(), SortOption::default());
	assert_eq!(controller.join("alice", 0, 1.0), JoinOutcome::Joined);
	assert_eq!(controller.join("alice", 0, 2.0), JoinOutcome::AlreadyQueued);
	assert!(controller.select("alice"));
	assert_eq!(controller.join("alice", 0, 3.0), JoinOutcome::AlreadyQueued);
}

#[test]
fn leave_distinguishes_selected_and_absent_viewers() {
	let controller = QueueController::new(EventBus::default(), SortOption::default());
	controller.join("bob", 1, 1.0);
	controller.join("cara", 0, 2.0);
	assert!(controller.select("bob"));

	assert_eq!(controller.leave("bob"), LeaveOutcome::IsSelected);
	assert_eq!(controller.leave("cara"), LeaveOutcome::Left);
	assert_eq!(controller.leave("cara"), LeaveOutcome::NotQueued);
	assert_eq!(names(&controller.selected()), vec!["bob"]);
}

#[test]
fn counted_completion_pushes_viewer_behind_first_timers() {
	let controller = QueueController::new(EventBus::default(), SortOption::default());
	controller.join("veteran", 3, 1.0);
	assert!(controller.select("veteran"));
	assert!(controller.complete("veteran", true));
	assert_eq!(controller.times_queued("veteran"), 1);

	controller.join("newbie", 0, 5.0);
	controller.join("veteran", 3, 6.0);
	assert_eq!(names(&controller.waiting()), vec!["newbie", "veteran"]);
	assert_eq!(controller.waiting()[1].times_queued, 1);
}

#[test]
fn uncounted_completion_leaves_history_untouched() {
	let controller = QueueController::new(EventBus::default(), SortOption::default());
	controller.join("dana", 0, 1.0);
	assert!(controller.select("dana"));
	assert!(controller.complete("dana", false));
	assert!(!controller.complete("dana", false));
	assert_eq!(controller.times_queued("dana"), 0);
}

#[test]
fn mutations_publish_fresh_snapshots() {
	let bus = EventBus::default();
	let mut rx = bus.subscribe();
	let controller = QueueController::new(bus, SortOption::default());

	controller.join("erin", 0, 1.0);
	match rx.try_recv().unwrap() {
		Event::QueueChanged { waiting } => assert_eq!(names(&waiting), vec!["erin"]),
		other => panic!("unexpected event {other:?}"),
	}

	assert!(controller.select("erin"));
	assert_eq!(rx.try_recv().unwrap(), Event::QueueChanged { waiting: vec![] });
	match rx.try_recv().unwrap() {
		Event::SelectedChanged { selected } => assert_eq!(names(&selected), vec!["erin"]),
		other => panic!("unexpected event {other:?}"),
	}

	assert_eq!(controller.join("erin", 0, 2.0), JoinOutcome::AlreadyQueued);
	assert!(!controller.select("nobody"));
	assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[test]
fn changing_sort_option_reorders_and_publishes() {
	let bus = EventBus::default();
	let mut rx = bus.subscribe();
	let controller = QueueController::new(bus, SortOption::default());
	controller.join("alice", 1, 100.0);
	controller.join("cara", 0, 10.0);
	while rx.try_recv().is_ok() {}

	controller.set_sort_option(SortOption::SubTier);
	match rx.try_recv().unwrap() {
		Event::QueueChanged { waiting } => assert_eq!(names(&waiting), vec!["alice", "cara"]),
		other => panic!("unexpected event {other:?}"),
	}
}
