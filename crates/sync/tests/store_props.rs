//! Property tests for the store's core invariants: terminal absorption,
//! progress monotonicity, and the bounded-memory guarantee.

use proptest::prelude::*;

use mediamill_sync::{JobStore, MAX_TRACKED_JOBS};
use mediamill_types::{JobRecord, JobStatus, JobType, JobUpdate};

fn arb_status() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Pending),
        Just(JobStatus::Processing),
        Just(JobStatus::Completed),
        Just(JobStatus::Failed),
        Just(JobStatus::Cancelled),
    ]
}

fn arb_update() -> impl Strategy<Value = JobUpdate> {
    (
        proptest::option::of(arb_status()),
        proptest::option::of(-50i64..250),
        proptest::option::of("[a-z]{0,8}"),
    )
        .prop_map(|(status, progress, message)| JobUpdate {
            status,
            progress,
            message,
            ..JobUpdate::default()
        })
}

proptest! {
    /// For any update sequence: progress stays in range and never
    /// decreases while non-terminal, and a terminal record absorbs every
    /// further update unchanged.
    #[test]
    fn progress_monotonic_and_terminal_absorbing(
        updates in proptest::collection::vec(arb_update(), 0..40)
    ) {
        let store = JobStore::new();
        store.insert(JobRecord::submitted("j-1", JobType::ImageConvert));

        let mut last_progress = 0u8;
        let mut terminal_snapshot: Option<JobRecord> = None;

        for update in updates {
            store.apply_update("j-1", update);
            let record = store.get("j-1").unwrap();
            prop_assert!(record.progress <= 100);

            if let Some(snapshot) = &terminal_snapshot {
                prop_assert_eq!(&record, snapshot);
            } else if record.is_terminal() {
                terminal_snapshot = Some(record);
            } else {
                prop_assert!(record.progress >= last_progress);
                last_progress = record.progress;
            }
        }
    }

    /// After inserting N distinct ids the store holds exactly
    /// min(N, cap), and the newest insertion always survives.
    #[test]
    fn store_bounded_at_cap(count in 1usize..300) {
        let store = JobStore::new();
        for i in 0..count {
            store.insert(JobRecord::submitted(format!("j-{i}"), JobType::ImageConvert));
        }

        prop_assert_eq!(store.len(), count.min(MAX_TRACKED_JOBS));
        let newest = format!("j-{}", count - 1);
        prop_assert!(store.get(&newest).is_some());
        if count > MAX_TRACKED_JOBS {
            prop_assert!(store.get("j-0").is_none());
        }
    }
}
