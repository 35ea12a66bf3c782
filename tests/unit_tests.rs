//! Black-box tests against `daedalus_os`'s public API.
//!
//! These run on the host, against `port::sim`, which has no real context
//! switch — so only what's genuinely observable through the public API in
//! one synchronous call is covered here: configuration sanity, error/state
//! enum semantics, and `timeout = 0` non-blocking polls (which bypass the
//! suspend point the sim port can't emulate). Scheduling, blocking and
//! waking are covered by the internal `#[cfg(test)]` modules inside the
//! crate itself, which can drive `pub(crate)` kernel state directly.

use daedalus_os::config::{CFG_STK_SIZE_MIN, MAX_NUM_TASKS, MAX_PRIORITY_LEVEL, OS_CLK_HZ, PRIO_IDLE, PRIO_LEVELS};
use daedalus_os::error::OsError;
use daedalus_os::types::{PendStatus, TaskState};

#[test]
fn config_values_are_internally_consistent() {
    assert!(MAX_NUM_TASKS >= 2, "at least the idle task plus one application task");
    assert!(MAX_NUM_TASKS <= 255, "TaskId is a u8 index");
    assert_eq!(PRIO_LEVELS, MAX_PRIORITY_LEVEL as usize + 1);
    assert_eq!(PRIO_IDLE, 0, "idle sits at the lowest priority");
    assert!(CFG_STK_SIZE_MIN >= 16, "stack minimum must hold an initial exception frame");
    assert!(OS_CLK_HZ > 0);
}

#[test]
fn error_equality_and_debug() {
    assert_eq!(OsError::Timeout, OsError::Timeout);
    assert_ne!(OsError::Timeout, OsError::Failed);
    assert!(OsError::Timeout.is_timeout());
    assert!(!OsError::Timeout.is_failed());
    assert!(OsError::Failed.is_failed());
    let _ = format!("{:?}", OsError::MutexNotOwner);
}

#[test]
fn task_state_and_pend_status_enums() {
    assert_eq!(TaskState::Ready, TaskState::Ready);
    assert_ne!(TaskState::Ready, TaskState::Blocked);
    assert_eq!(PendStatus::Ok, PendStatus::Ok);
    assert_ne!(PendStatus::Ok, PendStatus::Timeout);
}

#[cfg(feature = "sem")]
mod sem_black_box {
    use daedalus_os::error::OsError;
    use daedalus_os::sem::OsSem;

    #[test]
    fn take_without_create_defaults_to_empty() {
        let mut sem = OsSem::default();
        assert_eq!(sem.count(), 0);
        assert_eq!(sem.take(0).unwrap_err(), OsError::Timeout);
    }

    #[test]
    fn give_then_take_round_trips() {
        let mut sem = OsSem::new(0);
        sem.give().unwrap();
        assert_eq!(sem.count(), 1);
        sem.take(0).unwrap();
        assert_eq!(sem.count(), 0);
    }
}

#[cfg(feature = "queue")]
mod queue_black_box {
    use daedalus_os::error::OsError;
    use daedalus_os::queue::OsQueue;

    #[test]
    fn rejects_mismatched_item_size() {
        static mut STORAGE: [u8; 8] = [0; 8];
        let mut q = OsQueue::new();
        unsafe { q.create(&mut STORAGE, 4, "q") };
        assert_eq!(q.insert(&[1, 2, 3], 0).unwrap_err(), OsError::QueueItemSize);
    }

    #[test]
    fn empty_queue_retrieve_times_out_without_blocking() {
        static mut STORAGE: [u8; 8] = [0; 8];
        let mut q = OsQueue::new();
        unsafe { q.create(&mut STORAGE, 4, "q") };
        let mut out = [0u8; 4];
        assert_eq!(q.retrieve(&mut out, 0).unwrap_err(), OsError::Timeout);
    }
}

#[cfg(feature = "event")]
mod event_black_box {
    use daedalus_os::error::OsError;
    use daedalus_os::event::OsEventGroup;

    #[test]
    fn wait_on_a_fresh_group_times_out() {
        let mut g = OsEventGroup::new();
        assert_eq!(g.wait(0b1, 0).unwrap_err(), OsError::Timeout);
        assert_eq!(g.flags(), 0);
    }

    #[test]
    fn set_then_wait_matches_and_clears() {
        let mut g = OsEventGroup::new();
        g.set(0b11);
        assert_eq!(g.flags(), 0b11);
        g.wait(0b11, 0).unwrap();
        assert_eq!(g.flags(), 0);
    }
}

#[cfg(feature = "mutex")]
mod mutex_black_box {
    use daedalus_os::mutex::OsMutex;

    #[test]
    fn fresh_mutex_is_not_held() {
        let m = OsMutex::new();
        assert!(!m.is_held());
        assert_eq!(m.holder(), None);
    }
}
