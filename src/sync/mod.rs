//! Inter-task synchronization primitives: mutex, semaphore, queue, event
//! group. Each is a small amount of state plus a blocked [`TaskList`] and
//! shares the `task_wait`/`task_wake` contract from `core::task`.

#[cfg(feature = "event")]
pub mod event;
#[cfg(feature = "mutex")]
pub mod mutex;
#[cfg(feature = "queue")]
pub mod queue;
#[cfg(feature = "sem")]
pub mod sem;
