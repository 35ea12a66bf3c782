//! Core type definitions
//!
//! Strong type aliases for the handful of primitive types the kernel
//! passes around, plus the small state enums used by the task state
//! machine and the blocking-primitive wait/wake contract.

/// Task priority. 0 is lowest (reserved for the idle task),
/// `config::MAX_PRIORITY_LEVEL` is highest.
pub type OsPrio = u8;

/// Tick counter / timeout type, in ticks.
pub type OsTick = u32;

/// Semaphore counter type.
pub type OsSemCtr = u8;

/// Event-flag bitset. Only the low 8 bits are significant.
pub type OsFlags = u8;

/// Stack element type.
pub type OsStkElement = u32;

/// Index into the static task table. Assigned at creation, equal to
/// insertion order.
pub type TaskId = u8;

/// Task state. RUNNING is implicit: the single task referenced by the
/// kernel's `running_task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Task is on its priority's ready ring.
    Ready = 0,
    /// Task is on a primitive's blocked ring, armed with a timeout, or
    /// both.
    Blocked = 1,
}

/// Outcome of a wait on a blocking primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PendStatus {
    /// Woken by a release/signal on the primitive.
    Ok = 0,
    /// Timeout elapsed before a release/signal arrived.
    Timeout = 1,
}
