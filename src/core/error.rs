//! Error type
//!
//! Recoverable outcomes only: a blocking wait that timed out, or an
//! ISR-safe variant that could not proceed immediately. Programming errors
//! — too many tasks, a bad priority, operating on an uninitialised
//! primitive, releasing a mutex you don't hold — are contract violations,
//! not recoverable conditions, and are caught by `assert!`/`debug_assert!`
//! rather than represented here.

/// Kernel error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OsError {
    /// Blocking wait elapsed without the resource becoming available.
    Timeout = 1,
    /// ISR-safe non-blocking variant found the resource unavailable.
    Failed = 2,
    /// Function cannot be called from ISR context.
    IsrContext = 3,
    /// `os_init` has not been called yet.
    NotInitialized = 4,
    /// `os_start` has already been called.
    AlreadyRunning = 5,
    /// Operation requires the kernel to be running.
    NotRunning = 6,
    /// Invalid priority (>= `MAX_PRIORITY_LEVEL` + 1).
    PrioInvalid = 7,
    /// Null or otherwise invalid stack pointer.
    StkInvalid = 8,
    /// Stack smaller than `config::CFG_STK_SIZE_MIN`.
    StkSizeInvalid = 9,
    /// `MAX_NUM_TASKS` already created.
    TaskNoMoreTcb = 10,
    /// Task id does not name a created task.
    TaskInvalid = 11,
    /// Wrong object type passed to a primitive operation.
    ObjType = 12,
    /// Caller does not hold the mutex it tried to release.
    MutexNotOwner = 13,
    /// Queue item size mismatch.
    QueueItemSize = 14,
}

/// Result type alias for kernel operations.
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    #[inline]
    pub fn is_timeout(self) -> bool {
        matches!(self, OsError::Timeout)
    }

    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, OsError::Failed)
    }
}
