//! Mutex with priority inheritance (spec.md §4.6).
//!
//! No recursion: a task that already holds the mutex and acquires it
//! again would simply re-enter this same code path and deadlock against
//! itself — nested acquisition by the same holder is out of scope, unlike
//! the teacher's `nesting_ctr`-counted recursive mutex.

use core::cell::UnsafeCell;

use crate::core::critical::{critical_section, is_isr_context};
use crate::core::error::{OsError, OsResult};
use crate::core::kernel;
use crate::core::list::TaskList;
use crate::core::sched::os_sched;
use crate::core::task::{task_wait, task_wake};
use crate::core::types::{OsPrio, OsTick, PendStatus, TaskId};

/// Mutex state: the current holder (if any), the priority it held before
/// any inheritance boost, and the list of tasks waiting to acquire it.
pub struct OsMutex {
    holder: Option<TaskId>,
    /// Set only on first acquisition by a holder, never overwritten by a
    /// later inheritance boost (spec.md I7/§4.6a).
    original_priority: OsPrio,
    blocked: TaskList,
    #[cfg(feature = "defmt")]
    name: &'static str,
}

impl OsMutex {
    pub const fn new() -> Self {
        OsMutex {
            holder: None,
            original_priority: 0,
            blocked: TaskList::new(),
            #[cfg(feature = "defmt")]
            name: "",
        }
    }

    pub fn create(&mut self, _name: &'static str) {
        critical_section(|_cs| {
            self.holder = None;
            self.original_priority = 0;
            self.blocked = TaskList::new();
            #[cfg(feature = "defmt")]
            {
                self.name = _name;
            }
        });
    }

    /// Acquire the mutex, blocking up to `timeout` ticks if it is held.
    ///
    /// If the holder's priority is lower than the caller's, the holder is
    /// boosted to the caller's priority for as long as it holds the
    /// mutex (priority inheritance).
    pub fn acquire(&mut self, timeout: OsTick) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            let running = kernel::running_id().expect("mutex acquire called before os_start");

            let Some(holder_id) = self.holder else {
                self.holder = Some(running);
                self.original_priority = kernel::task(running).prio;
                return Ok(());
            };

            let waiter_prio = kernel::task(running).prio;
            let holder_prio = kernel::task(holder_id).prio;
            if waiter_prio > holder_prio {
                if kernel::task(holder_id).is_ready() {
                    kernel::ready_remove(holder_id, holder_prio);
                    kernel::task(holder_id).prio = waiter_prio;
                    kernel::ready_insert(holder_id, waiter_prio, false);
                } else {
                    kernel::task(holder_id).prio = waiter_prio;
                }
                crate::log::debug!("mutex: boosted holder {} to priority {}", holder_id, waiter_prio);
            }

            match task_wait(&mut self.blocked, timeout) {
                PendStatus::Timeout => Err(OsError::Timeout),
                PendStatus::Ok => {
                    let me = kernel::running_id().expect("resumed task has no running_task");
                    debug_assert_eq!(self.holder, Some(me), "release did not transfer ownership");
                    self.original_priority = kernel::task(me).prio;
                    Ok(())
                }
            }
        })
    }

    /// Release the mutex. Restores the caller's priority if it had been
    /// boosted by inheritance, then wakes the highest-priority waiter (if
    /// any), transferring ownership directly to it.
    ///
    /// `spec.md` §9 notes the source never validates the caller is the
    /// holder; this rewrite debug-asserts it and additionally returns
    /// `MutexNotOwner` so a release build fails safely rather than
    /// corrupting the mutex.
    pub fn release(&mut self) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            let running = kernel::running_id().expect("mutex release called before os_start");

            debug_assert_eq!(
                self.holder,
                Some(running),
                "mutex released by a task that is not the holder"
            );
            if self.holder != Some(running) {
                return Err(OsError::MutexNotOwner);
            }

            let cur_prio = kernel::task(running).prio;
            if cur_prio != self.original_priority {
                if kernel::task(running).is_ready() {
                    kernel::ready_remove(running, cur_prio);
                    kernel::task(running).prio = self.original_priority;
                    kernel::ready_insert(running, self.original_priority, false);
                } else {
                    kernel::task(running).prio = self.original_priority;
                }
            }

            self.holder = None;

            let links = kernel::links();
            if let Some(next) = self.blocked.highest_priority(&links, |id| kernel::task(id).prio) {
                task_wake(&mut self.blocked, next);
                self.holder = Some(next);
                self.original_priority = kernel::task(next).prio;
                os_sched();
            }

            Ok(())
        })
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    #[inline]
    pub fn holder(&self) -> Option<TaskId> {
        self.holder
    }
}

impl Default for OsMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// `Sync` wrapper so a mutex can live in a `static`. Every `OsMutex`
/// method already serializes itself through a critical section, so the
/// cell never needs to hand out overlapping access.
pub struct Mutex {
    inner: UnsafeCell<OsMutex>,
}

unsafe impl Sync for Mutex {}
unsafe impl Send for Mutex {}

impl Mutex {
    pub const fn new() -> Self {
        Mutex { inner: UnsafeCell::new(OsMutex::new()) }
    }

    pub fn create(&self, name: &'static str) {
        unsafe { (*self.inner.get()).create(name) }
    }

    pub fn lock(&self, timeout: OsTick) -> OsResult<()> {
        unsafe { (*self.inner.get()).acquire(timeout) }
    }

    pub fn unlock(&self) -> OsResult<()> {
        unsafe { (*self.inner.get()).release() }
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        unsafe { (*self.inner.get()).is_held() }
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}
