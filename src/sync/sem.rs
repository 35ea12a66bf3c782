//! Counting semaphore (spec.md §4.7).

use core::cell::UnsafeCell;

use crate::core::critical::{critical_section, is_isr_context};
use crate::core::error::{OsError, OsResult};
use crate::core::kernel;
use crate::core::list::TaskList;
use crate::core::sched::os_sched;
use crate::core::task::{task_wait, task_wake};
use crate::core::types::{OsSemCtr, OsTick, PendStatus};

/// A counting semaphore: a count plus the list of tasks blocked waiting
/// for it to become nonzero. No maximum beyond the 255 a `u8` holds.
pub struct OsSem {
    count: OsSemCtr,
    blocked: TaskList,
    #[cfg(feature = "defmt")]
    name: &'static str,
}

impl OsSem {
    pub const fn new(count: OsSemCtr) -> Self {
        OsSem {
            count,
            blocked: TaskList::new(),
            #[cfg(feature = "defmt")]
            name: "",
        }
    }

    pub fn create(&mut self, count: OsSemCtr, _name: &'static str) {
        critical_section(|_cs| {
            self.count = count;
            self.blocked = TaskList::new();
            #[cfg(feature = "defmt")]
            {
                self.name = _name;
            }
        });
    }

    /// Take the semaphore, blocking up to `timeout` ticks if its count is
    /// zero.
    pub fn take(&mut self, timeout: OsTick) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            if self.count > 0 {
                self.count -= 1;
                return Ok(());
            }

            match task_wait(&mut self.blocked, timeout) {
                PendStatus::Timeout => Err(OsError::Timeout),
                PendStatus::Ok => Ok(()),
            }
        })
    }

    /// ISR-safe, non-blocking take: never waits, returns `Failed` instead
    /// if the count is currently zero.
    pub fn take_isr(&mut self) -> OsResult<()> {
        critical_section(|_cs| {
            if self.count > 0 {
                self.count -= 1;
                Ok(())
            } else {
                Err(OsError::Failed)
            }
        })
    }

    /// Give the semaphore: wake the highest-priority waiter if one is
    /// blocked, otherwise increment the count (saturating at `u8::MAX`;
    /// the source silently wraps here, which this rewrite treats as a
    /// bug rather than a feature).
    pub fn give(&mut self) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }
        self.give_inner();
        Ok(())
    }

    /// ISR-safe variant of [`give`](Self::give). The logic is identical —
    /// `give` never blocks either — but a dedicated name keeps the
    /// task/ISR call-site distinction explicit, matching the other
    /// primitives.
    pub fn give_isr(&mut self) {
        self.give_inner();
    }

    fn give_inner(&mut self) {
        critical_section(|_cs| unsafe {
            let links = kernel::links();
            match self.blocked.highest_priority(&links, |id| kernel::task(id).prio) {
                Some(next) => {
                    task_wake(&mut self.blocked, next);
                    os_sched();
                }
                None => self.count = self.count.saturating_add(1),
            }
        });
    }

    #[inline]
    pub fn count(&self) -> OsSemCtr {
        self.count
    }
}

impl Default for OsSem {
    fn default() -> Self {
        Self::new(0)
    }
}

/// `Sync` wrapper so a semaphore can live in a `static`.
pub struct Semaphore {
    inner: UnsafeCell<OsSem>,
}

unsafe impl Sync for Semaphore {}
unsafe impl Send for Semaphore {}

impl Semaphore {
    pub const fn new(count: OsSemCtr) -> Self {
        Semaphore { inner: UnsafeCell::new(OsSem::new(count)) }
    }

    pub fn create(&self, count: OsSemCtr, name: &'static str) {
        unsafe { (*self.inner.get()).create(count, name) }
    }

    pub fn wait(&self, timeout: OsTick) -> OsResult<()> {
        unsafe { (*self.inner.get()).take(timeout) }
    }

    pub fn wait_isr(&self) -> OsResult<()> {
        unsafe { (*self.inner.get()).take_isr() }
    }

    pub fn signal(&self) -> OsResult<()> {
        unsafe { (*self.inner.get()).give() }
    }

    pub fn signal_isr(&self) {
        unsafe { (*self.inner.get()).give_isr() }
    }

    #[inline]
    pub fn count(&self) -> OsSemCtr {
        unsafe { (*self.inner.get()).count() }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{self, test_lock};
    use crate::core::task::create_task;
    use crate::core::types::{OsPrio, OsStkElement, TaskId, TaskState};

    static mut STK_A: [OsStkElement; 32] = [0; 32];
    static mut STK_B: [OsStkElement; 32] = [0; 32];

    fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    unsafe fn spawn(prio: OsPrio, stk: &'static mut [OsStkElement]) -> TaskId {
        unsafe {
            let id = kernel::alloc_task_id().unwrap();
            create_task(id, "t", dummy, core::ptr::null_mut(), prio, stk.as_mut_ptr(), stk.len()).unwrap();
            id
        }
    }

    #[test]
    fn take_decrements_a_positive_count() {
        let mut s = OsSem::new(2);
        assert!(s.take(10).is_ok());
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn take_with_zero_timeout_fails_fast_on_empty_count() {
        let mut s = OsSem::new(0);
        assert_eq!(s.take(0).unwrap_err(), OsError::Timeout);
    }

    #[test]
    fn take_isr_returns_failed_instead_of_blocking() {
        let mut s = OsSem::new(0);
        assert_eq!(s.take_isr().unwrap_err(), OsError::Failed);
    }

    #[test]
    fn give_increments_count_when_nobody_is_waiting() {
        let mut s = OsSem::new(0);
        s.give().unwrap();
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn give_wakes_the_highest_priority_waiter_instead_of_incrementing() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let low = spawn(2, &mut STK_A);
            let high = spawn(9, &mut STK_B);

            let mut s = OsSem::new(0);
            // hand-construct the state `task_wait` would have left behind,
            // since this host port can't suspend and resume within one
            // synchronous call.
            s.blocked.insert_tail(&mut kernel::links(), low);
            kernel::task(low).state = TaskState::Blocked;
            kernel::task(low).waiting = true;
            s.blocked.insert_tail(&mut kernel::links(), high);
            kernel::task(high).state = TaskState::Blocked;
            kernel::task(high).waiting = true;

            s.give().unwrap();

            assert_eq!(s.count(), 0, "count stays zero, ownership transferred directly");
            assert_eq!(kernel::task(high).state, TaskState::Ready, "highest-priority waiter wakes first");
            assert_eq!(kernel::task(low).state, TaskState::Blocked, "lower-priority waiter stays blocked");
            assert_eq!(kernel::ready_head(9), Some(high));
        }
    }

    #[test]
    fn count_saturates_instead_of_wrapping() {
        let mut s = OsSem::new(u8::MAX);
        s.give().unwrap();
        assert_eq!(s.count(), u8::MAX);
    }
}
