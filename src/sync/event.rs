//! Event flag group (spec.md §4.9).
//!
//! An 8-bit flag set plus a blocked list. `wait` and `set` match on
//! *equality*, not subset containment: a waiter asking for `0b101` is
//! woken only by a `set(0b101)` that signals exactly those bits, never by
//! `set(0b111)`. spec.md's Design Notes flag this as an open question
//! left unresolved by the source; this rewrite keeps the equality
//! semantics and documents the choice here rather than guessing at a
//! subset match the source never implements.

use core::cell::UnsafeCell;

use crate::core::critical::{critical_section, is_isr_context};
use crate::core::error::{OsError, OsResult};
use crate::core::kernel;
use crate::core::list::{TaskList, TaskStore};
use crate::core::sched::os_sched;
use crate::core::task::{task_wait, task_wake};
use crate::core::types::{OsFlags, OsTick, PendStatus};

pub struct OsEventGroup {
    flags: OsFlags,
    blocked: TaskList,
    #[cfg(feature = "defmt")]
    name: &'static str,
}

impl OsEventGroup {
    pub const fn new() -> Self {
        OsEventGroup {
            flags: 0,
            blocked: TaskList::new(),
            #[cfg(feature = "defmt")]
            name: "",
        }
    }

    pub fn create(&mut self, _name: &'static str) {
        critical_section(|_cs| {
            self.flags = 0;
            self.blocked = TaskList::new();
            #[cfg(feature = "defmt")]
            {
                self.name = _name;
            }
        });
    }

    /// OR `flags` into the group's flags, then wake every waiter whose
    /// recorded `wait_flags` is *exactly* `flags` — not every waiter whose
    /// request is now satisfied, only the ones signalled by this
    /// particular call (equality match, see module docs).
    pub fn set(&mut self, flags: OsFlags) {
        self.set_inner(flags, false);
    }

    /// ISR-safe variant of [`set`](Self::set); `set` never blocks either,
    /// so the logic is identical, but the distinct name keeps the
    /// task/ISR call-site convention consistent with the other
    /// primitives.
    pub fn set_isr(&mut self, flags: OsFlags) {
        self.set_inner(flags, true);
    }

    fn set_inner(&mut self, flags: OsFlags, from_isr: bool) {
        critical_section(|_cs| unsafe {
            self.flags |= flags;

            let links = kernel::links();
            let mut any_woken = false;
            let mut cursor = self.blocked.head();
            while let Some(id) = cursor {
                cursor = links.next(id);
                if kernel::task(id).wait_flags == flags {
                    task_wake(&mut self.blocked, id);
                    any_woken = true;
                }
            }

            if any_woken && !from_isr {
                os_sched();
            }
        });
    }

    /// Wait for exactly `flags` to be signalled by a matching `set`,
    /// blocking up to `timeout` ticks. Clears those flags from the
    /// group before returning SUCCESS; leaves them untouched on TIMEOUT.
    pub fn wait(&mut self, flags: OsFlags, timeout: OsTick) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            if (self.flags & flags) == flags {
                self.flags &= !flags;
                return Ok(());
            }
            if timeout == 0 {
                return Err(OsError::Timeout);
            }

            let running = kernel::running_id().expect("event wait called before os_start");
            kernel::task(running).wait_flags = flags;

            match task_wait(&mut self.blocked, timeout) {
                PendStatus::Timeout => Err(OsError::Timeout),
                PendStatus::Ok => {
                    self.flags &= !flags;
                    Ok(())
                }
            }
        })
    }

    #[inline]
    pub fn flags(&self) -> OsFlags {
        self.flags
    }
}

impl Default for OsEventGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// `Sync` wrapper so an event group can live in a `static`.
pub struct EventGroup {
    inner: UnsafeCell<OsEventGroup>,
}

unsafe impl Sync for EventGroup {}
unsafe impl Send for EventGroup {}

impl EventGroup {
    pub const fn new() -> Self {
        EventGroup { inner: UnsafeCell::new(OsEventGroup::new()) }
    }

    pub fn create(&self, name: &'static str) {
        unsafe { (*self.inner.get()).create(name) }
    }

    pub fn set(&self, flags: OsFlags) {
        unsafe { (*self.inner.get()).set(flags) }
    }

    pub fn set_isr(&self, flags: OsFlags) {
        unsafe { (*self.inner.get()).set_isr(flags) }
    }

    pub fn wait(&self, flags: OsFlags, timeout: OsTick) -> OsResult<()> {
        unsafe { (*self.inner.get()).wait(flags, timeout) }
    }

    #[inline]
    pub fn flags(&self) -> OsFlags {
        unsafe { (*self.inner.get()).flags() }
    }
}

impl Default for EventGroup {
    fn default() -> Self {
        Self::new()
    }
}
