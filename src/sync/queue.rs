//! Bounded message queue (spec.md §4.8).
//!
//! A byte-addressed circular buffer of fixed-size items backed by a
//! caller-supplied `'static` byte slice — the kernel is fully statically
//! allocated, so there is no heap storage to own. `head`/`tail` are byte
//! offsets into that slice, each advancing by `item_size` modulo the
//! slice's length; `full` alone discriminates the empty case from the
//! full case when `head == tail`, so capacity is exactly
//! `storage.len() / item_size` items with no wasted slot.

use core::cell::UnsafeCell;

use crate::core::critical::{critical_section, is_isr_context};
use crate::core::error::{OsError, OsResult};
use crate::core::kernel;
use crate::core::list::TaskList;
use crate::core::sched::os_sched;
use crate::core::task::{task_wait, task_wake};
use crate::core::types::{OsTick, PendStatus};

pub struct OsQueue {
    storage: *mut u8,
    capacity: usize,
    item_size: usize,
    head: usize,
    tail: usize,
    full: bool,
    recv_blocked: TaskList,
    send_blocked: TaskList,
    #[cfg(feature = "defmt")]
    name: &'static str,
}

impl OsQueue {
    pub const fn new() -> Self {
        OsQueue {
            storage: core::ptr::null_mut(),
            capacity: 0,
            item_size: 0,
            head: 0,
            tail: 0,
            full: false,
            recv_blocked: TaskList::new(),
            send_blocked: TaskList::new(),
            #[cfg(feature = "defmt")]
            name: "",
        }
    }

    /// Bind the queue to `storage`, a `'static` byte buffer whose length
    /// must be a whole multiple of `item_size`. Asserts on a malformed
    /// configuration: this is a contract violation caught at creation, not
    /// a recoverable condition (spec.md §7).
    pub fn create(&mut self, storage: &'static mut [u8], item_size: usize, _name: &'static str) {
        assert!(item_size > 0, "queue item_size must be nonzero");
        assert!(
            storage.len() % item_size == 0,
            "queue storage length must be a whole multiple of item_size"
        );

        critical_section(|_cs| {
            self.capacity = storage.len();
            self.item_size = item_size;
            self.storage = storage.as_mut_ptr();
            self.head = 0;
            self.tail = 0;
            self.full = false;
            self.recv_blocked = TaskList::new();
            self.send_blocked = TaskList::new();
            #[cfg(feature = "defmt")]
            {
                self.name = _name;
            }
        });
    }

    #[inline]
    fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    /// Copies `item` into the ring at `head` and advances it. Caller
    /// holds the critical section and has already checked `item.len() ==
    /// item_size`.
    fn copy_in(&mut self, item: &[u8]) {
        unsafe {
            core::ptr::copy_nonoverlapping(item.as_ptr(), self.storage.add(self.head), self.item_size);
        }
        self.head = (self.head + self.item_size) % self.capacity;
        if self.head == self.tail {
            self.full = true;
        }
    }

    /// Copies the item at `tail` into `out` and advances it.
    fn copy_out(&mut self, out: &mut [u8]) {
        unsafe {
            core::ptr::copy_nonoverlapping(self.storage.add(self.tail), out.as_mut_ptr(), self.item_size);
        }
        self.tail = (self.tail + self.item_size) % self.capacity;
        self.full = false;
    }

    /// Wake the highest-priority waiter on `list` (if any) and, unless
    /// `from_isr`, invoke the scheduler. Called after a successful
    /// insert (wakes a receiver) or retrieve (wakes a sender).
    unsafe fn wake_highest(&mut self, list_is_recv: bool, from_isr: bool) {
        unsafe {
            let links = kernel::links();
            let list = if list_is_recv { &mut self.recv_blocked } else { &mut self.send_blocked };
            if let Some(id) = list.highest_priority(&links, |id| kernel::task(id).prio) {
                task_wake(list, id);
                if !from_isr {
                    os_sched();
                }
            }
        }
    }

    /// Insert `item`, blocking up to `timeout` ticks if the queue is
    /// full. Wakes the highest-priority receiver, if any, on success.
    pub fn insert(&mut self, item: &[u8], timeout: OsTick) -> OsResult<()> {
        if item.len() != self.item_size {
            return Err(OsError::QueueItemSize);
        }
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            if self.full {
                match task_wait(&mut self.send_blocked, timeout) {
                    PendStatus::Timeout => return Err(OsError::Timeout),
                    PendStatus::Ok => {}
                }
            }

            self.copy_in(item);
            self.wake_highest(true, false);
            Ok(())
        })
    }

    /// ISR-safe, non-blocking insert: returns `Failed` instead of waiting
    /// if the queue is currently full.
    pub fn insert_isr(&mut self, item: &[u8]) -> OsResult<()> {
        if item.len() != self.item_size {
            return Err(OsError::QueueItemSize);
        }

        critical_section(|_cs| unsafe {
            if self.full {
                return Err(OsError::Failed);
            }
            self.copy_in(item);
            self.wake_highest(true, true);
            Ok(())
        })
    }

    /// Retrieve the oldest item into `out`, blocking up to `timeout`
    /// ticks if the queue is empty. Wakes the highest-priority sender, if
    /// any, on success.
    pub fn retrieve(&mut self, out: &mut [u8], timeout: OsTick) -> OsResult<()> {
        if out.len() != self.item_size {
            return Err(OsError::QueueItemSize);
        }
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        critical_section(|_cs| unsafe {
            if self.is_empty() {
                match task_wait(&mut self.recv_blocked, timeout) {
                    PendStatus::Timeout => return Err(OsError::Timeout),
                    PendStatus::Ok => {}
                }
            }

            self.copy_out(out);
            self.wake_highest(false, false);
            Ok(())
        })
    }

    /// ISR-safe, non-blocking retrieve: returns `Failed` instead of
    /// waiting if the queue is currently empty.
    pub fn retrieve_isr(&mut self, out: &mut [u8]) -> OsResult<()> {
        if out.len() != self.item_size {
            return Err(OsError::QueueItemSize);
        }

        critical_section(|_cs| unsafe {
            if self.is_empty() {
                return Err(OsError::Failed);
            }
            self.copy_out(out);
            self.wake_highest(false, true);
            Ok(())
        })
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn len_items(&self) -> usize {
        if self.full {
            self.capacity / self.item_size
        } else if self.head >= self.tail {
            (self.head - self.tail) / self.item_size
        } else {
            (self.capacity - self.tail + self.head) / self.item_size
        }
    }
}

impl Default for OsQueue {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for OsQueue {}

/// `Sync` wrapper so a queue can live in a `static`.
pub struct Queue {
    inner: UnsafeCell<OsQueue>,
}

unsafe impl Sync for Queue {}
unsafe impl Send for Queue {}

impl Queue {
    pub const fn new() -> Self {
        Queue { inner: UnsafeCell::new(OsQueue::new()) }
    }

    pub fn create(&self, storage: &'static mut [u8], item_size: usize, name: &'static str) {
        unsafe { (*self.inner.get()).create(storage, item_size, name) }
    }

    pub fn send(&self, item: &[u8], timeout: OsTick) -> OsResult<()> {
        unsafe { (*self.inner.get()).insert(item, timeout) }
    }

    pub fn send_isr(&self, item: &[u8]) -> OsResult<()> {
        unsafe { (*self.inner.get()).insert_isr(item) }
    }

    pub fn recv(&self, out: &mut [u8], timeout: OsTick) -> OsResult<()> {
        unsafe { (*self.inner.get()).retrieve(out, timeout) }
    }

    pub fn recv_isr(&self, out: &mut [u8]) -> OsResult<()> {
        unsafe { (*self.inner.get()).retrieve_isr(out) }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        unsafe { (*self.inner.get()).is_full() }
    }

    #[inline]
    pub fn len_items(&self) -> usize {
        unsafe { (*self.inner.get()).len_items() }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
