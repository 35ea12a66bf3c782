//! Task Control Block
//!
//! One `OsTcb` per task slot in the kernel's static task table. A task's
//! identity is its [`TaskId`] (its index in that table) — the TCB itself
//! never moves and is never referenced by pointer from outside the kernel,
//! only by id, so there is nothing for a raw pointer to dangle against.

use core::ptr::NonNull;

use crate::core::list::TaskList;
use crate::core::types::{OsFlags, OsPrio, OsStkElement, OsTick, TaskId, TaskState};

/// Task entry point. Tasks run forever and never return; `os_task_create`
/// rejects a stack too small to hold the initial frame, but nothing stops
/// a task function from returning in violation of its contract, at which
/// point the port's `task_return` hook takes over.
pub type OsTaskFn = fn(*mut ()) -> !;

/// Task Control Block.
#[repr(C)]
pub struct OsTcb {
    /// Current stack pointer, written by the port on every context switch.
    pub stk_ptr: *mut OsStkElement,
    /// Lowest valid address of this task's stack, used only to sanity
    /// check the pointer the port hands back.
    pub stk_base: *mut OsStkElement,
    /// Stack size in words.
    pub stk_size: usize,

    /// Task name, for logging only.
    pub name: &'static str,

    /// This task's id, equal to its slot in the task table.
    pub id: TaskId,

    /// Ready-list link: next task in whichever list currently holds this
    /// one (a priority's ready ring, or a primitive's blocked ring).
    pub next_task: Option<TaskId>,
    /// Ready-list link: previous task.
    pub prev_task: Option<TaskId>,

    /// The blocked list this task is currently linked into, if any. Set by
    /// `task_wait` and cleared by `task_wake`; the tick handler uses it to
    /// unlink a task from its primitive's blocked list when its timeout
    /// elapses, rather than leaving a timed-out task dangling on a list it
    /// no longer belongs to.
    pub blocked_on: Option<NonNull<TaskList>>,

    /// Current priority. Mutated by mutex priority inheritance; restored
    /// by the owning mutex on release.
    pub prio: OsPrio,

    /// Ready or Blocked. RUNNING is not a stored state: it is implied by
    /// being the task the kernel's `running_task` names.
    pub state: TaskState,

    /// True while this task is on a primitive's blocked list, whether or
    /// not it also carries a timeout. Cleared the moment it is woken,
    /// whether by the primitive or by timeout, so a racing wake and
    /// timeout can't both act on it.
    pub waiting: bool,
    /// Ticks remaining before this task's wait times out. Zero means "no
    /// timeout armed".
    pub timeout: OsTick,

    /// Flags this task is waiting for, valid only while blocked on an
    /// event group.
    pub wait_flags: OsFlags,

    /// Task entry function and argument, used only at creation to build
    /// the initial stack frame.
    pub entry: Option<OsTaskFn>,
    pub arg: *mut (),
}

impl OsTcb {
    pub const fn new() -> Self {
        OsTcb {
            stk_ptr: core::ptr::null_mut(),
            stk_base: core::ptr::null_mut(),
            stk_size: 0,

            name: "",
            id: 0,

            next_task: None,
            prev_task: None,
            blocked_on: None,

            prio: 0,
            state: TaskState::Ready,

            waiting: false,
            timeout: 0,

            wait_flags: 0,

            entry: None,
            arg: core::ptr::null_mut(),
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.state == TaskState::Blocked
    }
}

impl Default for OsTcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for OsTcb {}
unsafe impl Sync for OsTcb {}
