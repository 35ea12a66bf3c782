//! Global kernel state: the static task table, ready lists, priority
//! bitmap and the running-task pointer that the scheduler, task, time and
//! synchronization modules all operate on.
//!
//! Every accessor here is `unsafe fn` returning a `'static mut` reference
//! into one process-wide static. Callers are required to hold a
//! [`CriticalSection`] (or be running with interrupts already disabled,
//! e.g. inside the tick ISR) for the duration any reference stays alive.
//! That contract is not compiler-checked — there is exactly one core and
//! exactly one copy of this state, and the alternative is a heap of
//! `Arc<Mutex<_>>` machinery this kernel exists to avoid.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::core::config::{CFG_IDLE_STK_SIZE, MAX_NUM_TASKS, PRIO_IDLE, PRIO_LEVELS};
use crate::core::critical::critical_section;
use crate::core::cs_cell::CsCell;
use crate::core::error::{OsError, OsResult};
use crate::core::list::{TaskList, TaskStore};
use crate::core::prio::PrioTable;
use crate::core::task::tcb::OsTcb;
use crate::core::types::{OsPrio, OsStkElement, OsTick, TaskId, TaskState};

/// Coarse kernel status, independent of any particular task's state.
pub struct KernelFlags {
    initialized: AtomicBool,
    running: AtomicBool,
    tick_counter: AtomicU32,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            tick_counter: AtomicU32::new(0),
        }
    }

    fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.tick_counter.store(0, Ordering::SeqCst);
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn tick_get(&self) -> OsTick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn tick_increment(&self) -> OsTick {
        self.tick_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline(always)]
    pub(crate) fn set_initialized(&self, val: bool) {
        self.initialized.store(val, Ordering::SeqCst);
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, val: bool) {
        self.running.store(val, Ordering::SeqCst);
    }
}

pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

/// Everything the scheduler needs: the task table itself, one ready list
/// per priority, the priority bitmap, and which task is running.
struct KernelState {
    tasks: [OsTcb; MAX_NUM_TASKS],
    count: u8,
    ready: [TaskList; PRIO_LEVELS],
    prio_tbl: PrioTable,
    running: Option<TaskId>,
    /// Outgoing task during a switch, consumed by the port's switch
    /// routine to know whose registers to save.
    prev: Option<TaskId>,
}

impl KernelState {
    const fn new() -> Self {
        const TCB_INIT: OsTcb = OsTcb::new();
        Self {
            tasks: [TCB_INIT; MAX_NUM_TASKS],
            count: 0,
            ready: [TaskList::new(); PRIO_LEVELS],
            prio_tbl: PrioTable::new(),
            running: None,
            prev: None,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

static KSTATE: CsCell<KernelState> = CsCell::new(KernelState::new());

/// Bridges the generic [`TaskList`] link manipulation to `OsTcb`'s
/// `next_task`/`prev_task` fields.
pub(crate) struct Links<'a>(&'a mut [OsTcb; MAX_NUM_TASKS]);

impl<'a> TaskStore for Links<'a> {
    fn next(&self, id: TaskId) -> Option<TaskId> {
        self.0[id as usize].next_task
    }
    fn prev(&self, id: TaskId) -> Option<TaskId> {
        self.0[id as usize].prev_task
    }
    fn set_next(&mut self, id: TaskId, next: Option<TaskId>) {
        self.0[id as usize].next_task = next;
    }
    fn set_prev(&mut self, id: TaskId, prev: Option<TaskId>) {
        self.0[id as usize].prev_task = prev;
    }
}

/// IDLE task's own stack; the idle TCB lives in the task table like any
/// other task, created during `os_init`.
static mut IDLE_STK: [OsStkElement; CFG_IDLE_STK_SIZE] = [0; CFG_IDLE_STK_SIZE];

fn os_idle_task(_arg: *mut ()) -> ! {
    loop {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::nop();
    }
}

// ============ Internal accessors for the task/sched/time/sync modules ============

#[inline(always)]
pub(crate) unsafe fn task(id: TaskId) -> &'static mut OsTcb {
    unsafe { &mut KSTATE.get_unchecked().tasks[id as usize] }
}

#[inline(always)]
pub(crate) unsafe fn links() -> Links<'static> {
    unsafe { Links(&mut KSTATE.get_unchecked().tasks) }
}

#[inline(always)]
pub(crate) unsafe fn prio_table() -> &'static mut PrioTable {
    unsafe { &mut KSTATE.get_unchecked().prio_tbl }
}

#[inline(always)]
pub(crate) unsafe fn running_id() -> Option<TaskId> {
    unsafe { KSTATE.get_unchecked().running }
}

#[inline(always)]
pub(crate) unsafe fn set_running_id(id: Option<TaskId>) {
    unsafe { KSTATE.get_unchecked().running = id };
}

#[inline(always)]
pub(crate) unsafe fn prev_id() -> Option<TaskId> {
    unsafe { KSTATE.get_unchecked().prev }
}

#[inline(always)]
pub(crate) unsafe fn set_prev_id(id: Option<TaskId>) {
    unsafe { KSTATE.get_unchecked().prev = id };
}

#[inline(always)]
pub(crate) unsafe fn task_count() -> u8 {
    unsafe { KSTATE.get_unchecked().count }
}

/// Reserve the next free task table slot. Fails once `MAX_NUM_TASKS` tasks
/// (including idle) have been created — there is no task deletion, so
/// slots are never reclaimed.
pub(crate) unsafe fn alloc_task_id() -> OsResult<TaskId> {
    unsafe {
        let state = KSTATE.get_unchecked();
        if state.count as usize >= MAX_NUM_TASKS {
            return Err(OsError::TaskNoMoreTcb);
        }
        let id = state.count;
        state.count += 1;
        Ok(id)
    }
}

/// Insert `id` onto its priority's ready list and mark that priority ready
/// in the bitmap. `at_head` places it ahead of same-priority tasks already
/// ready (used when a higher-priority task preempts and is later requeued
/// after its own wait); everywhere else insertion is at the tail, so
/// equal-priority tasks round-robin in creation/wake order.
pub(crate) unsafe fn ready_insert(id: TaskId, prio: OsPrio, at_head: bool) {
    unsafe {
        let KernelState { tasks, ready, prio_tbl, .. } = KSTATE.get_unchecked();
        let mut links = Links(tasks);
        let list = &mut ready[prio as usize];
        if at_head {
            list.insert_head(&mut links, id);
        } else {
            list.insert_tail(&mut links, id);
        }
        prio_tbl.insert(prio);
    }
}

pub(crate) unsafe fn ready_remove(id: TaskId, prio: OsPrio) {
    unsafe {
        let KernelState { tasks, ready, prio_tbl, .. } = KSTATE.get_unchecked();
        let mut links = Links(tasks);
        let list = &mut ready[prio as usize];
        list.remove(&mut links, id);
        if list.is_empty() {
            prio_tbl.remove(prio);
        }
    }
}

/// Move the current head of `prio`'s ready list to the tail. Used for
/// round-robin among equal-priority tasks on every tick.
pub(crate) unsafe fn ready_rotate(prio: OsPrio) {
    unsafe {
        let KernelState { tasks, ready, .. } = KSTATE.get_unchecked();
        let mut links = Links(tasks);
        ready[prio as usize].rotate(&mut links);
    }
}

pub(crate) unsafe fn ready_head(prio: OsPrio) -> Option<TaskId> {
    unsafe { KSTATE.get_unchecked().ready[prio as usize].head() }
}

/// Reset all global kernel state. Exposed for host-side tests, which run
/// many independent scenarios in one process and need a clean kernel
/// between them; `os_init` calls it too since the embedded entry point
/// only ever calls it once.
pub(crate) unsafe fn os_reset_globals() {
    unsafe {
        KERNEL.reset();
        KSTATE.get_unchecked().reset();
    }
}

/// Serializes host-side unit tests against the global kernel statics.
///
/// `critical_section`'s `IN_CRITICAL` flag and `KSTATE` are process-wide;
/// on a real target that's safe because there is exactly one core and
/// interrupts are genuinely masked, but `cargo test` runs `#[test]` fns
/// on a thread pool within one process, and nothing here actually stops
/// two of them from touching the same static concurrently. Every test
/// that calls `os_init` (which resets all kernel state) takes this lock
/// first so tests observe a freshly reset, exclusively-owned kernel.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    match LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============ Public API ============

/// Initialize the kernel: reset all global state, set up the idle task,
/// and mark the kernel initialized. Must be called exactly once, before
/// any task is created and before `os_start`.
pub fn os_init() -> OsResult<()> {
    if KERNEL.is_running() {
        return Err(OsError::AlreadyRunning);
    }

    unsafe { os_reset_globals() };

    critical_section(|_cs| {
        let id = unsafe { alloc_task_id() }?;
        crate::core::task::create_task(
            id,
            "idle",
            os_idle_task,
            core::ptr::null_mut(),
            PRIO_IDLE,
            unsafe { IDLE_STK.as_mut_ptr() },
            unsafe { IDLE_STK.len() },
        )?;
        unsafe { ready_insert(id, PRIO_IDLE, false) };
        KERNEL.set_initialized(true);
        Ok(())
    })
}

/// Start multitasking: hand control to the highest-priority ready task.
/// Does not return under normal operation. At least one application task
/// must have been created; the idle task alone is enough to start (it
/// will simply run until a real task is created and preempts it — though
/// since task creation after start is out of scope, in practice an
/// application creates its tasks before calling this).
pub fn os_start() -> OsResult<()> {
    if !KERNEL.is_initialized() {
        return Err(OsError::NotInitialized);
    }
    if KERNEL.is_running() {
        return Err(OsError::AlreadyRunning);
    }

    critical_section(|_cs| {
        let prio = unsafe { prio_table() }.get_highest().expect("idle task always ready");
        let id = unsafe { ready_head(prio) }.expect("ready bit set implies a task on the list");
        unsafe { set_running_id(Some(id)) };
        KERNEL.set_running(true);
    });

    crate::port::tick_start(crate::core::config::OS_CLK_HZ);
    unsafe { crate::port::start_first_task() };

    Ok(())
}
