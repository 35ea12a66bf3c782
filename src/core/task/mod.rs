//! Task creation, the blocking wait/wake contract, sleep and yield.

pub(crate) mod tcb;

pub use tcb::{OsTaskFn, OsTcb};

use crate::core::config::{CFG_STK_SIZE_MIN, PRIO_LEVELS};
use crate::core::critical::{critical_section, is_isr_context};
use crate::core::error::{OsError, OsResult};
use crate::core::kernel;
use crate::core::list::TaskList;
use crate::core::sched::os_sched;
use crate::core::types::{OsPrio, OsStkElement, OsTick, PendStatus, TaskId, TaskState};

/// Build a task's TCB and initial stack frame and reserve its table slot.
/// Shared by `os_init`'s idle-task setup and `os_task_create`; does not
/// touch the ready list, since idle creation and application creation
/// insert at slightly different points (idle is inserted by `os_init`
/// itself, before the kernel is marked initialized).
pub(crate) unsafe fn create_task(
    id: TaskId,
    name: &'static str,
    entry: OsTaskFn,
    arg: *mut (),
    prio: OsPrio,
    stk_base: *mut OsStkElement,
    stk_size: usize,
) -> OsResult<()> {
    if stk_base.is_null() {
        return Err(OsError::StkInvalid);
    }
    if stk_size < CFG_STK_SIZE_MIN {
        return Err(OsError::StkSizeInvalid);
    }
    if prio as usize >= PRIO_LEVELS {
        return Err(OsError::PrioInvalid);
    }

    unsafe {
        let tcb = kernel::task(id);
        *tcb = OsTcb::new();
        tcb.id = id;
        tcb.name = name;
        tcb.prio = prio;
        tcb.state = TaskState::Ready;
        tcb.entry = Some(entry);
        tcb.arg = arg;
        tcb.stk_base = stk_base;
        tcb.stk_size = stk_size;
        tcb.stk_ptr = crate::port::stack_init(entry, arg, stk_base, stk_size);
    }

    crate::log::debug!("task {} created at priority {}", name, prio);
    Ok(())
}

/// Create an application task and make it ready to run.
///
/// Must be called before `os_start` — dynamic task creation after start
/// is unsupported. `name` is carried only for logging; it plays no part
/// in scheduling.
pub fn os_task_create(
    name: &'static str,
    entry: OsTaskFn,
    arg: *mut (),
    stack_base: &'static mut [OsStkElement],
    priority: OsPrio,
) -> OsResult<TaskId> {
    if is_isr_context() {
        return Err(OsError::IsrContext);
    }
    if kernel::KERNEL.is_running() {
        return Err(OsError::AlreadyRunning);
    }

    critical_section(|_cs| {
        let id = unsafe { kernel::alloc_task_id() }?;
        unsafe {
            create_task(id, name, entry, arg, priority, stack_base.as_mut_ptr(), stack_base.len())?;
            kernel::ready_insert(id, priority, false);
        }
        Ok(id)
    })
}

/// Put the running task to sleep for `ticks` system ticks, then yield the
/// CPU. Sleeping for 0 ticks is a pure `os_task_yield`.
pub fn os_task_sleep(ticks: OsTick) {
    if ticks == 0 {
        return os_task_yield();
    }

    critical_section(|_cs| unsafe {
        let id = kernel::running_id().expect("os_task_sleep called before os_start");
        let tcb = kernel::task(id);
        kernel::ready_remove(id, tcb.prio);
        tcb.state = TaskState::Blocked;
        tcb.timeout = ticks;
        os_sched();
    });
}

/// Yield the CPU to another ready task at the same priority, if any.
pub fn os_task_yield() {
    critical_section(|_cs| unsafe { os_sched() });
}

/// Snapshot of a task's observable state, returned by `os_task_query`.
#[derive(Debug, Clone, Copy)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: &'static str,
    pub priority: OsPrio,
    pub state: TaskState,
}

/// Read back a task's current priority/state for diagnostics.
pub fn os_task_query(id: TaskId) -> OsResult<TaskInfo> {
    if id as usize >= unsafe { kernel::task_count() } as usize {
        return Err(OsError::TaskInvalid);
    }
    Ok(critical_section(|_cs| unsafe {
        let tcb = kernel::task(id);
        TaskInfo { id: tcb.id, name: tcb.name, priority: tcb.prio, state: tcb.state }
    }))
}

/// Block the running task on `blocked_list` until woken or `timeout_ticks`
/// elapse. Must be called from inside a critical section, with the
/// running task already inserted into `blocked_list` by the caller (the
/// particular primitive).
///
/// `timeout_ticks == 0` is a non-blocking poll: returns TIMEOUT
/// immediately without touching any list.
pub(crate) unsafe fn task_wait(blocked_list: &mut TaskList, timeout_ticks: OsTick) -> PendStatus {
    if timeout_ticks == 0 {
        return PendStatus::Timeout;
    }

    unsafe {
        let id = kernel::running_id().expect("task_wait called before os_start");
        let tcb = kernel::task(id);
        tcb.waiting = true;
        tcb.timeout = timeout_ticks;
        kernel::ready_remove(id, tcb.prio);
        blocked_list.insert_tail(&mut kernel::links(), id);
        tcb.blocked_on = core::ptr::NonNull::new(blocked_list as *mut TaskList);
        tcb.state = TaskState::Blocked;

        os_sched();

        let tcb = kernel::task(id);
        let status = if tcb.waiting { PendStatus::Timeout } else { PendStatus::Ok };
        tcb.waiting = false;
        status
    }
}

/// Wake `id` from `list`: clear its wait/timeout bookkeeping, remove it
/// from `list`, and make it READY. Does not itself invoke the scheduler —
/// a releaser that wakes several waiters in a batch calls `os_sched` once,
/// at the end.
pub(crate) unsafe fn task_wake(list: &mut TaskList, id: TaskId) {
    unsafe {
        let tcb = kernel::task(id);
        tcb.waiting = false;
        tcb.timeout = 0;
        tcb.blocked_on = None;
        list.remove(&mut kernel::links(), id);
        tcb.state = TaskState::Ready;
        let prio = tcb.prio;
        kernel::ready_insert(id, prio, false);
    }
}

/// Wake `id` because its timeout elapsed, called only from the tick
/// handler. Unlike [`task_wake`], `waiting` is left set: it is
/// `task_wait`'s signal, on resumption, that the wake came from a timeout
/// rather than a release, so it can return `PendStatus::Timeout`.
///
/// `id` is unlinked from whatever blocked list it was sitting on (via
/// `blocked_on`), not left dangling there for the eventual releaser to
/// trip over — the bug the design notes call out: a revision of the
/// source left timed-out tasks on the blocked list, violating "a task is
/// on at most one list".
pub(crate) unsafe fn task_wake_timeout(id: TaskId) {
    unsafe {
        let tcb = kernel::task(id);
        tcb.timeout = 0;
        if let Some(mut list) = tcb.blocked_on.take() {
            list.as_mut().remove(&mut kernel::links(), id);
        }
        tcb.state = TaskState::Ready;
        let prio = tcb.prio;
        kernel::ready_insert(id, prio, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CFG_STK_SIZE_MIN, PRIO_LEVELS};
    use crate::core::kernel::test_lock;

    static mut STK_OK: [OsStkElement; 32] = [0; 32];
    static mut STK_TOO_SMALL: [OsStkElement; 4] = [0; 4];

    fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    #[test]
    fn create_task_rejects_null_stack() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = kernel::alloc_task_id().unwrap();
            let err = create_task(id, "t", dummy, core::ptr::null_mut(), 1, core::ptr::null_mut(), 32)
                .unwrap_err();
            assert_eq!(err, OsError::StkInvalid);
        }
    }

    #[test]
    fn create_task_rejects_undersized_stack() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = kernel::alloc_task_id().unwrap();
            let err = create_task(
                id,
                "t",
                dummy,
                core::ptr::null_mut(),
                1,
                STK_TOO_SMALL.as_mut_ptr(),
                STK_TOO_SMALL.len(),
            )
            .unwrap_err();
            assert_eq!(err, OsError::StkSizeInvalid);
            assert!(CFG_STK_SIZE_MIN > STK_TOO_SMALL.len());
        }
    }

    #[test]
    fn create_task_rejects_out_of_range_priority() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = kernel::alloc_task_id().unwrap();
            let err = create_task(
                id,
                "t",
                dummy,
                core::ptr::null_mut(),
                PRIO_LEVELS as OsPrio,
                STK_OK.as_mut_ptr(),
                STK_OK.len(),
            )
            .unwrap_err();
            assert_eq!(err, OsError::PrioInvalid);
        }
    }

    #[test]
    fn os_task_create_rejects_after_kernel_running() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            kernel::KERNEL.set_running(true);
            let err = os_task_create("t", dummy, core::ptr::null_mut(), &mut STK_OK, 1).unwrap_err();
            assert_eq!(err, OsError::AlreadyRunning);
        }
    }

    #[test]
    fn os_task_create_makes_the_task_ready() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = os_task_create("t", dummy, core::ptr::null_mut(), &mut STK_OK, 6).unwrap();
            assert_eq!(kernel::task(id).state, TaskState::Ready);
            assert_eq!(kernel::ready_head(6), Some(id));
            assert_eq!(kernel::prio_table().get_highest(), Some(6));
        }
    }

    #[test]
    fn task_wake_clears_wait_bookkeeping_and_requeues() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = os_task_create("t", dummy, core::ptr::null_mut(), &mut STK_OK, 3).unwrap();
            let mut blocked = TaskList::new();
            kernel::ready_remove(id, 3);
            blocked.insert_tail(&mut kernel::links(), id);
            let tcb = kernel::task(id);
            tcb.state = TaskState::Blocked;
            tcb.waiting = true;
            tcb.timeout = 50;
            tcb.blocked_on = core::ptr::NonNull::new(&mut blocked as *mut TaskList);

            task_wake(&mut blocked, id);

            let tcb = kernel::task(id);
            assert!(!tcb.waiting);
            assert_eq!(tcb.timeout, 0);
            assert_eq!(tcb.state, TaskState::Ready);
            assert!(blocked.is_empty());
            assert_eq!(kernel::ready_head(3), Some(id));
        }
    }

    #[test]
    fn task_wake_timeout_unlinks_from_blocked_list_and_leaves_waiting_set() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = os_task_create("t", dummy, core::ptr::null_mut(), &mut STK_OK, 3).unwrap();
            let mut blocked = TaskList::new();
            kernel::ready_remove(id, 3);
            blocked.insert_tail(&mut kernel::links(), id);
            let tcb = kernel::task(id);
            tcb.state = TaskState::Blocked;
            tcb.waiting = true;
            tcb.timeout = 1;
            tcb.blocked_on = core::ptr::NonNull::new(&mut blocked as *mut TaskList);

            task_wake_timeout(id);

            let tcb = kernel::task(id);
            assert!(tcb.waiting, "timeout path leaves `waiting` for task_wait to report TIMEOUT");
            assert_eq!(tcb.state, TaskState::Ready);
            assert!(blocked.is_empty(), "task must not be left dangling on the primitive's list");
            assert_eq!(kernel::ready_head(3), Some(id));
        }
    }

    #[test]
    fn os_task_sleep_zero_ticks_is_a_pure_yield() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = os_task_create("t", dummy, core::ptr::null_mut(), &mut STK_OK, 3).unwrap();
            kernel::set_running_id(Some(id));
            os_task_sleep(0);
            // no timeout armed, task never left the ready list
            assert_eq!(kernel::task(id).state, TaskState::Ready);
            assert_eq!(kernel::task(id).timeout, 0);
        }
    }

    #[test]
    fn os_task_query_reports_current_state() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let id = os_task_create("worker", dummy, core::ptr::null_mut(), &mut STK_OK, 4).unwrap();
            let info = os_task_query(id).unwrap();
            assert_eq!(info.id, id);
            assert_eq!(info.name, "worker");
            assert_eq!(info.priority, 4);
            assert_eq!(info.state, TaskState::Ready);
        }
    }

    #[test]
    fn os_task_query_rejects_unknown_id() {
        let _g = test_lock();
        unsafe { kernel::os_reset_globals() };
        assert_eq!(os_task_query(200).unwrap_err(), OsError::TaskInvalid);
    }
}
