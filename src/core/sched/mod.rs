//! Scheduler: picks the next task to run and requests a context switch.

use crate::core::kernel;
use crate::core::types::TaskId;

/// Choose the highest-priority READY task and, if it differs from the one
/// currently running, hand control to it.
///
/// Must be called from inside a critical section. Invoked from the tick
/// handler (after timeouts are serviced), from `os_task_yield`, from
/// `os_task_sleep`, and from every primitive operation that may wake a
/// waiter.
pub(crate) unsafe fn os_sched() {
    unsafe {
        let prio = match kernel::prio_table().get_highest() {
            Some(p) => p,
            None => return,
        };
        let running = kernel::running_id();

        let candidate: Option<TaskId> = match running {
            None => kernel::ready_head(prio),
            Some(r) => {
                let rtask = kernel::task(r);
                if rtask.is_ready() && rtask.prio == prio && rtask.next_task.is_some() {
                    let next = rtask.next_task;
                    kernel::ready_rotate(prio);
                    next
                } else if Some(r) != kernel::ready_head(prio) {
                    kernel::ready_head(prio)
                } else {
                    None
                }
            }
        };

        if let Some(next) = candidate {
            kernel::set_prev_id(running);
            kernel::set_running_id(Some(next));
            crate::port::request_context_switch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{self, test_lock};
    use crate::core::task::create_task;
    use crate::core::types::OsStkElement;

    static mut STK_A: [OsStkElement; 32] = [0; 32];
    static mut STK_B: [OsStkElement; 32] = [0; 32];
    static mut STK_C: [OsStkElement; 32] = [0; 32];

    fn dummy(_arg: *mut ()) -> ! {
        loop {}
    }

    unsafe fn spawn(prio: u8, stk: &'static mut [OsStkElement]) -> TaskId {
        unsafe {
            let id = kernel::alloc_task_id().unwrap();
            create_task(id, "t", dummy, core::ptr::null_mut(), prio, stk.as_mut_ptr(), stk.len()).unwrap();
            kernel::ready_insert(id, prio, false);
            id
        }
    }

    #[test]
    fn higher_priority_task_preempts() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let low = spawn(3, &mut STK_A);
            kernel::set_running_id(Some(low));
            let high = spawn(7, &mut STK_B);

            os_sched();

            assert_eq!(kernel::running_id(), Some(high));
            assert_eq!(kernel::prev_id(), Some(low));
        }
    }

    #[test]
    fn equal_priority_round_robins_to_next_task() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let a = spawn(5, &mut STK_A);
            let b = spawn(5, &mut STK_B);
            kernel::set_running_id(Some(a));

            os_sched();

            assert_eq!(kernel::running_id(), Some(b));
            assert_eq!(kernel::prev_id(), Some(a));
            // the rotation put `a` behind `b` on the ready list
            assert_eq!(kernel::ready_head(5), Some(b));
        }
    }

    #[test]
    fn sole_ready_task_is_left_running() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let only = spawn(5, &mut STK_A);
            kernel::set_running_id(Some(only));

            os_sched();

            assert_eq!(kernel::running_id(), Some(only));
            assert_eq!(kernel::prev_id(), None);
        }
    }

    #[test]
    fn lower_priority_ready_task_does_not_preempt() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let high = spawn(9, &mut STK_A);
            let _low = spawn(2, &mut STK_B);
            kernel::set_running_id(Some(high));

            os_sched();

            assert_eq!(kernel::running_id(), Some(high));
            assert_eq!(kernel::prev_id(), None);
        }
    }

    #[test]
    fn no_running_task_picks_highest_ready() {
        let _g = test_lock();
        unsafe {
            kernel::os_reset_globals();
            let low = spawn(1, &mut STK_A);
            let high = spawn(4, &mut STK_C);
            kernel::set_running_id(None);
            let _ = low;

            os_sched();

            assert_eq!(kernel::running_id(), Some(high));
        }
    }
}
