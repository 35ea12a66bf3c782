//! Tick handler and the system clock it maintains.

use crate::core::critical::critical_section;
use crate::core::kernel::{self, KERNEL};
use crate::core::sched::os_sched;
use crate::core::task::task_wake_timeout;
use crate::core::types::{OsTick, TaskState};

/// Ticks elapsed since `os_init`.
#[inline]
pub fn os_time_get() -> OsTick {
    KERNEL.tick_get()
}

/// Advance the system clock by one tick: decrement every armed timeout,
/// wake any task whose timeout reaches zero, then invoke the scheduler.
///
/// O(task_count): every task is visited every tick. This is the design's
/// documented simplification over a delta list — acceptable for the task
/// counts a single-core microcontroller kernel expects; converting to a
/// delta list is a TODO, not a correctness requirement.
///
/// Called from the port's tick ISR.
pub fn os_tick_handler() {
    if !KERNEL.is_running() {
        return;
    }

    critical_section(|_cs| unsafe {
        KERNEL.tick_increment();

        let count = kernel::task_count();
        for id in 0..count {
            let tcb = kernel::task(id);
            if tcb.state != TaskState::Blocked || tcb.timeout == 0 {
                continue;
            }
            tcb.timeout -= 1;
            if tcb.timeout == 0 {
                task_wake_timeout(id);
            }
        }

        os_sched();
    });
}

/// SysTick interrupt handler. The port registers this (or calls it from
/// its own vectored handler) as the periodic tick source configured by
/// `tick_start`.
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}
