//! A statically-allocated, fixed-priority preemptive RTOS kernel for
//! single-core microcontrollers.
//!
//! Provides:
//! - Fixed-priority preemptive scheduling with round-robin among
//!   equal-priority tasks
//! - Tick-based time management (`os_task_sleep`, per-wait timeouts)
//! - Synchronization primitives: mutex with priority inheritance,
//!   counting semaphore, bounded byte queue, event flag group
//! - A small port interface (critical sections, context switch, tick
//!   timer, initial stack construction) implemented for ARM Cortex-M and,
//!   for host-side testing, a no-op simulation port

#![cfg_attr(not(test), no_std)] // Link `std` only when building unit tests.
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod sync;
pub mod port;

// ============ Re-exports ============

pub use core::config;
pub use core::config::*;
pub use core::critical;
pub use core::error;
pub use core::error::OsError;
pub use core::kernel;
pub use core::kernel::{os_init, os_start};
pub use core::prio;
pub use core::types;
pub use core::types::*;
pub use core::task;
pub use core::task::os_task_create;
pub use core::sched;
pub use core::time;

#[cfg(feature = "sem")]
pub use sync::sem;
#[cfg(feature = "mutex")]
pub use sync::mutex;
#[cfg(feature = "queue")]
pub use sync::queue;
#[cfg(feature = "event")]
pub use sync::event;
