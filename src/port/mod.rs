//! Port layer: the CPU-specific primitives the core delegates to —
//! raising a context-switch request, building a task's initial stack
//! frame, and starting the tick timer.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

/// Host-simulation port used by tests and by any build targeting a
/// non-Cortex-M host. There is no real CPU context to switch: the
/// scheduler's bookkeeping (`running_task`, ready lists, blocked lists)
/// is exercised directly, so this port only needs to hand back a
/// plausible, non-null "stack pointer" and otherwise do nothing.
#[cfg(not(target_arch = "arm"))]
pub mod sim {
    use crate::core::task::OsTaskFn;
    use crate::core::types::OsStkElement;

    pub fn tick_start(_rate_hz: u32) {}

    pub unsafe fn start_first_task() {}

    pub fn request_context_switch() {}

    /// Returns a pointer into the stack without building a real register
    /// frame — host tests never actually jump through it.
    pub unsafe fn stack_init(
        _entry: OsTaskFn,
        _arg: *mut (),
        stk_base: *mut OsStkElement,
        stk_size: usize,
    ) -> *mut OsStkElement {
        unsafe { stk_base.add(stk_size - 1) }
    }
}

#[cfg(not(target_arch = "arm"))]
pub use sim::*;
