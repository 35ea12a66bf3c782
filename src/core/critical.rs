//! Critical section handling
//!
//! The port's critical-section contract: `enter_critical`/`exit_critical`
//! globally mask/unmask interrupts and must be safe to call
//! from both task and ISR context. Every operation that mutates
//! scheduler-visible state (ready lists, blocked lists, TCB state) runs
//! inside one of these.

use core::sync::atomic::{AtomicBool, Ordering};

/// Global flag indicating whether we are inside a critical section.
static IN_CRITICAL: AtomicBool = AtomicBool::new(false);

/// RAII guard for critical sections.
///
/// When this guard is created, interrupts are disabled. When it is
/// dropped, interrupts are restored. Critical sections in this kernel are
/// short and non-nestable: callers must not call a blocking primitive from
/// inside one.
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    /// Enter a critical section by disabling interrupts.
    #[inline(always)]
    pub fn enter() -> Self {
        #[cfg(target_arch = "arm")]
        cortex_m::interrupt::disable();

        IN_CRITICAL.store(true, Ordering::Release);
        CriticalSection { _private: () }
    }

    /// Check if we're currently in a critical section.
    #[inline(always)]
    pub fn is_active() -> bool {
        IN_CRITICAL.load(Ordering::Acquire)
    }
}

impl Drop for CriticalSection {
    #[inline(always)]
    fn drop(&mut self) {
        IN_CRITICAL.store(false, Ordering::Release);

        #[cfg(target_arch = "arm")]
        unsafe { cortex_m::interrupt::enable() };
    }
}

/// Execute a closure with interrupts disabled.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    let cs = CriticalSection::enter();
    f(&cs)
}

/// Disable interrupts without an RAII guard. Prefer [`critical_section`] or
/// [`CriticalSection::enter`]; this pairs with [`exit_critical`] for ports
/// that need the bare enter/exit shape.
#[inline(always)]
pub fn enter_critical() -> CriticalSection {
    CriticalSection::enter()
}

/// Drop a guard returned by [`enter_critical`], restoring interrupts.
#[inline(always)]
pub fn exit_critical(cs: CriticalSection) {
    drop(cs);
}

/// Check if currently executing in an ISR context.
#[inline]
pub fn is_isr_context() -> bool {
    #[cfg(target_arch = "arm")]
    {
        let ipsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {}, IPSR",
                out(reg) ipsr,
                options(nomem, nostack, preserves_flags)
            );
        }
        ipsr != 0
    }

    #[cfg(not(target_arch = "arm"))]
    {
        false
    }
}
