//! Cortex-M4 port: context switching via the PendSV exception, SysTick as
//! the tick source, and the initial-stack-frame layout the PendSV handler
//! expects to restore from.

#![allow(named_asm_labels)]

use core::arch::{asm, naked_asm};

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;

use crate::core::kernel;
use crate::core::task::OsTaskFn;
use crate::core::types::OsStkElement;

/// Dedicated MSP stack used once the scheduler hands the normal stack
/// over to task context (PSP).
#[no_mangle]
static mut INTERRUPT_STACK: [u64; 256] = [0xDEADBEEF_DEADBEEF; 256];

/// Set by `request_context_switch`/`start_first_task` just before pending
/// PendSV: whether there is an outgoing task whose registers need saving.
/// The naked handler reads this directly (it can't call into
/// `kernel::prev_id` before deciding whether to execute `stmdb`).
#[no_mangle]
static mut PENDSV_HAS_PREV: u32 = 0;

pub fn tick_start(rate_hz: u32) {
    let cnts = crate::core::config::CPU_CLK_HZ / rate_hz;
    let mut p = unsafe { cortex_m::Peripherals::steal() };
    p.SYST.set_reload(cnts - 1);
    p.SYST.clear_current();
    p.SYST.set_clock_source(SystClkSource::Core);
    p.SYST.enable_interrupt();
    p.SYST.enable_counter();
}

/// Hand control to the task `os_start` selected as `running_task`. Never
/// returns in the sense that matters: the PendSV exception return resumes
/// directly in that task's context, not back here.
#[allow(static_mut_refs)]
pub unsafe fn start_first_task() {
    unsafe {
        let mut scb = cortex_m::Peripherals::steal().SCB;
        scb.set_priority(SystemHandler::PendSV, 0xF0);
        scb.set_priority(SystemHandler::SysTick, 0xF0);

        let msp_top =
            &INTERRUPT_STACK as *const _ as u32 + core::mem::size_of_val(&INTERRUPT_STACK) as u32;
        asm!("msr msp, {0}", in(reg) msp_top);
        asm!("msr psp, {0}", in(reg) 0);

        PENDSV_HAS_PREV = 0;

        cortex_m::interrupt::enable();
        cortex_m::peripheral::SCB::set_pendsv();
    }
}

/// Request a context switch from task context.
#[inline(always)]
pub fn request_context_switch() {
    unsafe { PENDSV_HAS_PREV = if kernel::prev_id().is_some() { 1 } else { 0 } };
    cortex_m::peripheral::SCB::set_pendsv();
}

/// Exception-entry register frame built on a new task's stack so that the
/// first PendSV restore resumes at `entry(arg)`.
#[repr(C, align(4))]
struct ExceptionFrame {
    r4: u32,
    r5: u32,
    r6: u32,
    r7: u32,
    r8: u32,
    r9: u32,
    r10: u32,
    r11: u32,
    exc_return: u32,
    r0: u32,
    r1: u32,
    r2: u32,
    r3: u32,
    r12: u32,
    lr: u32,
    pc: u32,
    xpsr: u32,
}
const FRAME_WORDS: usize = 17;

/// Build the initial exception frame for a new task so its first context
/// restore resumes at `entry(arg)` in thread mode with a valid xPSR.
pub unsafe fn stack_init(
    entry: OsTaskFn,
    arg: *mut (),
    stk_base: *mut OsStkElement,
    stk_size: usize,
) -> *mut OsStkElement {
    unsafe {
        let stk_top = stk_base.add(stk_size);
        let stk_aligned = ((stk_top as usize) & !7) as *mut u32;
        let frame_ptr = stk_aligned.sub(FRAME_WORDS) as *mut ExceptionFrame;

        *frame_ptr = ExceptionFrame {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            exc_return: 0xFFFF_FFFD,
            r0: arg as u32,
            r1: 0,
            r2: 0,
            r3: 0,
            r12: 0,
            lr: task_return as *const () as u32,
            pc: (entry as usize as u32) | 1,
            xpsr: 0x0100_0000,
        };

        (frame_ptr as *mut u32).sub(1) as *mut OsStkElement
    }
}

/// Called from the naked PendSV handler to swap the running task and
/// return the new task's saved stack pointer. `cur_sp` is the outgoing
/// task's PSP after register save; ignored when `PENDSV_HAS_PREV == 0`.
#[inline(never)]
#[no_mangle]
unsafe extern "C" fn pendsv_switch_context(cur_sp: *mut u32) -> *mut u32 {
    unsafe {
        if let Some(prev) = kernel::prev_id() {
            kernel::task(prev).stk_ptr = cur_sp as *mut OsStkElement;
        }
        match kernel::running_id() {
            Some(id) => kernel::task(id).stk_ptr as *mut u32,
            None => core::ptr::null_mut(),
        }
    }
}

/// PendSV exception handler: save the outgoing task's callee-saved
/// registers (skipped on the very first switch), call
/// `pendsv_switch_context`, then restore the incoming task's registers.
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "cpsid i",
        "dsb",
        "isb",
        "mrs r0, psp",
        "ldr r1, ={has_prev}",
        "ldr r1, [r1]",
        "cbz r1, 1f",
        "stmdb r0!, {{r4-r11, lr}}",
        "sub r0, r0, #4",
        "1:",
        "bl pendsv_switch_context",
        "cbz r0, 2f",
        "add r0, r0, #4",
        "ldmia r0!, {{r4-r11, lr}}",
        "msr psp, r0",
        "2:",
        "cpsie i",
        "dsb",
        "isb",
        "bx lr",
        has_prev = sym PENDSV_HAS_PREV,
    );
}

/// Reached only if a task function returns, which violates the task
/// contract (tasks run forever). Parks the core rather than falling into
/// undefined silicon.
#[no_mangle]
fn task_return() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
