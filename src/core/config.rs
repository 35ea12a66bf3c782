//! Compile-time configuration
//!
//! These constants control the resource limits and timing of the kernel.
//! All of them are fixed at build time: the kernel is fully statically
//! allocated and takes no configuration after `os_init`.

/***************************************************************************
 * Config (modified by user)
 **************************************************************************/

/// Maximum number of tasks, including the idle task. Must be <= 255.
pub const MAX_NUM_TASKS: usize = 32;

/// Highest legal priority value. Priority 0 is reserved for the idle task
/// and is always the lowest priority. Must be <= 255.
pub const MAX_PRIORITY_LEVEL: u8 = 31;

/// System tick rate in Hz.
pub const OS_CLK_HZ: u32 = 1000;

/// CPU clock rate in Hz, used to program the tick timer.
pub const CPU_CLK_HZ: u32 = 16_000_000;

/***************************************************************************
 * End config (do NOT modify below this)
 **************************************************************************/

/// Number of priority levels, i.e. valid priorities are `0..PRIO_LEVELS`.
pub const PRIO_LEVELS: usize = MAX_PRIORITY_LEVEL as usize + 1;

/// Priority reserved for the idle task.
pub const PRIO_IDLE: u8 = 0;

/// Minimum stack size the port will accept for `os_task_create`, in
/// stack-element units.
pub const CFG_STK_SIZE_MIN: usize = 32;

/// Idle task's own stack size, in stack-element units.
pub const CFG_IDLE_STK_SIZE: usize = 64;
