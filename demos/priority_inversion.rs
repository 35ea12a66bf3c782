//! Priority inversion demo: mutex priority inheritance.
//!
//! Three tasks: High(20), Med(10), Low(3). Low grabs the mutex first; when
//! High later blocks on it, Low is boosted to High's priority for the
//! duration of the hold, so Med can't starve High out by monopolizing the
//! CPU between Low's acquire and release.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::entry;
use defmt::info;

use daedalus_os::mutex::Mutex;
use daedalus_os::task::{os_task_create, os_task_sleep};
use daedalus_os::types::OsStkElement;

static HIGH_RUNS: AtomicU32 = AtomicU32::new(0);
static LOW_RUNS: AtomicU32 = AtomicU32::new(0);

static MTX: Mutex = Mutex::new();

static mut HIGH_STK: [OsStkElement; 256] = [0; 256];
static mut MED_STK: [OsStkElement; 256] = [0; 256];
static mut LOW_STK: [OsStkElement; 256] = [0; 256];

/// High priority task (prio=20).
fn high_task_fn(_arg: *mut ()) -> ! {
    os_task_sleep(50);

    loop {
        let n = HIGH_RUNS.fetch_add(1, Ordering::Relaxed) + 1;

        let _ = MTX.lock(u32::MAX);
        info!("[HIGH] acquired #{}", n);
        for _ in 0..1_000 {
            cortex_m::asm::nop();
        }
        let _ = MTX.unlock();

        os_task_sleep(100);
    }
}

/// Medium priority task (prio=10), CPU-bound — the task priority
/// inheritance exists to stop from starving High.
fn med_task_fn(_arg: *mut ()) -> ! {
    loop {
        for _ in 0..50_000 {
            cortex_m::asm::nop();
        }
        os_task_sleep(10);
    }
}

/// Low priority task (prio=3), holds the mutex for a long stretch.
fn low_task_fn(_arg: *mut ()) -> ! {
    loop {
        let n = LOW_RUNS.fetch_add(1, Ordering::Relaxed) + 1;

        let _ = MTX.lock(u32::MAX);
        info!("[LOW] holding #{}", n);
        for _ in 0..100_000 {
            cortex_m::asm::nop();
        }
        let _ = MTX.unlock();

        os_task_sleep(200);
    }
}

#[entry]
fn main() -> ! {
    info!("Priority Inversion Demo: High(20) Med(10) Low(3)");

    daedalus_os::os_init().expect("os_init failed");
    MTX.create("mtx");

    unsafe {
        os_task_create("L", low_task_fn, core::ptr::null_mut(), &mut LOW_STK, 3).unwrap();
        os_task_create("M", med_task_fn, core::ptr::null_mut(), &mut MED_STK, 10).unwrap();
        os_task_create("H", high_task_fn, core::ptr::null_mut(), &mut HIGH_STK, 20).unwrap();
    }

    info!("Starting...");
    daedalus_os::os_start().expect("os_start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
