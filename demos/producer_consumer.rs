//! Producer-consumer example using a counting semaphore.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::entry;
use defmt::info;

use daedalus_os::sem::Semaphore;
use daedalus_os::task::{os_task_create, os_task_sleep};
use daedalus_os::types::OsStkElement;

static PRODUCED: AtomicU32 = AtomicU32::new(0);
static CONSUMED: AtomicU32 = AtomicU32::new(0);

static SEM: Semaphore = Semaphore::new(0);

static mut PRODUCER_STK: [OsStkElement; 256] = [0; 256];
static mut CONSUMER_STK: [OsStkElement; 256] = [0; 256];

fn producer_task(_arg: *mut ()) -> ! {
    loop {
        let n = PRODUCED.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = SEM.signal();
        info!("[P] produced #{}", n);
        os_task_sleep(200);
    }
}

fn consumer_task(_arg: *mut ()) -> ! {
    loop {
        let _ = SEM.wait(u32::MAX);
        let n = CONSUMED.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[C] consumed #{}", n);
    }
}

#[entry]
fn main() -> ! {
    info!("Producer-Consumer Demo");

    daedalus_os::os_init().expect("os_init failed");
    SEM.create(0, "sem");

    // Consumer is the lower-priority task here: it spends most of its
    // time blocked, so giving the producer the higher number (this
    // kernel's numbering runs opposite of the teacher's) keeps the
    // demo's round-robin behavior readable.
    unsafe {
        os_task_create("P", producer_task, core::ptr::null_mut(), &mut PRODUCER_STK, 10).unwrap();
        os_task_create("C", consumer_task, core::ptr::null_mut(), &mut CONSUMER_STK, 5).unwrap();
    }

    info!("Starting...");
    daedalus_os::os_start().expect("os_start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
