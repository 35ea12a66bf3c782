//! Blink example: two periodic tasks at the same priority, round-robining
//! on the tick. No LED wiring here (that lived in the teacher's PAC-gated
//! demo); this crate's own examples favor `daedalus_os`'s own primitives.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

use cortex_m_rt::entry;
use defmt::info;

use daedalus_os::task::{os_task_create, os_task_sleep};
use daedalus_os::types::OsStkElement;

static mut BLINK_STK: [OsStkElement; 256] = [0; 256];
static mut HEARTBEAT_STK: [OsStkElement; 256] = [0; 256];

fn blink_task(_arg: *mut ()) -> ! {
    info!("blink task started");
    loop {
        info!("LED ON");
        os_task_sleep(500);
        info!("LED OFF");
        os_task_sleep(500);
    }
}

fn heartbeat_task(_arg: *mut ()) -> ! {
    info!("heartbeat task started");
    loop {
        info!("tick");
        os_task_sleep(1000);
    }
}

#[entry]
fn main() -> ! {
    daedalus_os::os_init().expect("os_init failed");

    os_task_create("blink", blink_task, core::ptr::null_mut(), unsafe { &mut BLINK_STK }, 5)
        .expect("blink task create failed");
    os_task_create("heartbeat", heartbeat_task, core::ptr::null_mut(), unsafe { &mut HEARTBEAT_STK }, 5)
        .expect("heartbeat task create failed");

    info!("starting kernel");
    daedalus_os::os_start().expect("os_start failed");

    loop {
        cortex_m::asm::nop();
    }
}
