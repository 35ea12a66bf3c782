//! Queue + event group demo: a producer pushes fixed-size messages onto a
//! bounded queue and signals an event flag once a batch is ready; a
//! consumer drains the queue only after seeing that flag.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

use cortex_m_rt::entry;
use defmt::info;

use daedalus_os::event::EventGroup;
use daedalus_os::queue::Queue;
use daedalus_os::task::{os_task_create, os_task_sleep};
use daedalus_os::types::OsStkElement;

const BATCH_READY: u8 = 0b001;
const ITEM_SIZE: usize = 4;

static QUEUE: Queue = Queue::new();
static EVENTS: EventGroup = EventGroup::new();

static mut QUEUE_STORAGE: [u8; ITEM_SIZE * 4] = [0; ITEM_SIZE * 4];
static mut PRODUCER_STK: [OsStkElement; 256] = [0; 256];
static mut CONSUMER_STK: [OsStkElement; 256] = [0; 256];

fn producer_task(_arg: *mut ()) -> ! {
    let mut counter: u32 = 0;
    loop {
        for _ in 0..4 {
            counter = counter.wrapping_add(1);
            let item = counter.to_le_bytes();
            if QUEUE.send(&item, u32::MAX).is_ok() {
                info!("[P] sent #{}", counter);
            }
        }
        EVENTS.set(BATCH_READY);
        os_task_sleep(100);
    }
}

fn consumer_task(_arg: *mut ()) -> ! {
    loop {
        let _ = EVENTS.wait(BATCH_READY, u32::MAX);
        let mut out = [0u8; ITEM_SIZE];
        while QUEUE.recv(&mut out, 0).is_ok() {
            info!("[C] received #{}", u32::from_le_bytes(out));
        }
    }
}

#[entry]
fn main() -> ! {
    info!("Queue + Event Group Demo");

    daedalus_os::os_init().expect("os_init failed");
    QUEUE.create(unsafe { &mut QUEUE_STORAGE }, ITEM_SIZE, "queue");
    EVENTS.create("batch_ready");

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
