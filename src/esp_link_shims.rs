//! `critical-section` 1.x symbols for the ESP-IDF build.
//!
//! The bridge and notification channels (`embassy-sync`) lock through
//! `critical-section`. Here that is a re-entrant lock shared by every
//! FreeRTOS task: the owning thread may nest, others block on a condvar.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

struct Owner {
    thread: Option<ThreadId>,
    depth: u8,
}

static OWNER: Mutex<Owner> = Mutex::new(Owner {
    thread: None,
    depth: 0,
});
static RELEASED: Condvar = Condvar::new();

fn owner() -> MutexGuard<'static, Owner> {
    // The guarded state is two plain fields; a poisoned lock is still valid.
    OWNER.lock().unwrap_or_else(PoisonError::into_inner)
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    let me = thread::current().id();
    let mut owner = owner();
    while owner.thread.is_some_and(|t| t != me) {
        owner = RELEASED
            .wait(owner)
            .unwrap_or_else(PoisonError::into_inner);
    }
    owner.thread = Some(me);
    owner.depth = owner.depth.saturating_add(1);
    owner.depth
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    let mut owner = owner();
    if owner.thread != Some(thread::current().id()) || owner.depth == 0 {
        return;
    }
    owner.depth -= 1;
    if owner.depth == 0 {
        owner.thread = None;
        RELEASED.notify_one();
    }
}
