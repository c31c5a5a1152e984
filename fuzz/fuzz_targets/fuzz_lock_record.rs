//! Fuzz target: persisted lock-state records
//!
//! Writes arbitrary bytes where a device's lock record lives, then reads
//! it back through `LockStatePort` and verifies:
//! - No panics on short, long or out-of-range records
//! - Only a single in-range byte decodes to a state
//! - A reconciler seeded from the record starts in a publishable state
//!
//! cargo fuzz run fuzz_lock_record

#![no_main]

use intercom_door::adapters::nvs::{decode_lock_state, lock_state_key, NvsAdapter};
use intercom_door::app::ports::{LockStatePort, StoragePort};
use intercom_door::lock::{LockStateCode, RuntimeState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = decode_lock_state(data);
    if data.len() != 1 {
        assert_eq!(decoded, None);
    }

    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    let key = lock_state_key("Front Door");
    if nvs.write("doorlock", &key, data).is_err() {
        return;
    }

    let restored = nvs.get_item("Front Door");
    if data.len() <= 4 {
        assert_eq!(restored, decoded);
    }

    let state = RuntimeState::restored(restored);
    assert_eq!(state.current, restored.unwrap_or(LockStateCode::Unknown));
});
