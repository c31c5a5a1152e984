//! Fuzz target: bridge request decoding
//!
//! Parses arbitrary bytes as a JSON `BridgeRequest` and verifies:
//! - No panics on malformed input
//! - Accepted requests re-encode to JSON that parses to the same request
//!
//! cargo fuzz run fuzz_bridge_request

#![no_main]

use intercom_door::app::commands::BridgeRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(request) = serde_json::from_slice::<BridgeRequest>(data) else {
        return;
    };
    let encoded = serde_json::to_vec(&request).expect("request must serialize");
    let decoded: BridgeRequest = serde_json::from_slice(&encoded).expect("re-encoded request must parse");
    assert_eq!(decoded, request);
});
