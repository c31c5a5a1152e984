//! Fuzz target: site configuration JSON
//!
//! Feeds arbitrary bytes to `SiteConfig::from_json` and verifies:
//! - No panics on malformed or hostile JSON
//! - Anything accepted passes `validate()`
//! - Anything accepted survives a serialize/parse round trip unchanged
//!
//! cargo fuzz run fuzz_site_config

#![no_main]

use intercom_door::config::SiteConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(site) = SiteConfig::from_json(json) else {
        return;
    };

    assert!(site.validate().is_ok(), "from_json accepted an invalid config");

    let encoded = serde_json::to_string(&site).expect("accepted config must serialize");
    let decoded = SiteConfig::from_json(&encoded).expect("serialized config must parse");
    assert_eq!(decoded, site);
});
