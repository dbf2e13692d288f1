//! Fuzz target: credential expiry conversion on arbitrary JSON.
//!
//! Conversion must not panic, and converting an already converted payload
//! must leave it unchanged.

#![no_main]

use clouding_core::expiry::{convert_expiry_to_client, convert_expiry_to_utc};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    convert_expiry_to_utc(&mut payload);
    let once = payload.clone();
    convert_expiry_to_utc(&mut payload);
    assert_eq!(payload, once, "outbound conversion is not idempotent");

    convert_expiry_to_client(&mut payload);
    let once = payload.clone();
    convert_expiry_to_client(&mut payload);
    assert_eq!(payload, once, "inbound conversion is not idempotent");
});
