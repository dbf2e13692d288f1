//! Fuzz target: `ResourceId::parse` on arbitrary path segments.
//!
//! An accepted ID must never contain a character that could change the
//! shape of a backend URL.

#![no_main]

use clouding_core::ResourceId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(id) = ResourceId::parse(raw) {
        assert!(!id.as_str().is_empty());
        assert!(
            !id.as_str().contains(['/', '?', '#', '%', '.']),
            "accepted unsafe id {raw:?}"
        );
        assert_eq!(id.to_string(), raw);
    }
});
