#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    // Must never panic; every failure is a typed parse error.
    if let Err(e) = cblite_mango::parse_query(data) {
        assert!(e.is_parse_error());
    }
});
