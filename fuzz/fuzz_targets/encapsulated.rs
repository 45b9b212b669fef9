#![no_main]

use icap_wire::encapsulated;
use libfuzzer_sys::fuzz_target;

// Fuzz target: Encapsulated header values.
//
// Accepted values have strictly increasing offsets and format back to a
// value that parses to the same entries.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(entries) = encapsulated::parse(value) else {
        return;
    };
    assert!(entries.windows(2).all(|w| w[0].offset < w[1].offset));

    let formatted = encapsulated::format(&entries);
    assert_eq!(encapsulated::parse(&formatted).expect("formatted value parses"), entries);
});
