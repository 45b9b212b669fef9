#![no_main]

use icap_wire::chunked::{encode, ChunkedBody};
use libfuzzer_sys::fuzz_target;

// Fuzz target: chunked transfer coding.
//
// Any stream that decodes must re-encode to a stream that decodes to the
// same payload and terminator.
fuzz_target!(|data: &[u8]| {
    let Ok((body, consumed)) = ChunkedBody::read_from(data) else {
        return;
    };
    assert!(consumed <= data.len());

    let reencoded = encode(&body.payload, body.terminator);
    let (again, used) = ChunkedBody::read_from(&reencoded).expect("re-encoded stream decodes");
    assert_eq!(used, reencoded.len());
    assert_eq!(again, body);
});
