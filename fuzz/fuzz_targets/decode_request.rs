#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: ICAP request decoding.
//
// Calls `IcapDecoder::decode_request_prefix(data)` on arbitrary input bytes.
// Catches bugs in:
// - Start line parsing (method, URI, version)
// - Header unfolding and field splitting
// - Encapsulated offset slicing against short buffers
// - Chunked body decoding inside sections
// A consumed count past the end of the input is a bug.
fuzz_target!(|data: &[u8]| {
    if let Ok((_, consumed)) = icap_decoder::IcapDecoder::decode_request_prefix(data) {
        assert!(consumed <= data.len());
    }
});
