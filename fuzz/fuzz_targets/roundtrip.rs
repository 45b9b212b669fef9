#![no_main]

use arbitrary::Arbitrary;
use icap_decoder::IcapDecoder;
use icap_encoder::MessageBuilder;
use icap_types::Method;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    respmod: bool,
    headers: Vec<(u8, String)>,
    preview: Option<u16>,
    request_header: Vec<u8>,
    response_header: Vec<u8>,
    body: Option<Vec<u8>>,
    ieof: bool,
}

const HEADER_NAMES: [&str; 4] = ["Host", "Allow", "X-Client-IP", "User-Agent"];

// Fuzz target: build → encode → decode.
//
// Every message the builder accepts must decode back to itself.
fuzz_target!(|input: FuzzInput| {
    let method = if input.respmod { Method::RespMod } else { Method::ReqMod };
    let mut builder = MessageBuilder::request(method, "icap://fuzz/service");

    for (id, value) in &input.headers {
        // The decoder strips SP/HTAB around field values.
        if value.trim_matches([' ', '\t']) != value || value.chars().any(char::is_control) {
            continue;
        }
        builder.header(HEADER_NAMES[usize::from(*id) % HEADER_NAMES.len()], value);
    }
    if let Some(size) = input.preview {
        builder.preview(usize::from(size));
    }
    if !input.request_header.is_empty() {
        builder.req_hdr(&input.request_header);
    }
    if input.respmod && !input.response_header.is_empty() {
        builder.res_hdr(&input.response_header);
    }
    match (&input.body, input.respmod) {
        (Some(body), false) => builder.req_body(body),
        (Some(body), true) => builder.res_body(body),
        (None, _) => builder.null_body(),
    };
    if input.ieof {
        builder.ieof();
    }

    let Ok(bytes) = builder.encode() else {
        return;
    };
    let decoded = IcapDecoder::decode_request(&bytes).expect("encoded message decodes");
    assert_eq!(decoded, builder.build());
});
