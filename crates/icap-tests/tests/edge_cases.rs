//! Edge cases: malformed input, truncation, and the lenient corners of the
//! wire format that real clients exercise.

use icap_decoder::{DecodeError, IcapDecoder, merge_continuation};
use icap_driver::{AdapterKind, DriverError, HostError};
use icap_tests::{POST_HEADER, host, reqmod_post, reqmod_preview_ieof, reqmod_preview_partial};
use icap_types::{Method, PreviewState, SectionKind, TypeError};
use icap_wire::WireError;

fn post_with_body(body: &[u8]) -> Vec<u8> {
    let mut raw = b"REQMOD icap://h/s ICAP/1.0\r\nEncapsulated: req-hdr=0, req-body=147\r\n\r\n"
        .to_vec();
    raw.extend_from_slice(POST_HEADER);
    raw.extend_from_slice(body);
    raw
}

fn body_offset() -> usize {
    post_with_body(b"").len()
}

// ── Chunked bodies ────────────────────────────────────────────────────────────

#[test]
fn multiple_chunks_and_extensions_are_joined() {
    let raw = post_with_body(b"4;name=value\r\nI am\r\n1A\r\n posting this information.\r\n0\r\n\r\n");
    let request = IcapDecoder::decode_request(&raw).expect("decodes");
    let body = request.body_section().expect("body");
    assert_eq!(body.payload, b"I am posting this information.");
    assert!(!body.ieof);
}

#[test]
fn ieof_is_case_insensitive() {
    let raw = post_with_body(b"3\r\nabc\r\n0; IEOF\r\n\r\n");
    let request = IcapDecoder::decode_request(&raw).expect("decodes");
    assert!(request.body_section().expect("body").ieof);
}

#[test]
fn trailers_after_last_chunk_are_skipped() {
    let raw = post_with_body(b"3\r\nabc\r\n0\r\nX-Checksum: 1\r\n\r\n");
    let request = IcapDecoder::decode_request(&raw).expect("decodes");
    assert_eq!(request.body_section().expect("body").payload, b"abc");
}

#[test]
fn bad_chunk_size_reports_section_and_offset() {
    let raw = post_with_body(b"zz\r\nabc\r\n0\r\n\r\n");
    let err = IcapDecoder::decode_request(&raw).expect_err("bad size");
    match err {
        DecodeError::Section {
            section,
            offset,
            source: WireError::MalformedChunk { offset: inner, .. },
        } => {
            assert_eq!(section, "req-body");
            assert_eq!(offset, body_offset());
            assert_eq!(inner, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn chunk_longer_than_declared_is_rejected() {
    let raw = post_with_body(b"2\r\nabc\r\n0\r\n\r\n");
    let err = IcapDecoder::decode_request(&raw).expect_err("size mismatch");
    assert!(matches!(
        err,
        DecodeError::Section {
            source: WireError::MalformedChunk { offset: 5, .. },
            ..
        }
    ));
}

#[test]
fn missing_terminator_is_rejected() {
    let raw = post_with_body(b"3\r\nabc\r\n");
    let err = IcapDecoder::decode_request(&raw).expect_err("no zero chunk");
    assert!(matches!(err, DecodeError::Section { section: "req-body", .. }));
}

// ── Head parsing ──────────────────────────────────────────────────────────────

#[test]
fn folded_header_lines_are_unfolded() {
    let raw = b"OPTIONS icap://h/s ICAP/1.0\r\nUser-Agent: ICAP\r\n  tester\r\n\r\n";
    let request = IcapDecoder::decode_request(raw).expect("decodes");
    assert_eq!(request.headers.get("User-Agent"), Some("ICAP tester"));
}

#[test]
fn header_names_are_case_insensitive() {
    let raw = b"OPTIONS icap://h/s ICAP/1.0\r\nhOsT: h\r\n\r\n";
    let request = IcapDecoder::decode_request(raw).expect("decodes");
    assert_eq!(request.headers.get("Host"), Some("h"));
}

#[test]
fn reqmod_without_encapsulated_is_malformed() {
    let err = IcapDecoder::decode_request(b"REQMOD icap://h/s ICAP/1.0\r\nHost: h\r\n\r\n")
        .expect_err("missing Encapsulated");
    assert!(matches!(err, DecodeError::MalformedHeaderBlock { .. }));
}

#[test]
fn unknown_section_kind_is_rejected() {
    let err = IcapDecoder::decode_request(
        b"REQMOD icap://h/s ICAP/1.0\r\nEncapsulated: req-hdr=0, foo-body=10\r\n\r\n",
    )
    .expect_err("unknown kind");
    assert!(matches!(
        err,
        DecodeError::Encapsulated(WireError::UnknownSectionKind { .. })
    ));
}

#[test]
fn malformed_start_lines() {
    for raw in [
        &b"REQMOD icap://h/s HTTP/1.1\r\n\r\n"[..],
        b"REQMOD\r\n\r\n",
        b"ICAP/1.0 abc OK\r\n\r\n",
    ] {
        let err = IcapDecoder::decode(raw).expect_err("malformed");
        assert!(
            matches!(err, DecodeError::MalformedStartLine { .. } | DecodeError::Type(_)),
            "unexpected error for {:?}: {err:?}",
            String::from_utf8_lossy(raw)
        );
    }
}

#[test]
fn unknown_method_is_unsupported_not_malformed() {
    let err = IcapDecoder::decode(b"PURGE icap://h/s ICAP/1.0\r\n\r\n").expect_err("unknown");
    assert!(matches!(err, DecodeError::UnsupportedMethod { ref method } if method == "PURGE"));
}

#[test]
fn methods_are_case_sensitive() {
    assert!("reqmod".parse::<Method>().is_err());
    assert!(matches!(
        "reqmod".parse::<Method>(),
        Err(TypeError::UnsupportedMethod { .. })
    ));
}

#[test]
fn header_section_past_end_of_buffer_is_truncated() {
    let err = IcapDecoder::decode_request(
        b"REQMOD icap://h/s ICAP/1.0\r\nEncapsulated: req-hdr=0, null-body=170\r\n\r\nGET / HTTP/1.1\r\n",
    )
    .expect_err("truncated");
    assert!(matches!(
        err,
        DecodeError::TruncatedSection {
            section: "null-body",
            ..
        } | DecodeError::TruncatedSection {
            section: "req-hdr",
            ..
        }
    ));
}

#[test]
fn trailing_bytes_are_rejected_unless_prefix() {
    let mut raw = reqmod_post();
    let len = raw.len();
    raw.extend_from_slice(b"OPTIONS");

    assert!(matches!(
        IcapDecoder::decode_request(&raw),
        Err(DecodeError::TrailingData { extra_bytes: 7 })
    ));
    let (_, consumed) = IcapDecoder::decode_request_prefix(&raw).expect("prefix decodes");
    assert_eq!(consumed, len);
}

#[test]
fn response_where_request_expected() {
    let err = IcapDecoder::decode_request(b"ICAP/1.0 204 No Content\r\n\r\n").expect_err("kind");
    assert!(matches!(
        err,
        DecodeError::UnexpectedMessageKind {
            expected: "request",
            ..
        }
    ));
}

// ── Preview state ─────────────────────────────────────────────────────────────

#[test]
fn preview_larger_than_announced_is_flagged() {
    let raw = b"REQMOD icap://h/s ICAP/1.0\r\nPreview: 2\r\nEncapsulated: req-hdr=0, req-body=18\r\n\r\n\
GET / HTTP/1.1\r\n\r\n4\r\nabcd\r\n0\r\n\r\n";
    let request = IcapDecoder::decode_request(raw).expect("decodes");
    let state = PreviewState::from_message(&request)
        .expect("valid")
        .expect("preview");
    assert!(state.exceeds_announced());
}

#[test]
fn preview_zero_with_null_body() {
    let raw = b"REQMOD icap://h/s ICAP/1.0\r\nPreview: 0\r\nEncapsulated: req-hdr=0, null-body=18\r\n\r\n\
GET / HTTP/1.1\r\n\r\n";
    let request = IcapDecoder::decode_request(raw).expect("decodes");
    let state = PreviewState::from_message(&request)
        .expect("valid")
        .expect("preview");
    assert_eq!(state.bytes_received, 0);
    assert!(state.saw_ieof, "nothing left to send after null-body");
    assert_eq!(request.sections[1].kind, SectionKind::NullBody);
}

// ── Continuations ─────────────────────────────────────────────────────────────

#[test]
fn continuation_after_ieof_is_rejected() {
    let mut request = IcapDecoder::decode_request(&reqmod_preview_ieof()).expect("decodes");
    let err = merge_continuation(&mut request, b"0\r\n\r\n").expect_err("already complete");
    assert!(matches!(err, DecodeError::ContinuationAfterIeof));
}

#[test]
fn continuation_without_body_is_rejected() {
    let mut request = IcapDecoder::decode_request(
        b"REQMOD icap://h/s ICAP/1.0\r\nEncapsulated: req-hdr=0, null-body=18\r\n\r\nGET / HTTP/1.1\r\n\r\n",
    )
    .expect("decodes");
    let err = merge_continuation(&mut request, b"0\r\n\r\n").expect_err("nothing to continue");
    assert!(matches!(err, DecodeError::NoBodyToContinue));
}

#[test]
fn resume_rejects_bytes_after_the_continuation() {
    let host = host(AdapterKind::Echo);
    host.init().expect("init");
    let (preview, mut rest) = reqmod_preview_partial();
    rest.extend_from_slice(b"junk");
    let err = host.resume(&preview, &rest).expect_err("trailing bytes");
    assert!(matches!(
        err,
        HostError::Malformed(DecodeError::TrailingData { extra_bytes: 4 })
    ));
}

// ── Host lifecycle ────────────────────────────────────────────────────────────

#[test]
fn double_init_is_a_lifecycle_error() {
    let host = host(AdapterKind::Echo);
    host.init().expect("first init");
    assert!(matches!(
        host.init(),
        Err(HostError::Driver(DriverError::Lifecycle { .. }))
    ));
}

#[test]
fn responses_are_not_handled() {
    let host = host(AdapterKind::Echo);
    host.init().expect("init");
    let err = host
        .modify(b"ICAP/1.0 204 No Content\r\nEncapsulated: null-body=0\r\n\r\n")
        .expect_err("a response is not a request");
    assert!(matches!(err, HostError::Malformed(DecodeError::UnexpectedMessageKind { .. })));
}
