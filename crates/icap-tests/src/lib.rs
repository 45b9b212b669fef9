//! Captured ICAP exchanges shared by the integration tests, the benches and
//! the `write_captures` binary.
//!
//! The requests are the ones a simple test client sends to a local server:
//!
//! ```text
//! ┌─────────────────────────┬───────────────────────────────────────────────┐
//! │ Capture                 │ Shape                                         │
//! ├─────────────────────────┼───────────────────────────────────────────────┤
//! │ options_request         │ OPTIONS, no Encapsulated header               │
//! │ reqmod_get              │ req-hdr=0, null-body=170                      │
//! │ reqmod_post             │ req-hdr=0, req-body=147, 30-byte body         │
//! │ reqmod_preview_ieof     │ as reqmod_post, Preview: 1024, `0; ieof`      │
//! │ reqmod_preview_partial  │ as reqmod_post, Preview: 10, 10 of 30 bytes   │
//! │ respmod                 │ req-hdr=0, res-hdr=137, res-body=296          │
//! └─────────────────────────┴───────────────────────────────────────────────┘
//! ```

#![warn(clippy::pedantic)]

use icap_driver::{AdapterKind, DriverConfig, Engine, Host};
use icap_wire::{Terminator, chunked};

pub const SERVICE: &str = "icap://icap.server.net/sample-service";

/// 170 bytes.
pub const GET_HEADER: &[u8] = b"GET / HTTP/1.1\r\n\
Host: www.origin-server.com\r\n\
Accept: text/html, text/plain\r\n\
Accept-Encoding: compress\r\n\
Cookie: ff39fk3jur@4ii0e02i\r\n\
If-None-Match: \"xyzzy\", \"r2d2xxxe\"\r\n\r\n";

/// 147 bytes.
pub const POST_HEADER: &[u8] = b"POST /origin-resource/form.pl HTTP/1.1\r\n\
Host: www.origin-server.com\r\n\
Accept: text/html, text/plain\r\n\
Accept-Encoding: compress\r\n\
Pragma: no-cache\r\n\r\n";

/// 30 bytes, `1e` in the chunk-size line.
pub const POST_BODY: &[u8] = b"I am posting this information.";

/// 137 bytes.
pub const RESPMOD_REQUEST_HEADER: &[u8] = b"GET /origin-resource HTTP/1.1\r\n\
Host: www.origin-server.com\r\n\
Accept: text/html, text/plain, image/gif\r\n\
Accept-Encoding: gzip, compress\r\n\r\n";

/// 159 bytes.
pub const RESPMOD_RESPONSE_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\n\
Date: Mon, 10 Jan 2000 09:52:22 GMT\r\n\
Server: Apache/1.3.6 (Unix)\r\n\
ETag: \"63840-1ab7-378d415b\"\r\n\
Content-Type: text/html\r\n\
Content-Length: 51\r\n\r\n";

/// 51 bytes, `33` in the chunk-size line.
pub const ORIGIN_BODY: &[u8] = b"This is data that was returned by an origin server.";

/// Bytes of `POST_BODY` sent in the partial preview.
pub const PARTIAL_PREVIEW_LEN: usize = 10;

fn icap_head(method: &str, extra: &str, encapsulated: Option<&str>) -> Vec<u8> {
    let mut head = format!("{method} {SERVICE} ICAP/1.0\r\nHost: localhost\r\n{extra}");
    if let Some(value) = encapsulated {
        head.push_str("Encapsulated: ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head.into_bytes()
}

pub fn options_request() -> Vec<u8> {
    icap_head("OPTIONS", "User-Agent: ICAP tester\r\n", None)
}

pub fn reqmod_get() -> Vec<u8> {
    let mut raw = icap_head("REQMOD", "", Some("req-hdr=0, null-body=170"));
    raw.extend_from_slice(GET_HEADER);
    raw
}

pub fn reqmod_post() -> Vec<u8> {
    let mut raw = icap_head("REQMOD", "", Some("req-hdr=0, req-body=147"));
    raw.extend_from_slice(POST_HEADER);
    raw.extend_from_slice(&chunked::encode(POST_BODY, Terminator::Plain));
    raw
}

pub fn reqmod_preview_ieof() -> Vec<u8> {
    let mut raw = icap_head("REQMOD", "Preview: 1024\r\n", Some("req-hdr=0, req-body=147"));
    raw.extend_from_slice(POST_HEADER);
    raw.extend_from_slice(&chunked::encode(POST_BODY, Terminator::Ieof));
    raw
}

/// A preview of the first [`PARTIAL_PREVIEW_LEN`] body bytes, and the
/// continuation the client sends after `100 Continue`.
pub fn reqmod_preview_partial() -> (Vec<u8>, Vec<u8>) {
    let (preview, rest) = POST_BODY.split_at(PARTIAL_PREVIEW_LEN);
    let announce = format!("Preview: {PARTIAL_PREVIEW_LEN}\r\n");
    let mut raw = icap_head("REQMOD", &announce, Some("req-hdr=0, req-body=147"));
    raw.extend_from_slice(POST_HEADER);
    raw.extend_from_slice(&chunked::encode(preview, Terminator::Plain));
    (raw, chunked::encode(rest, Terminator::Plain))
}

pub fn respmod() -> Vec<u8> {
    let mut raw = icap_head(
        "RESPMOD",
        "",
        Some("req-hdr=0, res-hdr=137, res-body=296"),
    );
    raw.extend_from_slice(RESPMOD_REQUEST_HEADER);
    raw.extend_from_slice(RESPMOD_RESPONSE_HEADER);
    raw.extend_from_slice(&chunked::encode(ORIGIN_BODY, Terminator::Plain));
    raw
}

/// Engine configuration with a fixed `ISTag` and `Server`, so response
/// bytes are stable across builds.
pub fn config(adapter: AdapterKind) -> DriverConfig {
    DriverConfig {
        adapter,
        istag: Some("BITZ-conformance".to_string()),
        server: "icap-tests/1.0".to_string(),
        ..DriverConfig::default()
    }
}

/// An uninitialised host over [`config`].
pub fn host(adapter: AdapterKind) -> Host {
    Host::from_engine(Engine::new(config(adapter)))
}

/// Render wire bytes one line per CRLF, with the CRLF spelled out, so
/// snapshots show exactly where each line ends.
pub fn visible_crlf(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace("\r\n", "\\r\\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encapsulated_offsets_match_fixture_lengths() {
        assert_eq!(GET_HEADER.len(), 170);
        assert_eq!(POST_HEADER.len(), 147);
        assert_eq!(POST_BODY.len(), 0x1e);
        assert_eq!(RESPMOD_REQUEST_HEADER.len(), 137);
        assert_eq!(
            RESPMOD_REQUEST_HEADER.len() + RESPMOD_RESPONSE_HEADER.len(),
            296
        );
        assert_eq!(ORIGIN_BODY.len(), 0x33);
    }

    #[test]
    fn partial_preview_splits_the_body() {
        let (preview, rest) = reqmod_preview_partial();
        assert!(preview.ends_with(b"a\r\nI am posti\r\n0\r\n\r\n"));
        assert_eq!(rest, b"14\r\nng this information.\r\n0\r\n\r\n");
    }

    #[test]
    fn visible_crlf_marks_line_ends() {
        assert_eq!(visible_crlf(b"A\r\n\r\n"), "A\\r\\n\n\\r\\n\n");
    }
}
