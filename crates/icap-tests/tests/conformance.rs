//! Conformance tests: the exact bytes the host sends for each captured
//! exchange, pinned with insta snapshots in `tests/snapshots/`.
//!
//! Responses are rendered with every CRLF spelled out as `\r\n` followed by
//! a newline, so a snapshot diff shows a missing or extra line ending as
//! clearly as a changed header.
//!
//! The engine runs with a fixed `ISTag` and `Server` (see
//! [`icap_tests::config`]) so the snapshots do not change with the crate
//! version. A diff signals either a deliberate wire change (accept via
//! `cargo insta review`) or a regression.

use icap_driver::{AdapterKind, Host};
use icap_tests::{
    host, options_request, reqmod_get, reqmod_post, reqmod_preview_ieof, reqmod_preview_partial,
    respmod, visible_crlf,
};
use insta::assert_snapshot;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ready(adapter: AdapterKind) -> Host {
    let host = host(adapter);
    host.init().expect("init");
    host
}

fn modify(adapter: AdapterKind, raw: &[u8]) -> String {
    let bytes = ready(adapter)
        .modify(raw)
        .unwrap_or_else(|e| panic!("modify failed with {adapter}: {e}"));
    visible_crlf(&bytes)
}

fn preview(adapter: AdapterKind, raw: &[u8]) -> String {
    let bytes = ready(adapter)
        .preview(raw)
        .unwrap_or_else(|e| panic!("preview failed with {adapter}: {e}"));
    visible_crlf(&bytes)
}

// ── OPTIONS ───────────────────────────────────────────────────────────────────

#[test]
fn options_response() {
    assert_snapshot!(
        "options_response",
        modify(AdapterKind::PreviewEcho, &options_request())
    );
}

// ── REQMOD ────────────────────────────────────────────────────────────────────

#[test]
fn reqmod_get_echoed() {
    assert_snapshot!(
        "reqmod_get_echoed",
        modify(AdapterKind::PreviewEcho, &reqmod_get())
    );
}

#[test]
fn reqmod_post_declined() {
    assert_snapshot!(
        "reqmod_post_declined",
        modify(AdapterKind::Decline, &reqmod_post())
    );
}

#[test]
fn reqmod_preview_ieof_no_content() {
    assert_snapshot!(
        "reqmod_preview_ieof_no_content",
        preview(AdapterKind::PreviewEcho, &reqmod_preview_ieof())
    );
}

#[test]
fn reqmod_preview_partial_continue() {
    let (raw, _) = reqmod_preview_partial();
    assert_snapshot!(
        "reqmod_preview_partial_continue",
        preview(AdapterKind::PreviewEcho, &raw)
    );
}

// ── RESPMOD ───────────────────────────────────────────────────────────────────

#[test]
fn respmod_echoed() {
    assert_snapshot!("respmod_echoed", modify(AdapterKind::Echo, &respmod()));
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn malformed_request_reply() {
    let err = ready(AdapterKind::Echo)
        .modify(b"REQMOD icap://icap.server.net/sample-service ICAP/1.0\r\nHost: localhost\r\n\r\n")
        .expect_err("REQMOD needs an Encapsulated header");
    let bytes = err.response_bytes().expect("malformed requests get a reply");
    assert_snapshot!("malformed_request_reply", visible_crlf(&bytes));
}
