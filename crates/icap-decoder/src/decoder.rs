use icap_types::{EncapsulatedSection, IcapMessage, SectionKind, StartLine, Terminator};
use icap_wire::{ChunkedBody, EncapsulatedEntry};

use crate::error::DecodeError;
use crate::head::parse_head;

/// Parses ICAP/1.0 wire bytes into [`IcapMessage`] values.
///
/// Decoding happens in two passes over an in-memory buffer:
///
/// 1. **Head**: the start line and header fields up to the blank line.
///    The `Encapsulated` field is resolved into ordered section entries and
///    removed from the returned headers.
///
/// 2. **Sections**: each entry is sliced out of the bytes that follow the
///    head, relative to its offset. Header sections run up to the next
///    entry's offset and are kept verbatim. Chunked body sections are
///    de-chunked, recording whether they ended with `ieof`. `null-body`
///    contributes no bytes.
///
/// ```text
///   ┌────────────────────────┐
///   │ head (Head::len bytes) │
///   ├────────────────────────┤ ◄── offset 0
///   │ req-hdr  [0, 147)      │     sliced verbatim
///   │ req-body [147, ...)    │     chunked, decoded until terminator
///   └────────────────────────┘
/// ```
///
/// The plain entry points require the buffer to hold exactly one message;
/// the `_prefix` variants stop after the message and return how many bytes
/// it occupied, for hosts that buffer several messages or a preview
/// followed by its continuation.
pub struct IcapDecoder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expect {
    Request,
    Response,
    Any,
}

impl IcapDecoder {
    /// Decode one request or response occupying all of `buf`.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; [`DecodeError::TrailingData`] if bytes remain.
    pub fn decode(buf: &[u8]) -> Result<IcapMessage, DecodeError> {
        exact(buf, decode_with(buf, Expect::Any)?)
    }

    /// # Errors
    ///
    /// Any [`DecodeError`] except `TrailingData`.
    pub fn decode_prefix(buf: &[u8]) -> Result<(IcapMessage, usize), DecodeError> {
        decode_with(buf, Expect::Any)
    }

    /// Decode a request occupying all of `buf`.
    ///
    /// # Errors
    ///
    /// As [`decode`](Self::decode), plus
    /// [`DecodeError::UnexpectedMessageKind`] for a response.
    pub fn decode_request(buf: &[u8]) -> Result<IcapMessage, DecodeError> {
        exact(buf, decode_with(buf, Expect::Request)?)
    }

    /// # Errors
    ///
    /// As [`decode_request`](Self::decode_request), without the
    /// trailing-data check.
    pub fn decode_request_prefix(buf: &[u8]) -> Result<(IcapMessage, usize), DecodeError> {
        decode_with(buf, Expect::Request)
    }

    /// Decode a response occupying all of `buf`.
    ///
    /// # Errors
    ///
    /// As [`decode`](Self::decode), plus
    /// [`DecodeError::UnexpectedMessageKind`] for a request.
    pub fn decode_response(buf: &[u8]) -> Result<IcapMessage, DecodeError> {
        exact(buf, decode_with(buf, Expect::Response)?)
    }

    /// # Errors
    ///
    /// As [`decode_response`](Self::decode_response), without the
    /// trailing-data check.
    pub fn decode_response_prefix(buf: &[u8]) -> Result<(IcapMessage, usize), DecodeError> {
        decode_with(buf, Expect::Response)
    }
}

fn exact(buf: &[u8], (message, consumed): (IcapMessage, usize)) -> Result<IcapMessage, DecodeError> {
    if consumed < buf.len() {
        return Err(DecodeError::TrailingData {
            extra_bytes: buf.len() - consumed,
        });
    }
    Ok(message)
}

fn decode_with(buf: &[u8], expect: Expect) -> Result<(IcapMessage, usize), DecodeError> {
    let head = parse_head(buf)?;

    let found = match head.start {
        StartLine::Request { .. } => "request",
        StartLine::Response { .. } => "response",
    };
    match (expect, found) {
        (Expect::Request, "response") => {
            return Err(DecodeError::UnexpectedMessageKind {
                expected: "request",
                found,
            });
        }
        (Expect::Response, "request") => {
            return Err(DecodeError::UnexpectedMessageKind {
                expected: "response",
                found,
            });
        }
        _ => {}
    }

    let entries = match head.encapsulated {
        Some(entries) => entries,
        None => {
            if let StartLine::Request { method, .. } = &head.start {
                if method.is_modification() {
                    return Err(DecodeError::MalformedHeaderBlock {
                        offset: head.len,
                        reason: "REQMOD/RESPMOD request without an Encapsulated header",
                    });
                }
            }
            Vec::new()
        }
    };

    let (sections, body_len) = decode_sections(&buf[head.len..], &entries, head.len)?;
    let consumed = head.len + body_len;

    tracing::trace!(
        kind = found,
        sections = sections.len(),
        bytes = consumed,
        "decoded ICAP message"
    );

    let message = IcapMessage {
        start: head.start,
        headers: head.headers,
        sections,
    };
    Ok((message, consumed))
}

/// Slice and decode every section. Returns the sections and the number of
/// bytes of `blob` they occupy.
fn decode_sections(
    blob: &[u8],
    entries: &[EncapsulatedEntry],
    base: usize,
) -> Result<(Vec<EncapsulatedSection>, usize), DecodeError> {
    let mut sections = Vec::with_capacity(entries.len());
    let mut end = 0;

    for (i, entry) in entries.iter().enumerate() {
        let kind = entry.kind;
        let start = entry.offset;
        let truncated = |needed| DecodeError::TruncatedSection {
            section: kind.name(),
            offset: base + start,
            needed,
            available: blob.len().saturating_sub(start),
        };

        let (payload, ieof, section_end) = match kind {
            SectionKind::RequestHeader | SectionKind::ResponseHeader => {
                // A body entry always follows a header entry.
                let next = entries.get(i + 1).map_or(blob.len(), |e| e.offset);
                let bytes = blob.get(start..next).ok_or_else(|| truncated(next - start))?;
                (bytes.to_vec(), false, next)
            }
            SectionKind::NullBody => {
                if start > blob.len() {
                    return Err(truncated(0));
                }
                (Vec::new(), false, start)
            }
            SectionKind::RequestBody | SectionKind::ResponseBody | SectionKind::OptionsBody => {
                let rest = blob
                    .get(start..)
                    .ok_or_else(|| truncated(Terminator::Plain.as_bytes().len()))?;
                let (body, consumed) =
                    ChunkedBody::read_from(rest).map_err(|source| DecodeError::Section {
                        section: kind.name(),
                        offset: base + start,
                        source,
                    })?;
                (body.payload, body.terminator.is_ieof(), start + consumed)
            }
        };

        sections.push(EncapsulatedSection {
            kind,
            offset: start,
            payload,
            ieof,
        });
        end = section_end;
    }

    Ok((sections, end))
}
