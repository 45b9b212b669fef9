use std::io::Write;

use icap_types::{IcapMessage, Method, SectionKind, StartLine, Terminator, ICAP_VERSION};
use icap_wire::{chunked, encapsulated};

use crate::error::EncodeError;

/// Serializes [`IcapMessage`] values to ICAP/1.0 wire bytes.
///
/// The `Encapsulated` header is always computed here from the message's
/// sections; any `Encapsulated` field left in `headers` is ignored. Section
/// offsets stored on the message are ignored as well, since the layout is
/// derived from each section's serialized length.
///
/// Output layout:
///
/// ```text
///   REQMOD icap://host/service ICAP/1.0\r\n      ← start line
///   Host: host\r\n                                ← headers, in order
///   Encapsulated: req-hdr=0, req-body=147\r\n     ← only if sections exist
///   \r\n
///   <req-hdr bytes, verbatim>                     ← offset 0
///   1e\r\n...\r\n0\r\n\r\n                        ← offset 147, chunked
/// ```
///
/// Messages are validated before anything is written:
///
/// - header names must be tokens and values must not contain CR or LF;
/// - sections follow the canonical order `req-hdr`, `res-hdr`, body, with
///   exactly one body kind in the last position;
/// - requests only carry the sections their method permits;
/// - header sections are non-empty, so every offset is strictly greater
///   than the previous one.
pub struct IcapEncoder;

impl IcapEncoder {
    /// Encode a message into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the message violates a structural rule.
    pub fn encode(message: &IcapMessage) -> Result<Vec<u8>, EncodeError> {
        let body_len: usize = message.sections.iter().map(|s| s.encoded_len()).sum();
        let mut out = Vec::with_capacity(256 + body_len);
        Self::write_to(message, &mut out)?;
        Ok(out)
    }

    /// Encode a message into `w`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if validation fails or the writer errors.
    pub fn write_to(message: &IcapMessage, w: &mut impl Write) -> Result<usize, EncodeError> {
        Self::validate(message)?;

        let mut head = String::with_capacity(256);
        match &message.start {
            StartLine::Request { method, uri } => {
                head.push_str(method.as_str());
                head.push(' ');
                head.push_str(uri);
                head.push(' ');
                head.push_str(ICAP_VERSION);
            }
            StartLine::Response { status, reason } => {
                head.push_str(ICAP_VERSION);
                head.push(' ');
                head.push_str(&status.as_u16().to_string());
                head.push(' ');
                head.push_str(reason);
            }
        }
        head.push_str("\r\n");

        for (name, value) in message.headers.iter() {
            if name.eq_ignore_ascii_case("Encapsulated") {
                continue;
            }
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        if !message.sections.is_empty() {
            let value =
                encapsulated::build(message.sections.iter().map(|s| (s.kind, s.encoded_len())));
            head.push_str("Encapsulated: ");
            head.push_str(&value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        w.write_all(head.as_bytes())?;
        let mut written = head.len();

        for section in &message.sections {
            written += match section.kind {
                SectionKind::NullBody => 0,
                SectionKind::RequestHeader | SectionKind::ResponseHeader => {
                    w.write_all(&section.payload)?;
                    section.payload.len()
                }
                SectionKind::RequestBody | SectionKind::ResponseBody | SectionKind::OptionsBody => {
                    chunked::write_chunked(w, &section.payload, section.terminator())?
                }
            };
        }

        tracing::trace!(
            bytes = written,
            sections = message.sections.len(),
            "encoded ICAP message"
        );
        Ok(written)
    }

    /// Encode the remainder of a previewed body, sent by the client after
    /// a `100 Continue`.
    pub fn encode_continuation(payload: &[u8]) -> Vec<u8> {
        chunked::encode(payload, Terminator::Plain)
    }

    /// Check every rule [`write_to`](Self::write_to) enforces without
    /// producing output.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as an [`EncodeError`].
    pub fn validate(message: &IcapMessage) -> Result<(), EncodeError> {
        validate_start_line(&message.start)?;
        for (name, value) in message.headers.iter() {
            validate_header(name, value)?;
        }
        validate_sections(message)
    }
}

fn validate_start_line(start: &StartLine) -> Result<(), EncodeError> {
    match start {
        StartLine::Request { uri, .. } => {
            if uri.is_empty() {
                return Err(EncodeError::InvalidStartLine {
                    reason: "service URI is empty",
                });
            }
            if uri.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
                return Err(EncodeError::InvalidStartLine {
                    reason: "service URI contains whitespace or control bytes",
                });
            }
        }
        StartLine::Response { reason, .. } => {
            if reason.bytes().any(|b| b == b'\r' || b == b'\n') {
                return Err(EncodeError::InvalidStartLine {
                    reason: "reason phrase contains CR or LF",
                });
            }
        }
    }
    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), EncodeError> {
    let invalid = |reason| EncodeError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if !name.bytes().all(is_token_byte) {
        return Err(invalid("name is not a token"));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(invalid("value contains CR or LF"));
    }
    Ok(())
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn validate_sections(message: &IcapMessage) -> Result<(), EncodeError> {
    let mut previous: Option<SectionKind> = None;
    for section in &message.sections {
        let kind = section.kind;
        if let Some(prev) = previous {
            if prev.is_body() {
                return Err(EncodeError::MisplacedBody {
                    section: prev.name(),
                });
            }
            if kind.rank() <= prev.rank() {
                return Err(EncodeError::SectionOrder {
                    section: kind.name(),
                    previous: prev.name(),
                });
            }
        }
        if kind.is_header() && section.payload.is_empty() {
            return Err(EncodeError::EmptyHeaderSection {
                section: kind.name(),
            });
        }
        previous = Some(kind);
    }

    let context = context(message.method());
    if let Some(method) = message.method() {
        let allowed = allowed_sections(method);
        if let Some(section) = message.sections.iter().find(|s| !allowed.contains(&s.kind)) {
            return Err(EncodeError::SectionNotAllowed {
                section: section.kind.name(),
                context,
            });
        }
        if method.is_modification() && previous.is_none() {
            return Err(EncodeError::MissingBody { context });
        }
    }
    if previous.is_some_and(SectionKind::is_header) {
        return Err(EncodeError::MissingBody { context });
    }
    Ok(())
}

fn allowed_sections(method: Method) -> &'static [SectionKind] {
    match method {
        Method::ReqMod => &[
            SectionKind::RequestHeader,
            SectionKind::RequestBody,
            SectionKind::NullBody,
        ],
        Method::RespMod => &[
            SectionKind::RequestHeader,
            SectionKind::ResponseHeader,
            SectionKind::ResponseBody,
            SectionKind::NullBody,
        ],
        Method::Options => &[SectionKind::OptionsBody, SectionKind::NullBody],
    }
}

fn context(method: Option<Method>) -> &'static str {
    match method {
        Some(Method::ReqMod) => "REQMOD request",
        Some(Method::RespMod) => "RESPMOD request",
        Some(Method::Options) => "OPTIONS request",
        None => "response",
    }
}
