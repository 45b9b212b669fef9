use icap_wire::SectionKind;

use crate::headers::HeaderMap;
use crate::method::Method;
use crate::section::EncapsulatedSection;
use crate::status::StatusCode;

/// First line of an ICAP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartLine {
    /// `<METHOD> <icap-uri> ICAP/1.0`
    Request { method: Method, uri: String },
    /// `ICAP/1.0 <code> <reason>`
    Response { status: StatusCode, reason: String },
}

/// An ICAP request or response.
///
/// `headers` holds ICAP-level fields only. The `Encapsulated` field is not
/// stored here: the decoder turns it into `sections` and the encoder
/// regenerates it from `sections`, so the two can never disagree.
///
/// ```text
///   ┌──────────────────────────────┐
///   │ start line                   │
///   │ headers (Host, Preview, ...) │
///   │ Encapsulated: <from sections>│
///   │ CRLF                         │
///   ├──────────────────────────────┤  offset 0
///   │ sections[0]                  │
///   │ sections[1] ...              │
///   └──────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IcapMessage {
    pub start: StartLine,
    pub headers: HeaderMap,
    pub sections: Vec<EncapsulatedSection>,
}

impl IcapMessage {
    pub fn request(method: Method, uri: impl Into<String>) -> Self {
        Self {
            start: StartLine::Request {
                method,
                uri: uri.into(),
            },
            headers: HeaderMap::new(),
            sections: Vec::new(),
        }
    }

    /// A response whose reason phrase is the code's canonical one.
    pub fn response(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        Self {
            start: StartLine::Response {
                status,
                reason: reason.to_string(),
            },
            headers: HeaderMap::new(),
            sections: Vec::new(),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self.start, StartLine::Request { .. })
    }

    pub fn method(&self) -> Option<Method> {
        match self.start {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    pub fn service_uri(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { uri, .. } => Some(uri),
            StartLine::Response { .. } => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self.start {
            StartLine::Response { status, .. } => Some(status),
            StartLine::Request { .. } => None,
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&EncapsulatedSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> Option<&mut EncapsulatedSection> {
        self.sections.iter_mut().find(|s| s.kind == kind)
    }

    /// The terminating body section, if the message has sections.
    pub fn body_section(&self) -> Option<&EncapsulatedSection> {
        self.sections.last().filter(|s| s.kind.is_body())
    }

    /// Whether the message carries a chunked body (not `null-body`).
    pub fn has_body(&self) -> bool {
        self.body_section().is_some_and(|s| s.kind.is_chunked())
    }

    /// Append a section, placing it directly after the previous one.
    pub fn push_section(&mut self, mut section: EncapsulatedSection) -> &mut Self {
        section.offset = self
            .sections
            .last()
            .map_or(0, |last| last.offset + last.encoded_len());
        self.sections.push(section);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: EncapsulatedSection) -> Self {
        self.push_section(section);
        self
    }

    /// Recompute every section offset from the serialized section lengths.
    pub fn relayout(&mut self) {
        let mut offset = 0;
        for section in &mut self.sections {
            section.offset = offset;
            offset += section.encoded_len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_section_assigns_offsets() {
        let message = IcapMessage::request(Method::RespMod, "icap://h/s")
            .with_section(EncapsulatedSection::request_header(vec![b'a'; 137]))
            .with_section(EncapsulatedSection::response_header(vec![b'b'; 159]))
            .with_section(EncapsulatedSection::response_body("x"));
        let offsets: Vec<_> = message.sections.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 137, 296]);
        assert!(message.has_body());
    }

    #[test]
    fn accessors_follow_start_line() {
        let request = IcapMessage::request(Method::ReqMod, "icap://h/s");
        assert_eq!(request.method(), Some(Method::ReqMod));
        assert_eq!(request.service_uri(), Some("icap://h/s"));
        assert_eq!(request.status(), None);

        let response = IcapMessage::response(StatusCode::NO_CONTENT)
            .with_section(EncapsulatedSection::null_body());
        assert_eq!(response.status(), Some(StatusCode::NO_CONTENT));
        assert!(!response.has_body());
        assert_eq!(response.body_section().map(|s| s.kind), Some(SectionKind::NullBody));
    }

    #[test]
    fn relayout_fixes_stale_offsets() {
        let mut message = IcapMessage::request(Method::ReqMod, "icap://h/s")
            .with_section(EncapsulatedSection::request_header("abc"))
            .with_section(EncapsulatedSection::null_body());
        message.sections[0].payload = b"abcdef".to_vec();
        message.relayout();
        assert_eq!(message.sections[1].offset, 6);
    }
}
