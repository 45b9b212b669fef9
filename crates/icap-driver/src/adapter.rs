use icap_types::{IcapMessage, Method, PreviewState, SectionKind};

use crate::error::DriverError;
use crate::preview::PreviewDecision;

/// The HTTP message under adaptation, as opaque bytes.
///
/// For REQMOD this is the client's HTTP request; for RESPMOD it is the
/// origin server's HTTP response. `body` is `None` when the ICAP message
/// carried `null-body`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpMessage<'a> {
    pub header: Option<&'a [u8]>,
    pub body: Option<&'a [u8]>,
}

/// One ICAP exchange as seen by an adapter.
#[derive(Clone, Copy, Debug)]
pub struct Exchange<'a> {
    pub method: Method,
    pub request: &'a IcapMessage,
    pub subject: HttpMessage<'a>,
}

impl<'a> Exchange<'a> {
    /// Pick out the sections the method adapts. Sections that do not
    /// belong to the method (response sections in a REQMOD request) are
    /// not part of the subject.
    pub fn new(method: Method, request: &'a IcapMessage) -> Self {
        let (header, body) = match method {
            Method::ReqMod => (SectionKind::RequestHeader, SectionKind::RequestBody),
            Method::RespMod | Method::Options => {
                (SectionKind::ResponseHeader, SectionKind::ResponseBody)
            }
        };
        let payload = |kind| request.section(kind).map(|s| s.payload.as_slice());
        Self {
            method,
            request,
            subject: HttpMessage {
                header: payload(header),
                body: payload(body),
            },
        }
    }

    pub fn service(&self) -> &'a str {
        self.request.service_uri().unwrap_or_default()
    }
}

/// An adapter's replacement for the HTTP message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdaptedMessage {
    pub header: Vec<u8>,
    pub body: Option<Vec<u8>>,
}

impl AdaptedMessage {
    pub fn from_subject(subject: &HttpMessage<'_>) -> Self {
        Self {
            header: subject.header.map(<[u8]>::to_vec).unwrap_or_default(),
            body: subject.body.map(<[u8]>::to_vec),
        }
    }
}

/// What an adapter did to a complete HTTP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Adaptation {
    /// Nothing changed. The engine answers 204 when the client permits it
    /// and echoes the original otherwise.
    Unchanged,
    Replace(AdaptedMessage),
    /// The adapter does not implement this exchange; answered with 501.
    Decline,
}

/// Pluggable content adaptation.
///
/// Adapters see the HTTP message only as opaque header and body bytes. They
/// are shared across concurrent exchanges, so every method takes `&self`.
///
/// ```text
///   init ──► [ supports? ──► preview ──► modify ]* ──► cleanup
/// ```
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once before the first exchange.
    ///
    /// # Errors
    ///
    /// A failure leaves the engine uninitialised.
    fn init(&self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Called once after the last exchange.
    ///
    /// # Errors
    ///
    /// Reported to the host; the engine stays stopped.
    fn cleanup(&self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Whether this adapter handles `method` at all. Unsupported methods
    /// are answered with 501 before any preview.
    fn supports(&self, method: Method) -> bool {
        method.is_modification()
    }

    /// Inspect preview bytes. The engine calls this only while the body is
    /// incomplete; a preview ending in `ieof`, or one without a chunked
    /// body, goes straight to [`modify`](Self::modify). The default waits
    /// for the full body unless the preview already contains it.
    fn preview(&self, _exchange: &Exchange<'_>, state: &PreviewState) -> PreviewDecision {
        if state.saw_ieof {
            PreviewDecision::Ready
        } else {
            PreviewDecision::NeedRemainder
        }
    }

    fn modify(&self, exchange: &Exchange<'_>) -> Adaptation;
}

#[cfg(test)]
mod tests {
    use super::*;
    use icap_types::EncapsulatedSection;

    #[test]
    fn reqmod_subject_ignores_response_sections() {
        let request = IcapMessage::request(Method::ReqMod, "icap://h/s")
            .with_section(EncapsulatedSection::request_header("GET / HTTP/1.1\r\n\r\n"))
            .with_section(EncapsulatedSection::response_header("HTTP/1.1 200 OK\r\n\r\n"))
            .with_section(EncapsulatedSection::null_body());
        let exchange = Exchange::new(Method::ReqMod, &request);
        assert_eq!(exchange.subject.header, Some(&b"GET / HTTP/1.1\r\n\r\n"[..]));
        assert_eq!(exchange.subject.body, None);
        assert_eq!(exchange.service(), "icap://h/s");
    }

    #[test]
    fn respmod_subject_is_the_response() {
        let request = IcapMessage::request(Method::RespMod, "icap://h/s")
            .with_section(EncapsulatedSection::request_header("GET / HTTP/1.1\r\n\r\n"))
            .with_section(EncapsulatedSection::response_header("HTTP/1.1 200 OK\r\n\r\n"))
            .with_section(EncapsulatedSection::response_body("data"));
        let exchange = Exchange::new(Method::RespMod, &request);
        let adapted = AdaptedMessage::from_subject(&exchange.subject);
        assert_eq!(adapted.header, b"HTTP/1.1 200 OK\r\n\r\n");
        assert_eq!(adapted.body.as_deref(), Some(&b"data"[..]));
    }
}
