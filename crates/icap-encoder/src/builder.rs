use icap_types::{EncapsulatedSection, IcapMessage, Method, StatusCode, StartLine};

use crate::encoder::IcapEncoder;
use crate::error::EncodeError;

/// Chainable construction of ICAP messages.
///
/// Section methods append in call order and compute offsets as they go;
/// [`ieof`](Self::ieof) marks the most recently added body section. The
/// builder does not validate: [`encode`](Self::encode) runs the encoder's
/// checks, and [`build`](Self::build) hands back the raw message.
///
/// # Usage
///
/// ```rust
/// use icap_encoder::MessageBuilder;
/// use icap_types::Method;
///
/// let bytes = MessageBuilder::request(Method::ReqMod, "icap://icap.example/filter")
///     .header("Host", "icap.example")
///     .preview(1024)
///     .req_hdr(b"POST /form HTTP/1.1\r\nHost: origin\r\n\r\n")
///     .req_body(b"a=1")
///     .ieof()
///     .encode()
///     .unwrap();
/// assert!(bytes.ends_with(b"0; ieof\r\n\r\n"));
/// ```
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    message: IcapMessage,
}

impl MessageBuilder {
    #[must_use]
    pub fn request(method: Method, uri: &str) -> Self {
        Self {
            message: IcapMessage::request(method, uri),
        }
    }

    #[must_use]
    pub fn response(status: StatusCode) -> Self {
        Self {
            message: IcapMessage::response(status),
        }
    }

    /// Override the reason phrase of a response. No effect on requests.
    pub fn reason(&mut self, text: &str) -> &mut Self {
        if let StartLine::Response { reason, .. } = &mut self.message.start {
            *reason = text.to_string();
        }
        self
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.message.headers.append(name, value);
        self
    }

    /// Add a `Preview` header announcing `size` bytes.
    pub fn preview(&mut self, size: usize) -> &mut Self {
        self.message.headers.insert("Preview", size.to_string());
        self
    }

    /// Add `Allow: 204`, permitting a 204 answer outside a preview.
    pub fn allow_204(&mut self) -> &mut Self {
        self.message.headers.insert("Allow", "204");
        self
    }

    pub fn req_hdr(&mut self, header: &[u8]) -> &mut Self {
        self.section(EncapsulatedSection::request_header(header))
    }

    pub fn req_body(&mut self, body: &[u8]) -> &mut Self {
        self.section(EncapsulatedSection::request_body(body))
    }

    pub fn res_hdr(&mut self, header: &[u8]) -> &mut Self {
        self.section(EncapsulatedSection::response_header(header))
    }

    pub fn res_body(&mut self, body: &[u8]) -> &mut Self {
        self.section(EncapsulatedSection::response_body(body))
    }

    pub fn opt_body(&mut self, body: &[u8]) -> &mut Self {
        self.section(EncapsulatedSection::options_body(body))
    }

    pub fn null_body(&mut self) -> &mut Self {
        self.section(EncapsulatedSection::null_body())
    }

    pub fn section(&mut self, section: EncapsulatedSection) -> &mut Self {
        self.message.push_section(section);
        self
    }

    /// Terminate the last body section with `0; ieof`.
    pub fn ieof(&mut self) -> &mut Self {
        if let Some(section) = self
            .message
            .sections
            .last_mut()
            .filter(|s| s.kind.is_chunked())
        {
            section.ieof = true;
        }
        self
    }

    #[must_use]
    pub fn build(&self) -> IcapMessage {
        self.message.clone()
    }

    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the message fails validation.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        IcapEncoder::encode(&self.message)
    }
}
