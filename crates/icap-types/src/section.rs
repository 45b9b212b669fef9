use icap_wire::{SectionKind, Terminator};

/// One entry of an ICAP message's encapsulated payload.
///
/// For header kinds, `payload` is the raw HTTP header block, copied
/// verbatim and never interpreted. For chunked body kinds it is the
/// de-chunked body and `ieof` records whether the stream's terminator
/// carried the `ieof` extension. A `null-body` section has no payload.
///
/// `offset` is the byte position of the section relative to the end of the
/// ICAP header block. It is filled in by the decoder and by
/// [`IcapMessage::push_section`](crate::IcapMessage::push_section); the
/// encoder recomputes it from serialized lengths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncapsulatedSection {
    pub kind: SectionKind,
    pub offset: usize,
    pub payload: Vec<u8>,
    pub ieof: bool,
}

impl EncapsulatedSection {
    pub fn new(kind: SectionKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            offset: 0,
            payload: payload.into(),
            ieof: false,
        }
    }

    pub fn request_header(header: impl Into<Vec<u8>>) -> Self {
        Self::new(SectionKind::RequestHeader, header)
    }

    pub fn response_header(header: impl Into<Vec<u8>>) -> Self {
        Self::new(SectionKind::ResponseHeader, header)
    }

    pub fn request_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(SectionKind::RequestBody, body)
    }

    pub fn response_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(SectionKind::ResponseBody, body)
    }

    pub fn options_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(SectionKind::OptionsBody, body)
    }

    pub fn null_body() -> Self {
        Self::new(SectionKind::NullBody, Vec::new())
    }

    /// Mark a body section as the complete body sent inside a preview.
    #[must_use]
    pub fn with_ieof(mut self) -> Self {
        self.ieof = true;
        self
    }

    /// The section's bytes, or `None` for `null-body`.
    pub fn payload(&self) -> Option<&[u8]> {
        match self.kind {
            SectionKind::NullBody => None,
            _ => Some(&self.payload),
        }
    }

    pub fn terminator(&self) -> Terminator {
        Terminator::from_ieof(self.ieof)
    }

    /// Bytes this section occupies in the encapsulated blob.
    pub fn encoded_len(&self) -> usize {
        match self.kind {
            SectionKind::NullBody => 0,
            SectionKind::RequestHeader | SectionKind::ResponseHeader => self.payload.len(),
            SectionKind::RequestBody | SectionKind::ResponseBody | SectionKind::OptionsBody => {
                icap_wire::chunked::encoded_len(self.payload.len(), self.terminator())
            }
        }
    }
}
