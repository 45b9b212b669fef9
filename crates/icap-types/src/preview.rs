use crate::error::TypeError;
use crate::message::IcapMessage;

/// What a client announced and delivered during an ICAP preview.
///
/// A client that supports previews sends a `Preview: n` header and at most
/// `n` bytes of the encapsulated body. If those bytes are the whole body,
/// the chunked stream ends with `0; ieof` and `saw_ieof` is set. A message
/// without a chunked body (`null-body`, or no body section) has nothing
/// left to send, so it also counts as complete.
///
/// `announced_size` of `None` means the exchange is not a preview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub announced_size: Option<usize>,
    pub bytes_received: usize,
    pub saw_ieof: bool,
}

impl PreviewState {
    pub fn new(announced_size: usize, bytes_received: usize, saw_ieof: bool) -> Self {
        Self {
            announced_size: Some(announced_size),
            bytes_received,
            saw_ieof,
        }
    }

    /// Derive the preview state of a decoded request.
    ///
    /// Returns `Ok(None)` when the request has no `Preview` header. The
    /// received byte count is the size of the de-chunked body section, or
    /// zero for `null-body`. `saw_ieof` is set for an `ieof` body and for a
    /// message with no chunked body.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidPreview`] if the header is not a
    /// non-negative decimal integer.
    pub fn from_message(message: &IcapMessage) -> Result<Option<Self>, TypeError> {
        let Some(value) = message.headers.get("Preview") else {
            return Ok(None);
        };
        let value = value.trim();
        let invalid = || TypeError::InvalidPreview {
            value: value.to_string(),
        };
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let announced: usize = value.parse().map_err(|_| invalid())?;

        let body = message.body_section().filter(|s| s.kind.is_chunked());
        let bytes_received = body.map_or(0, |s| s.payload.len());
        let saw_ieof = body.is_none_or(|s| s.ieof);
        Ok(Some(Self::new(announced, bytes_received, saw_ieof)))
    }

    pub fn is_preview(&self) -> bool {
        self.announced_size.is_some()
    }

    /// Whether the client sent more than it announced.
    pub fn exceeds_announced(&self) -> bool {
        self.announced_size
            .is_some_and(|announced| self.bytes_received > announced)
    }
}
