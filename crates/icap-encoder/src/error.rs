use icap_wire::WireError;

/// Errors that can occur while serializing an ICAP message.
///
/// The encoder refuses to emit anything a conforming decoder would reject,
/// so every structural rule on sections and header fields is checked before
/// the first byte is written.
///
/// ```text
///   EncodeError
///   ├── InvalidHeader       ← empty/non-token name, CR or LF in a value
///   ├── InvalidStartLine    ← whitespace in the URI, CR/LF in the reason
///   ├── SectionOrder        ← repeated section or res-hdr before req-hdr
///   ├── MisplacedBody       ← a body section that is not the last one
///   ├── SectionNotAllowed   ← e.g. res-hdr in a REQMOD request
///   ├── MissingBody         ← sections present but no body kind ends them
///   ├── EmptyHeaderSection  ← zero-length req-hdr/res-hdr
///   ├── Wire(WireError)     ← from icap-wire serialization
///   └── Io(std::io::Error)  ← from underlying writes
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid header field {name:?}: {reason}")]
    InvalidHeader { name: String, reason: &'static str },

    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: &'static str },

    #[error("section {section} cannot follow {previous}")]
    SectionOrder {
        section: &'static str,
        previous: &'static str,
    },

    #[error("{section} must be the last encapsulated section")]
    MisplacedBody { section: &'static str },

    #[error("{section} is not allowed in a {context}")]
    SectionNotAllowed {
        section: &'static str,
        context: &'static str,
    },

    #[error("{context} must end with a body section")]
    MissingBody { context: &'static str },

    #[error("{section} section is empty")]
    EmptyHeaderSection { section: &'static str },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
