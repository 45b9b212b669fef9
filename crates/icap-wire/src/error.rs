/// Errors raised by the ICAP framing layer.
///
/// Every variant carries enough context to point an operator at the
/// offending bytes: chunk errors report the byte offset relative to the
/// start of the chunked stream they were parsing, and Encapsulated errors
/// report the section name and offsets involved.
///
/// ```text
///   WireError
///   ├── MalformedChunk         ← bad chunk size line, size/data mismatch, no terminator
///   ├── UnknownSectionKind     ← Encapsulated name outside req-hdr … opt-body
///   ├── InvalidOffsetOrdering  ← offset not greater than the previous entry
///   ├── InvalidSectionOrder    ← duplicate section, or res-hdr listed before req-hdr
///   ├── MalformedEntry         ← token without '=' or with a non-decimal offset
///   ├── MisplacedBody          ← a body section followed by another entry
///   ├── MissingBody            ← no body section terminates the list
///   └── Io(std::io::Error)     ← from writers passed to `write_to`
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A chunk did not match its declared framing, or the stream ended
    /// before the zero-size terminator chunk.
    #[error("malformed chunk at offset {offset}: {reason}")]
    MalformedChunk { offset: usize, reason: &'static str },

    /// An `Encapsulated` entry named a section this codec does not know.
    #[error("unknown encapsulated section kind {name:?}")]
    UnknownSectionKind { name: String },

    /// An `Encapsulated` offset did not increase past the previous entry.
    #[error("encapsulated offset {section}={offset} does not follow previous offset {previous}")]
    InvalidOffsetOrdering {
        section: &'static str,
        offset: usize,
        previous: usize,
    },

    /// Sections were listed twice or out of their canonical order.
    #[error("encapsulated section {section} cannot follow {previous}")]
    InvalidSectionOrder {
        section: &'static str,
        previous: &'static str,
    },

    #[error("malformed encapsulated entry {entry:?}")]
    MalformedEntry { entry: String },

    #[error("encapsulated body section {section} must be the last entry")]
    MisplacedBody { section: &'static str },

    #[error("encapsulated list does not end with a body section")]
    MissingBody,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
