use icap_types::TypeError;
use icap_wire::WireError;

/// Errors that can occur while decoding ICAP wire bytes.
///
/// Positions are absolute byte offsets into the buffer handed to the
/// decoder, so a failure can be located in a captured exchange directly.
///
/// ```text
///   DecodeError
///   ├── MalformedStartLine     ← not "<METHOD> <uri> ICAP/1.0" nor "ICAP/1.0 <code> <reason>"
///   ├── MalformedHeaderBlock   ← bad field line, unterminated head, missing Encapsulated
///   ├── UnsupportedMethod      ← well-formed request line, unknown method token
///   ├── UnexpectedMessageKind  ← response where a request was expected, or vice versa
///   ├── Encapsulated(WireError)← the Encapsulated value itself is invalid
///   ├── Section                ← a chunked body section failed to decode
///   ├── TruncatedSection       ← the buffer ends inside a section
///   ├── TrailingData           ← bytes left after the message
///   ├── NoBodyToContinue       ← continuation for a message without a chunked body
///   ├── ContinuationAfterIeof  ← continuation for a preview that already ended with ieof
///   └── Type(TypeError)        ← from icap-types value parsing
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed start line {line:?}")]
    MalformedStartLine { line: String },

    #[error("malformed header block at offset {offset}: {reason}")]
    MalformedHeaderBlock { offset: usize, reason: &'static str },

    #[error("unsupported ICAP method {method:?}")]
    UnsupportedMethod { method: String },

    #[error("expected an ICAP {expected}, found a {found}")]
    UnexpectedMessageKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid Encapsulated header: {0}")]
    Encapsulated(WireError),

    /// A body section's chunked stream was malformed. `offset` is where the
    /// section starts; the inner error's offset is relative to it.
    #[error("{section} section at offset {offset}: {source}")]
    Section {
        section: &'static str,
        offset: usize,
        source: WireError,
    },

    #[error("{section} section at offset {offset} is truncated: needs {needed} bytes, {available} available")]
    TruncatedSection {
        section: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{extra_bytes} unexpected bytes after the message")]
    TrailingData { extra_bytes: usize },

    #[error("continuation requires a message ending in a chunked body section")]
    NoBodyToContinue,

    #[error("continuation received for a preview that ended with ieof")]
    ContinuationAfterIeof,

    #[error(transparent)]
    Type(#[from] TypeError),
}
