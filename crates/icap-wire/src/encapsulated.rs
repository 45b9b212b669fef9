use std::fmt;
use std::fmt::Write as _;

use crate::error::WireError;

/// Kinds of encapsulated section an ICAP message can carry.
///
/// Header kinds hold a raw HTTP header block copied verbatim. Body kinds
/// hold a chunked stream, except `NullBody`, which marks the absence of a
/// body and has no bytes of its own. A well-formed `Encapsulated` list
/// names header sections in canonical order and ends with exactly one
/// body kind:
///
/// ```text
///   req-hdr ─► req-body | null-body                      (REQMOD request)
///   req-hdr ─► res-hdr ─► res-body | null-body           (RESPMOD request)
///   opt-body | null-body                                  (OPTIONS)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    RequestHeader,
    RequestBody,
    ResponseHeader,
    ResponseBody,
    NullBody,
    OptionsBody,
}

impl SectionKind {
    pub const ALL: [Self; 6] = [
        Self::RequestHeader,
        Self::RequestBody,
        Self::ResponseHeader,
        Self::ResponseBody,
        Self::NullBody,
        Self::OptionsBody,
    ];

    /// Name used in the `Encapsulated` header.
    pub fn name(self) -> &'static str {
        match self {
            Self::RequestHeader => "req-hdr",
            Self::RequestBody => "req-body",
            Self::ResponseHeader => "res-hdr",
            Self::ResponseBody => "res-body",
            Self::NullBody => "null-body",
            Self::OptionsBody => "opt-body",
        }
    }

    /// Resolve an `Encapsulated` entry name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnknownSectionKind`] for any other name.
    pub fn from_name(name: &str) -> Result<Self, WireError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| WireError::UnknownSectionKind {
                name: name.to_string(),
            })
    }

    pub fn is_header(self) -> bool {
        matches!(self, Self::RequestHeader | Self::ResponseHeader)
    }

    pub fn is_body(self) -> bool {
        !self.is_header()
    }

    /// Body kinds whose bytes are a chunked stream.
    pub fn is_chunked(self) -> bool {
        matches!(
            self,
            Self::RequestBody | Self::ResponseBody | Self::OptionsBody
        )
    }

    /// Position in the canonical section order. Every body kind shares the
    /// last rank since only one of them may appear.
    pub fn rank(self) -> u8 {
        match self {
            Self::RequestHeader => 0,
            Self::ResponseHeader => 1,
            Self::RequestBody | Self::ResponseBody | Self::NullBody | Self::OptionsBody => 2,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One `name=offset` token of an `Encapsulated` header. The offset counts
/// bytes from the first byte after the ICAP header block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EncapsulatedEntry {
    pub kind: SectionKind,
    pub offset: usize,
}

impl fmt::Display for EncapsulatedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.offset)
    }
}

/// Parse an `Encapsulated` header value into ordered entries.
///
/// Tokens are separated by commas; whitespace around names, offsets and
/// separators is ignored.
///
/// # Errors
///
/// - [`WireError::MalformedEntry`] if a token lacks `=` or its offset is
///   not a decimal integer.
/// - [`WireError::UnknownSectionKind`] for an unrecognised section name.
/// - [`WireError::InvalidOffsetOrdering`] if an offset does not exceed the
///   previous one. Checked before any structural rule.
/// - [`WireError::MisplacedBody`] if a body kind is not the last entry.
/// - [`WireError::InvalidSectionOrder`] for a repeated header kind or
///   `res-hdr` listed before `req-hdr`.
/// - [`WireError::MissingBody`] if the list does not end with a body kind.
pub fn parse(value: &str) -> Result<Vec<EncapsulatedEntry>, WireError> {
    let mut entries: Vec<EncapsulatedEntry> = Vec::new();

    for token in value.split(',') {
        let token = token.trim();
        let malformed = || WireError::MalformedEntry {
            entry: token.to_string(),
        };
        let (name, offset) = token.split_once('=').ok_or_else(malformed)?;
        let kind = SectionKind::from_name(name.trim())?;
        let offset = offset.trim();
        if offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let offset: usize = offset.parse().map_err(|_| malformed())?;

        if let Some(previous) = entries.last() {
            if offset <= previous.offset {
                return Err(WireError::InvalidOffsetOrdering {
                    section: kind.name(),
                    offset,
                    previous: previous.offset,
                });
            }
            if previous.kind.is_body() {
                return Err(WireError::MisplacedBody {
                    section: previous.kind.name(),
                });
            }
            if kind.rank() <= previous.kind.rank() {
                return Err(WireError::InvalidSectionOrder {
                    section: kind.name(),
                    previous: previous.kind.name(),
                });
            }
        }
        entries.push(EncapsulatedEntry { kind, offset });
    }

    match entries.last() {
        Some(last) if last.kind.is_body() => Ok(entries),
        _ => Err(WireError::MissingBody),
    }
}

/// Lay out sections back to back, given each one's serialized length.
///
/// The first section starts at offset 0 and each following section starts
/// where the previous one ended. A `null-body` section has length zero.
pub fn layout<I>(sections: I) -> Vec<EncapsulatedEntry>
where
    I: IntoIterator<Item = (SectionKind, usize)>,
{
    let mut offset = 0;
    sections
        .into_iter()
        .map(|(kind, len)| {
            let entry = EncapsulatedEntry { kind, offset };
            offset += len;
            entry
        })
        .collect()
}

/// Render entries as an `Encapsulated` header value, e.g.
/// `req-hdr=0, null-body=170`.
pub fn format(entries: &[EncapsulatedEntry]) -> String {
    let mut value = String::new();
    for entry in entries {
        if !value.is_empty() {
            value.push_str(", ");
        }
        // fmt::Write for String is infallible.
        let _ = write!(value, "{entry}");
    }
    value
}

/// Build an `Encapsulated` header value from `(kind, serialized_len)`
/// pairs in emission order.
pub fn build<I>(sections: I) -> String
where
    I: IntoIterator<Item = (SectionKind, usize)>,
{
    format(&layout(sections))
}
