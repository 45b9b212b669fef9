use std::io::Write;

use crate::error::WireError;
use crate::line::{next_line, CRLF};

/// How a chunked body stream ends.
///
/// ICAP reuses HTTP/1.1 chunked transfer coding for every encapsulated
/// body, and adds a single chunk extension to the zero-size terminator:
///
/// ```text
///   Plain:  0\r\n\r\n
///   Ieof:   0; ieof\r\n\r\n     ← preview contained the entire body
/// ```
///
/// `ieof` is only meaningful on the terminator. Extensions on data chunks
/// are parsed and ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Terminator {
    #[default]
    Plain,
    Ieof,
}

impl Terminator {
    /// Wire bytes of the terminating zero-size chunk.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Plain => b"0\r\n\r\n",
            Self::Ieof => b"0; ieof\r\n\r\n",
        }
    }

    pub fn is_ieof(self) -> bool {
        self == Self::Ieof
    }

    pub fn from_ieof(ieof: bool) -> Self {
        if ieof { Self::Ieof } else { Self::Plain }
    }
}

/// A decoded chunked body: the concatenated chunk payloads plus the kind
/// of terminator that closed the stream.
///
/// The encoder always emits the payload as a single chunk (or no chunk at
/// all when the payload is empty). The decoder accepts any number of
/// chunks, uppercase or lowercase hex sizes, arbitrary chunk extensions
/// and trailer lines after the terminator.
///
/// ```text
///   ┌────────────┬──────┬──────────┬──────┬──────────────────┐
///   │ size (hex) │ CRLF │ payload  │ CRLF │ 0[; ieof] CRLF   │
///   │            │      │          │      │ [trailers] CRLF  │
///   └────────────┴──────┴──────────┴──────┴──────────────────┘
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkedBody {
    pub payload: Vec<u8>,
    pub terminator: Terminator,
}

impl ChunkedBody {
    pub fn new(payload: impl Into<Vec<u8>>, terminator: Terminator) -> Self {
        Self {
            payload: payload.into(),
            terminator,
        }
    }

    pub fn saw_ieof(&self) -> bool {
        self.terminator.is_ieof()
    }

    /// Number of bytes [`write_to`](Self::write_to) will produce.
    pub fn encoded_len(&self) -> usize {
        encoded_len(self.payload.len(), self.terminator)
    }

    /// Write the chunked encoding of this body to `w`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the writer fails.
    pub fn write_to(&self, w: &mut impl Write) -> Result<usize, WireError> {
        write_chunked(w, &self.payload, self.terminator)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.payload, self.terminator)
    }

    /// Parse a chunked stream from the front of `buf`.
    ///
    /// # Returns
    ///
    /// `(body, bytes_consumed)`. Bytes after the terminator (and any
    /// trailer lines) are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MalformedChunk`] when a size line is not
    /// hexadecimal, a chunk's data is not followed by CRLF where its
    /// declared size says it should be, or the buffer ends before the
    /// zero-size chunk. The reported offset is relative to `buf`.
    pub fn read_from(buf: &[u8]) -> Result<(Self, usize), WireError> {
        let mut cursor = 0;
        let mut payload = Vec::new();

        loop {
            let (line, next) = next_line(buf, cursor).ok_or(WireError::MalformedChunk {
                offset: cursor,
                reason: "stream ended before the terminating chunk",
            })?;
            let header = ChunkHeader::parse(line).map_err(|reason| WireError::MalformedChunk {
                offset: cursor,
                reason,
            })?;
            cursor = next;

            if header.size == 0 {
                let end = skip_trailers(buf, cursor)?;
                let body = Self {
                    payload,
                    terminator: Terminator::from_ieof(header.ieof),
                };
                return Ok((body, end));
            }

            let data_end = cursor
                .checked_add(header.size)
                .filter(|&end| end <= buf.len())
                .ok_or(WireError::MalformedChunk {
                    offset: cursor,
                    reason: "chunk data shorter than its declared size",
                })?;
            if buf.get(data_end..data_end + CRLF.len()) != Some(CRLF) {
                return Err(WireError::MalformedChunk {
                    offset: data_end,
                    reason: "chunk data not followed by CRLF",
                });
            }
            payload.extend_from_slice(&buf[cursor..data_end]);
            cursor = data_end + CRLF.len();
        }
    }
}

/// Write `payload` as a single chunk followed by `terminator`. An empty
/// payload produces only the terminator.
///
/// # Errors
///
/// Returns [`WireError::Io`] if the writer fails.
pub fn write_chunked(
    w: &mut impl Write,
    payload: &[u8],
    terminator: Terminator,
) -> Result<usize, WireError> {
    let mut written = 0;
    if !payload.is_empty() {
        let size_line = format!("{:x}\r\n", payload.len());
        w.write_all(size_line.as_bytes())?;
        w.write_all(payload)?;
        w.write_all(CRLF)?;
        written += size_line.len() + payload.len() + CRLF.len();
    }
    let terminator = terminator.as_bytes();
    w.write_all(terminator)?;
    Ok(written + terminator.len())
}

/// Encode `payload` as a chunked stream closed by `terminator`.
pub fn encode(payload: &[u8], terminator: Terminator) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(payload.len(), terminator));
    // Writing into a Vec cannot fail.
    let _ = write_chunked(&mut out, payload, terminator);
    out
}

/// Length of the chunked encoding of a `payload_len`-byte payload.
pub fn encoded_len(payload_len: usize, terminator: Terminator) -> usize {
    let data = if payload_len == 0 {
        0
    } else {
        hex_digits(payload_len) + CRLF.len() + payload_len + CRLF.len()
    };
    data + terminator.as_bytes().len()
}

/// Decode a complete chunked stream, returning the payload and whether the
/// terminator carried `ieof`.
///
/// # Errors
///
/// See [`ChunkedBody::read_from`].
pub fn decode(buf: &[u8]) -> Result<(Vec<u8>, bool), WireError> {
    let (body, _) = ChunkedBody::read_from(buf)?;
    let ieof = body.saw_ieof();
    Ok((body.payload, ieof))
}

struct ChunkHeader {
    size: usize,
    ieof: bool,
}

impl ChunkHeader {
    fn parse(line: &[u8]) -> Result<Self, &'static str> {
        let text = std::str::from_utf8(line).map_err(|_| "chunk size line is not ASCII")?;
        let mut parts = text.split(';');
        let size_text = parts.next().unwrap_or_default().trim();
        if size_text.is_empty() || !size_text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("chunk size is not hexadecimal");
        }
        let size = usize::from_str_radix(size_text, 16).map_err(|_| "chunk size overflows")?;
        let ieof = parts.any(|ext| {
            ext.split('=')
                .next()
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("ieof"))
        });
        Ok(Self { size, ieof })
    }
}

fn skip_trailers(buf: &[u8], mut cursor: usize) -> Result<usize, WireError> {
    loop {
        let (line, next) = next_line(buf, cursor).ok_or(WireError::MalformedChunk {
            offset: cursor,
            reason: "stream ended inside the chunk trailer",
        })?;
        if line.is_empty() {
            return Ok(next);
        }
        cursor = next;
    }
}

fn hex_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 16 {
        n /= 16;
        digits += 1;
    }
    digits
}
