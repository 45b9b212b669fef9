use icap_types::{HeaderMap, Method, StartLine, StatusCode, ICAP_VERSION};
use icap_wire::encapsulated::{self, EncapsulatedEntry};
use icap_wire::line::next_line;

use crate::error::DecodeError;

/// Optional whitespace around a field value: SP and HTAB only.
const OWS: [char; 2] = [' ', '\t'];

/// The parsed ICAP header block of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head {
    pub start: StartLine,
    /// ICAP fields with `Encapsulated` removed.
    pub headers: HeaderMap,
    /// Parsed `Encapsulated` entries, `None` when the field was absent.
    pub encapsulated: Option<Vec<EncapsulatedEntry>>,
    /// Bytes up to and including the blank line. Encapsulated offsets
    /// count from here.
    pub len: usize,
}

/// Parse the start line and header fields at the front of `buf`.
///
/// Header lines beginning with a space or tab continue the previous
/// field's value (obsolete line folding) and are joined with one space.
///
/// # Errors
///
/// - [`DecodeError::MalformedStartLine`] for an unparseable first line.
/// - [`DecodeError::UnsupportedMethod`] for a well-formed request line
///   whose method is not OPTIONS, REQMOD or RESPMOD.
/// - [`DecodeError::MalformedHeaderBlock`] for an invalid field line, a
///   repeated `Encapsulated` field, or a block with no terminating blank
///   line.
/// - [`DecodeError::Encapsulated`] if the `Encapsulated` value is invalid.
pub fn parse_head(buf: &[u8]) -> Result<Head, DecodeError> {
    let (line, mut cursor) = next_line(buf, 0).ok_or_else(|| DecodeError::MalformedStartLine {
        line: lossy_prefix(buf),
    })?;
    let start = parse_start_line(line)?;
    let fields_start = cursor;

    let mut fields: Vec<(String, String)> = Vec::new();
    loop {
        let (line, next) = next_line(buf, cursor).ok_or(DecodeError::MalformedHeaderBlock {
            offset: cursor,
            reason: "header block not terminated by an empty line",
        })?;
        if line.is_empty() {
            cursor = next;
            break;
        }
        let malformed = |reason| DecodeError::MalformedHeaderBlock {
            offset: cursor,
            reason,
        };
        let text = std::str::from_utf8(line).map_err(|_| malformed("header line is not valid UTF-8"))?;

        if text.starts_with([' ', '\t']) {
            let (_, value) = fields
                .last_mut()
                .ok_or_else(|| malformed("continuation line before the first header"))?;
            let folded = text.trim_matches(OWS);
            if !folded.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(folded);
            }
        } else {
            let (name, value) = text
                .split_once(':')
                .ok_or_else(|| malformed("header line has no ':'"))?;
            if name.is_empty()
                || name
                    .bytes()
                    .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
            {
                return Err(malformed("header name is empty or contains whitespace"));
            }
            fields.push((name.to_string(), value.trim_matches(OWS).to_string()));
        }
        cursor = next;
    }

    let mut headers: HeaderMap = fields.into_iter().collect();
    let encapsulated = match headers.get_all("Encapsulated").count() {
        0 => None,
        1 => {
            let value = headers.remove("Encapsulated").unwrap_or_default();
            Some(encapsulated::parse(&value).map_err(DecodeError::Encapsulated)?)
        }
        _ => {
            return Err(DecodeError::MalformedHeaderBlock {
                offset: fields_start,
                reason: "Encapsulated header appears more than once",
            });
        }
    };

    Ok(Head {
        start,
        headers,
        encapsulated,
        len: cursor,
    })
}

/// Parse `<METHOD> <uri> ICAP/1.0` or `ICAP/1.0 <code> <reason>`.
///
/// # Errors
///
/// See [`parse_head`].
pub fn parse_start_line(line: &[u8]) -> Result<StartLine, DecodeError> {
    let malformed = || DecodeError::MalformedStartLine {
        line: String::from_utf8_lossy(line).into_owned(),
    };
    let text = std::str::from_utf8(line).map_err(|_| malformed())?;

    if text.starts_with("ICAP/") {
        let mut parts = text.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        let code = parts.next().ok_or_else(malformed)?;
        let reason = parts.next().unwrap_or_default();
        if version != ICAP_VERSION {
            return Err(malformed());
        }
        let status: StatusCode = code.parse().map_err(|_| malformed())?;
        return Ok(StartLine::Response {
            status,
            reason: reason.to_string(),
        });
    }

    let mut parts = text.split(' ');
    let (Some(method), Some(uri), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    if method.is_empty() || uri.is_empty() || version != ICAP_VERSION {
        return Err(malformed());
    }
    match method.parse::<Method>() {
        Ok(method) => Ok(StartLine::Request {
            method,
            uri: uri.to_string(),
        }),
        Err(_) if method.bytes().all(|b| b.is_ascii_alphabetic()) => {
            Err(DecodeError::UnsupportedMethod {
                method: method.to_string(),
            })
        }
        Err(_) => Err(malformed()),
    }
}

fn lossy_prefix(buf: &[u8]) -> String {
    let end = buf.len().min(64);
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
