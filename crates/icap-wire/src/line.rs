use memchr::memmem;

/// Line terminator used by every ICAP and HTTP header line.
pub const CRLF: &[u8] = b"\r\n";

/// Marker that ends a header block: the last line's CRLF plus the blank line.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Return the CRLF-terminated line starting at `start`.
///
/// # Returns
///
/// `Some((line, next))` where `line` excludes the CRLF and `next` is the
/// offset of the first byte after it, or `None` when no CRLF follows
/// `start`.
pub fn next_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let pos = memmem::find(rest, CRLF)?;
    Some((&rest[..pos], start + pos + CRLF.len()))
}

/// Length of the header block at the front of `buf`, including the
/// terminating blank line, or `None` if the block is not complete.
pub fn head_len(buf: &[u8]) -> Option<usize> {
    memmem::find(buf, HEAD_TERMINATOR).map(|pos| pos + HEAD_TERMINATOR.len())
}
