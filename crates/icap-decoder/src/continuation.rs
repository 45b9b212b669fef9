use icap_types::IcapMessage;
use icap_wire::ChunkedBody;

use crate::error::DecodeError;

/// Append the remainder of a previewed body to `message`.
///
/// After answering a preview with `100 Continue`, the client sends the rest
/// of the body as a fresh chunked stream. This decodes that stream from the
/// front of `continuation`, appends its payload to the message's body
/// section and drops the `Preview` header, so the merged message reads as a
/// complete, non-preview request.
///
/// Returns the number of continuation bytes consumed.
///
/// # Errors
///
/// - [`DecodeError::NoBodyToContinue`] if the message does not end with a
///   chunked body section.
/// - [`DecodeError::ContinuationAfterIeof`] if the preview already
///   delivered the whole body.
/// - [`DecodeError::Section`] if the continuation is not valid chunked data.
pub fn merge_continuation(
    message: &mut IcapMessage,
    continuation: &[u8],
) -> Result<usize, DecodeError> {
    let body = message
        .sections
        .last_mut()
        .filter(|s| s.kind.is_chunked())
        .ok_or(DecodeError::NoBodyToContinue)?;
    if body.ieof {
        return Err(DecodeError::ContinuationAfterIeof);
    }

    let (chunked, consumed) =
        ChunkedBody::read_from(continuation).map_err(|source| DecodeError::Section {
            section: body.kind.name(),
            offset: 0,
            source,
        })?;
    body.payload.extend_from_slice(&chunked.payload);
    let total = body.payload.len();

    message.headers.remove("Preview");
    tracing::trace!(
        appended = chunked.payload.len(),
        total,
        "merged preview continuation"
    );
    Ok(consumed)
}
