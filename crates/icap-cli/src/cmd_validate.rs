/// Implementation of `icap validate`.
///
/// Decodes a captured message, checks it against the per-method section
/// rules, and confirms that re-encoding reproduces the same bytes.
///
/// # Success output
///
/// ```text
/// ✓ Start line: REQMOD request
/// ✓ Encapsulated: req-hdr=0, req-body=147
/// ✓ Sections: allowed for REQMOD
/// ✓ Round trip: re-encoding reproduces 225 bytes
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: invalid Encapsulated header: req-hdr offset 0 is before previous offset 50
/// ```
///
/// A round-trip mismatch is reported with `!` rather than `✗`: the message
/// is valid, but some byte-level detail (folded headers, chunk extensions,
/// trailers, chunk boundaries) does not survive decoding.
use std::fs;

use anyhow::{Context, Result, anyhow};
use icap_decoder::{DecodeError, IcapDecoder};
use icap_encoder::IcapEncoder;
use icap_types::{IcapMessage, StartLine};

use crate::ValidateArgs;

/// Run the `icap validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not decode, or breaks
/// a section rule.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let message = match IcapDecoder::decode(&bytes) {
        Ok(message) => message,
        Err(e) => {
            println!("✗ Error: {}", decode_error_diagnostic(&e));
            return Err(anyhow!("validation failed"));
        }
    };

    println!("✓ Start line: {}", start_line_label(&message));
    println!("✓ Encapsulated: {}", encapsulated_label(&message));

    if let Err(e) = IcapEncoder::validate(&message) {
        println!("✗ Error: {e}");
        return Err(anyhow!("validation failed"));
    }
    println!("✓ Sections: allowed for {}", context_label(&message));

    let reencoded = IcapEncoder::encode(&message)?;
    if reencoded == bytes {
        println!("✓ Round trip: re-encoding reproduces {} bytes", bytes.len());
    } else {
        println!(
            "! Round trip: re-encoding gives {} bytes, input has {}",
            reencoded.len(),
            bytes.len()
        );
    }
    Ok(())
}

fn start_line_label(message: &IcapMessage) -> String {
    match &message.start {
        StartLine::Request { method, .. } => format!("{method} request"),
        StartLine::Response { status, .. } => format!("{status} response"),
    }
}

fn context_label(message: &IcapMessage) -> String {
    message
        .method()
        .map_or_else(|| "responses".to_string(), |m| m.to_string())
}

fn encapsulated_label(message: &IcapMessage) -> String {
    if message.sections.is_empty() {
        return "(none)".to_string();
    }
    message
        .sections
        .iter()
        .map(|s| format!("{}={}", s.kind, s.offset))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Converts a `DecodeError` into a one-line diagnostic.
///
/// ```text
/// ┌──────────────────────┬──────────────────────────────────────────────┐
/// │ DecodeError variant  │ Diagnostic                                   │
/// ├──────────────────────┼──────────────────────────────────────────────┤
/// │ UnsupportedMethod    │ "unsupported method X (server answers 501)"  │
/// │ TrailingData         │ "n bytes after the message (pipelined?)"     │
/// │ everything else      │ "<error Display>"                            │
/// └──────────────────────┴──────────────────────────────────────────────┘
/// ```
fn decode_error_diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::UnsupportedMethod { method } => {
            format!("unsupported method {method:?} (a server answers 501)")
        }
        DecodeError::TrailingData { extra_bytes } => {
            format!("{extra_bytes} bytes after the message (pipelined or concatenated capture?)")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_for_a_reqmod_request() {
        let message = IcapDecoder::decode(
            b"REQMOD icap://h/s ICAP/1.0\r\n\
Encapsulated: req-hdr=0, null-body=18\r\n\r\n\
GET / HTTP/1.1\r\n\r\n",
        )
        .expect("valid");
        assert_eq!(start_line_label(&message), "REQMOD request");
        assert_eq!(encapsulated_label(&message), "req-hdr=0, null-body=18");
        assert_eq!(context_label(&message), "REQMOD");
    }

    #[test]
    fn unsupported_method_mentions_501() {
        let err = IcapDecoder::decode(b"PURGE icap://h/s ICAP/1.0\r\n\r\n").expect_err("unknown");
        assert!(decode_error_diagnostic(&err).contains("501"));
    }
}
