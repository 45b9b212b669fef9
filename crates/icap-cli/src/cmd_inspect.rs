/// Implementation of `icap inspect`.
///
/// Decodes a captured request or response and prints its structure.
///
/// # Output format
///
/// ```text
/// Request: REQMOD icap://icap-server.net/server?arg=87 ICAP/1.0
/// Headers: 2
///   Host: icap-server.net
///   Preview: 1024
/// Sections: 2
///   req-hdr   offset=0     147 bytes
///   req-body  offset=147   30 bytes (ieof)
/// ---
/// 225 bytes total
/// ```
use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result};
use icap_decoder::IcapDecoder;
use icap_types::{IcapMessage, StartLine};

use crate::InspectArgs;

/// Run the `icap inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode as an
/// ICAP message.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let message = IcapDecoder::decode(&bytes)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    print!("{}", render(&message, args.show_body, args.show_hex));
    println!("---");
    println!("{} bytes total", bytes.len());
    Ok(())
}

fn render(message: &IcapMessage, show_body: bool, show_hex: bool) -> String {
    let mut out = String::new();
    match &message.start {
        StartLine::Request { method, uri } => {
            let _ = writeln!(out, "Request: {method} {uri} {}", icap_types::ICAP_VERSION);
        }
        StartLine::Response { status, reason } => {
            let _ = writeln!(
                out,
                "Response: {} {} {reason}",
                icap_types::ICAP_VERSION,
                status.as_u16()
            );
        }
    }

    let _ = writeln!(out, "Headers: {}", message.headers.len());
    for (name, value) in message.headers.iter() {
        let _ = writeln!(out, "  {name}: {value}");
    }

    let _ = writeln!(out, "Sections: {}", message.sections.len());
    for section in &message.sections {
        let Some(payload) = section.payload() else {
            let _ = writeln!(out, "  {:<9} offset={}", section.kind, section.offset);
            continue;
        };
        let ieof = if section.ieof { " (ieof)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<9} offset={:<5} {} bytes{ieof}",
            section.kind,
            section.offset,
            payload.len()
        );

        if show_body {
            let body = String::from_utf8_lossy(payload);
            let truncated: String = body.chars().take(80).collect();
            let ellipsis = if body.chars().count() > 80 { "…" } else { "" };
            let _ = writeln!(out, "            Body: {truncated:?}{ellipsis}");
        }

        if show_hex {
            let _ = writeln!(out, "            Hex dump:");
            out.push_str(&hex_dump(payload, "              "));
        }
    }
    out
}

/// 16 bytes per line: offset, hex, printable ASCII.
fn hex_dump(bytes: &[u8], indent: &str) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let hex = chunk
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{indent}{:04x}  {hex:<48}  {ascii}", i * 16);
    }
    out
}
