/// Implementation of `icap encode`.
///
/// Builds one ICAP message from a JSON manifest using `MessageBuilder`.
/// Section offsets and the `Encapsulated` header are computed by the
/// encoder; the manifest only lists sections in wire order.
///
/// # Manifest format
///
/// ```json
/// {
///   "method": "REQMOD",
///   "uri": "icap://icap-server.net/server?arg=87",
///   "headers": [["Host", "icap-server.net"]],
///   "preview": 1024,
///   "allow_204": true,
///   "sections": [
///     { "kind": "req-hdr",  "content_file": "post-header.http" },
///     { "kind": "req-body", "content": "I am posting this information.",
///       "ieof": true }
///   ]
/// }
/// ```
///
/// A response replaces `method` and `uri` with `status` (and optionally
/// `reason`). Header section content is written verbatim, so it must end
/// with a blank line (`\r\n\r\n`). `content_file` paths are relative to the
/// manifest's directory.
///
/// ```text
/// ┌──────────────┬─────────────────────────────────────────────────────┐
/// │ Section kind │ Content                                             │
/// ├──────────────┼─────────────────────────────────────────────────────┤
/// │ req-hdr      │ raw HTTP request head                               │
/// │ res-hdr      │ raw HTTP response head                              │
/// │ req-body     │ decoded body, chunked by the encoder                │
/// │ res-body     │ decoded body, chunked by the encoder                │
/// │ opt-body     │ decoded body, chunked by the encoder                │
/// │ null-body    │ none                                                │
/// └──────────────┴─────────────────────────────────────────────────────┘
/// ```
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use icap_encoder::MessageBuilder;
use icap_types::{EncapsulatedSection, Method, SectionKind, StatusCode};

use crate::EncodeArgs;

// ── Manifest serde types ──────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    method: Option<String>,
    uri: Option<String>,
    status: Option<u16>,
    reason: Option<String>,
    #[serde(default)]
    headers: Vec<(String, String)>,
    preview: Option<usize>,
    #[serde(default)]
    allow_204: bool,
    #[serde(default)]
    sections: Vec<ManifestSection>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestSection {
    kind: String,
    /// Inline content. Mutually exclusive with `content_file`.
    content: Option<String>,
    /// Read content from this path (relative to the manifest directory).
    content_file: Option<String>,
    /// Terminate this body with `0; ieof`.
    #[serde(default)]
    ieof: bool,
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Run the `icap encode` command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed, if it names
/// neither a request nor a response, if a section is unknown or lacks
/// content, or if the resulting message fails encoder validation.
pub fn run(args: &EncodeArgs) -> Result<()> {
    let manifest_src = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;

    let manifest: Manifest = serde_json::from_str(&manifest_src)
        .with_context(|| format!("failed to parse manifest {}", args.input.display()))?;

    let manifest_dir = args.input.parent().unwrap_or_else(|| Path::new("."));
    let builder = build(&manifest, manifest_dir)?;

    let bytes = builder.encode().context("message failed validation")?;
    fs::write(&args.output, &bytes)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!("Wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

fn build(manifest: &Manifest, manifest_dir: &Path) -> Result<MessageBuilder> {
    let mut builder = match (&manifest.method, &manifest.uri, manifest.status) {
        (Some(method), Some(uri), None) => {
            let method: Method = method.parse()?;
            MessageBuilder::request(method, uri)
        }
        (None, None, Some(code)) => {
            let mut builder = MessageBuilder::response(StatusCode::from_u16(code)?);
            if let Some(reason) = &manifest.reason {
                builder.reason(reason);
            }
            builder
        }
        _ => bail!("manifest needs either `method` and `uri`, or `status`"),
    };

    for (name, value) in &manifest.headers {
        builder.header(name, value);
    }
    if let Some(size) = manifest.preview {
        builder.preview(size);
    }
    if manifest.allow_204 {
        builder.allow_204();
    }

    for (idx, section) in manifest.sections.iter().enumerate() {
        let section = resolve_section(section, manifest_dir)
            .with_context(|| format!("section {idx}: failed to apply"))?;
        builder.section(section);
    }
    Ok(builder)
}

fn resolve_section(section: &ManifestSection, manifest_dir: &Path) -> Result<EncapsulatedSection> {
    let kind = SectionKind::from_name(&section.kind)?;
    if kind == SectionKind::NullBody {
        if section.content.is_some() || section.content_file.is_some() {
            bail!("null-body takes no content");
        }
        return Ok(EncapsulatedSection::null_body());
    }

    let content = match (&section.content, &section.content_file) {
        (Some(text), None) => text.clone().into_bytes(),
        (None, Some(path)) => {
            let full = manifest_dir.join(path);
            fs::read(&full).with_context(|| format!("cannot read {}", full.display()))?
        }
        (Some(_), Some(_)) => bail!("{kind}: `content` and `content_file` are mutually exclusive"),
        (None, None) => return Err(anyhow!("{kind}: needs `content` or `content_file`")),
    };

    let built = EncapsulatedSection::new(kind, content);
    if section.ieof {
        if !kind.is_chunked() {
            bail!("{kind}: only body sections can end with ieof");
        }
        return Ok(built.with_ieof());
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str(json).expect("valid manifest")
    }

    #[test]
    fn request_manifest_encodes() {
        let m = manifest(
            r#"{
                "method": "REQMOD",
                "uri": "icap://h/s",
                "headers": [["Host", "h"]],
                "preview": 4,
                "sections": [
                    { "kind": "req-hdr", "content": "GET / HTTP/1.1\r\n\r\n" },
                    { "kind": "req-body", "content": "abcd", "ieof": true }
                ]
            }"#,
        );
        let bytes = build(&m, Path::new(".")).expect("builds").encode().expect("encodes");
        let text = String::from_utf8(bytes).expect("ascii");
        assert!(text.starts_with("REQMOD icap://h/s ICAP/1.0\r\nHost: h\r\nPreview: 4\r\n"));
        assert!(text.contains("Encapsulated: req-hdr=0, req-body=18\r\n\r\n"));
        assert!(text.ends_with("4\r\nabcd\r\n0; ieof\r\n\r\n"));
    }

    #[test]
    fn response_manifest_encodes() {
        let m = manifest(r#"{ "status": 204, "sections": [{ "kind": "null-body" }] }"#);
        let bytes = build(&m, Path::new(".")).expect("builds").encode().expect("encodes");
        assert_eq!(
            bytes,
            b"ICAP/1.0 204 No Content\r\nEncapsulated: null-body=0\r\n\r\n"
        );
    }

    #[test]
    fn ambiguous_start_line_is_rejected() {
        let m = manifest(r#"{ "method": "REQMOD", "uri": "icap://h/s", "status": 200 }"#);
        assert!(build(&m, Path::new(".")).is_err());
    }

    #[test]
    fn ieof_on_header_is_rejected() {
        let m = manifest(
            r#"{ "status": 200, "sections": [{ "kind": "res-hdr", "content": "x", "ieof": true }] }"#,
        );
        assert!(build(&m, Path::new(".")).is_err());
    }
}
