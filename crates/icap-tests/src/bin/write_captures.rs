//! Writes the captured exchanges to disk for use with the `icap` CLI.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_captures -p icap-tests [-- <dir>]
//! icap adapt <dir>/reqmod-preview-partial.icap
//! icap adapt <dir>/reqmod-preview-partial.icap --continuation <dir>/reqmod-preview-partial.rest
//! icap encode <dir>/reqmod-post.json -o post.icap
//! ```
//!
//! # Written files
//!
//! | File                           | Contents                                  |
//! |--------------------------------|-------------------------------------------|
//! | options.icap                   | OPTIONS request                           |
//! | reqmod-get.icap                | REQMOD, req-hdr + null-body               |
//! | reqmod-post.icap               | REQMOD, req-hdr + 30-byte req-body        |
//! | reqmod-preview-ieof.icap       | REQMOD preview, whole body, `0; ieof`     |
//! | reqmod-preview-partial.icap    | REQMOD preview of the first 10 bytes      |
//! | reqmod-preview-partial.rest    | continuation sent after `100 Continue`    |
//! | respmod.icap                   | RESPMOD, req-hdr + res-hdr + res-body     |
//! | reqmod-post.json               | `icap encode` manifest for reqmod-post    |
//! | config.json                    | `--config` file using the echo adapter    |

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icap_tests::{
    options_request, reqmod_get, reqmod_post, reqmod_preview_ieof, reqmod_preview_partial, respmod,
};

const POST_MANIFEST: &str = r#"{
  "method": "REQMOD",
  "uri": "icap://icap.server.net/sample-service",
  "headers": [["Host", "localhost"]],
  "sections": [
    { "kind": "req-hdr", "content": "POST /origin-resource/form.pl HTTP/1.1\r\nHost: www.origin-server.com\r\nAccept: text/html, text/plain\r\nAccept-Encoding: compress\r\nPragma: no-cache\r\n\r\n" },
    { "kind": "req-body", "content": "I am posting this information." }
  ]
}
"#;

const CONFIG: &str = r#"{
  "adapter": "echo",
  "service": "ICAP echo service",
  "istag": "BITZ-captures",
  "preview": 1024,
  "options_ttl": 600
}
"#;

fn main() -> Result<()> {
    let dir = std::env::args_os().nth(1).map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("captures"),
        PathBuf::from,
    );
    fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let (partial, rest) = reqmod_preview_partial();
    let files: [(&str, Vec<u8>); 9] = [
        ("options.icap", options_request()),
        ("reqmod-get.icap", reqmod_get()),
        ("reqmod-post.icap", reqmod_post()),
        ("reqmod-preview-ieof.icap", reqmod_preview_ieof()),
        ("reqmod-preview-partial.icap", partial),
        ("reqmod-preview-partial.rest", rest),
        ("respmod.icap", respmod()),
        ("reqmod-post.json", POST_MANIFEST.as_bytes().to_vec()),
        ("config.json", CONFIG.as_bytes().to_vec()),
    ];
    for (name, data) in &files {
        write_file(&dir.join(name), data)?;
    }

    println!("All captures written to {}", dir.display());
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("cannot write {}", path.display()))?;
    println!("  wrote {}", path.display());
    Ok(())
}
