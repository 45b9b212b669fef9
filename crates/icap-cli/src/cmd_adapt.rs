/// Implementation of `icap adapt`.
///
/// Plays the host's part for one captured exchange: initialises the engine,
/// hands it the request bytes, writes the response bytes, and cleans up.
///
/// ```text
///   icap adapt req.icap                       → Host::preview(req)
///   icap adapt req.icap --continuation rest   → Host::resume(req, rest)
/// ```
///
/// Without `--continuation` a request carrying a `Preview` header is
/// negotiated as a preview, so the response may be `100 Continue`. Capture
/// the client's remainder and run again with `--continuation` to get the
/// final answer.
///
/// When the request is malformed, the `400` a server would send before
/// closing the connection is still written, and the command fails.
use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use icap_driver::{Engine, Host, HostError};

use crate::AdaptArgs;
use crate::config_file;

/// Run the `icap adapt` command.
///
/// # Errors
///
/// Returns an error if an input cannot be read, the configuration is
/// invalid, the adapter fails to initialise, or the request cannot be
/// answered.
pub fn run(args: &AdaptArgs) -> Result<()> {
    let config = config_file::load(args.config.as_deref(), args.adapter.as_deref())?;

    let request =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let continuation = match &args.continuation {
        Some(path) => {
            Some(fs::read(path).with_context(|| format!("cannot read {}", path.display()))?)
        }
        None => None,
    };

    let span = tracing::info_span!("icap-adapt", file = %args.file.display());
    let host = Host::from_engine(Engine::new(config).with_span(span));
    host.init().context("adapter failed to initialise")?;

    let outcome = match &continuation {
        Some(rest) => host.resume(&request, rest),
        None => host.preview(&request),
    };
    let cleanup = host.cleanup();

    let response = match outcome {
        Ok(bytes) => bytes,
        Err(err) => {
            if let Some(bytes) = err.response_bytes() {
                emit(args, &bytes)?;
            }
            return Err(describe(err));
        }
    };
    emit(args, &response)?;
    cleanup.context("adapter failed to clean up")?;
    Ok(())
}

fn emit(args: &AdaptArgs, bytes: &[u8]) -> Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn describe(err: HostError) -> anyhow::Error {
    match err {
        HostError::Malformed(inner) => {
            anyhow!(inner).context("malformed request; a server would close the connection")
        }
        other => anyhow!(other),
    }
}
