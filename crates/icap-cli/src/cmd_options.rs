/// Implementation of `icap options`.
///
/// Prints the OPTIONS response the engine would send for a configuration,
/// which is the quickest way to see the derived `ISTag`.
///
/// ```text
/// ICAP/1.0 200 OK
/// ISTag: "BITZ-3f1a…"
/// Server: icap-driver/0.1.0
/// Methods: REQMOD, RESPMOD
/// Service: ICAP adaptation service
/// Options-TTL: 3600
/// Allow: 204
/// Preview: 1024
/// Encapsulated: null-body=0
/// ```
use std::io::{self, Write};

use anyhow::{Context, Result};
use icap_driver::Engine;
use icap_encoder::IcapEncoder;

use crate::OptionsArgs;
use crate::config_file;

/// Run the `icap options` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the response
/// fails to encode.
pub fn run(args: &OptionsArgs) -> Result<()> {
    let config = config_file::load(args.config.as_deref(), args.adapter.as_deref())?;
    let engine = Engine::new(config);
    let bytes = IcapEncoder::encode(&engine.options()).context("cannot encode OPTIONS response")?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}
