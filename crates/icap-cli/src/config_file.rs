/// JSON configuration file for `icap adapt` and `icap options`.
///
/// Every key is optional; missing keys keep the `DriverConfig` default.
///
/// ```json
/// {
///   "adapter": "preview-echo",
///   "service": "ICAP echo service",
///   "server": "icap/0.1",
///   "istag": "BITZ-1",
///   "preview": 1024,
///   "options_ttl": 3600,
///   "allow_204": true
/// }
/// ```
///
/// `"preview": null` disables the advertised preview. A `--adapter` flag on
/// the command line replaces the file's `adapter`.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use icap_driver::{AdapterKind, DriverConfig};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    adapter: Option<String>,
    service: Option<String>,
    server: Option<String>,
    istag: Option<String>,
    #[serde(default, deserialize_with = "explicit_option")]
    preview: Option<Option<usize>>,
    options_ttl: Option<u32>,
    allow_204: Option<bool>,
}

/// Distinguishes `"preview": null` from an absent key.
fn explicit_option<'de, D>(deserializer: D) -> Result<Option<Option<usize>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Build the engine configuration from an optional file and flag overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if an adapter
/// name is not recognised.
pub fn load(path: Option<&Path>, adapter: Option<&str>) -> Result<DriverConfig> {
    let file = match path {
        Some(path) => {
            let src = fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            serde_json::from_str(&src)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ConfigFile::default(),
    };

    let mut config = DriverConfig::default();
    if let Some(name) = adapter.or(file.adapter.as_deref()) {
        config.adapter = name
            .parse::<AdapterKind>()
            .with_context(|| format!("invalid adapter {name:?}"))?;
    }
    if let Some(service) = file.service {
        config.service = service;
    }
    if let Some(server) = file.server {
        config.server = server;
    }
    if file.istag.is_some() {
        config.istag = file.istag;
    }
    if let Some(preview) = file.preview {
        config.preview = preview;
    }
    if let Some(ttl) = file.options_ttl {
        config.options_ttl = ttl;
    }
    if let Some(allow) = file.allow_204 {
        config.allow_204 = allow;
    }

    tracing::debug!(adapter = %config.adapter, istag = %config.istag(), "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ConfigFile {
        serde_json::from_str(json).expect("valid config")
    }

    #[test]
    fn preview_null_differs_from_absent() {
        assert_eq!(parse("{}").preview, None);
        assert_eq!(parse(r#"{"preview": null}"#).preview, Some(None));
        assert_eq!(parse(r#"{"preview": 64}"#).preview, Some(Some(64)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<ConfigFile>(r#"{"previwe": 1}"#).is_err());
    }

    #[test]
    fn flag_overrides_default_adapter() {
        let config = load(None, Some("echo")).expect("valid");
        assert_eq!(config.adapter, AdapterKind::Echo);
        assert!(load(None, Some("gzip")).is_err());
    }
}
