use std::fmt;
use std::str::FromStr;

use crate::adapter::Adapter;
use crate::adapters::{DeclineAdapter, EchoAdapter, PreviewEchoAdapter};
use crate::error::DriverError;

/// Configuration for the adaptation engine.
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────────────┐
/// │ Field       │ Purpose                                              │
/// ├─────────────┼──────────────────────────────────────────────────────┤
/// │ adapter     │ Which adapter implementation handles exchanges       │
/// │ service     │ `Service` header text in OPTIONS responses           │
/// │ server      │ `Server` header on every final response              │
/// │ istag       │ Explicit service tag; derived from config when None  │
/// │ preview     │ Preview size advertised in OPTIONS, None to disable  │
/// │ options_ttl │ `Options-TTL` seconds                                │
/// │ allow_204   │ Advertise and honour `Allow: 204` outside previews   │
/// └─────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    pub adapter: AdapterKind,
    pub service: String,
    pub server: String,
    pub istag: Option<String>,
    pub preview: Option<usize>,
    pub options_ttl: u32,
    pub allow_204: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::default(),
            service: "ICAP adaptation service".to_string(),
            server: concat!("icap-driver/", env!("CARGO_PKG_VERSION")).to_string(),
            istag: None,
            preview: Some(1024),
            options_ttl: 3600,
            allow_204: true,
        }
    }
}

impl DriverConfig {
    pub const ISTAG_PREFIX: &'static str = "BITZ-";
    pub const MAX_ISTAG_LEN: usize = 32;

    /// The quoted `ISTag` header value.
    ///
    /// An explicit tag is used as given (surrounding quotes stripped,
    /// truncated to [`MAX_ISTAG_LEN`](Self::MAX_ISTAG_LEN) characters).
    /// Otherwise the tag is `BITZ-` followed by a BLAKE3 digest of every
    /// field that changes how the service answers, so clients invalidate
    /// cached responses exactly when the configuration changes.
    pub fn istag(&self) -> String {
        let tag: String = match &self.istag {
            Some(tag) => tag
                .trim_matches('"')
                .chars()
                .take(Self::MAX_ISTAG_LEN)
                .collect(),
            None => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(self.adapter.as_str().as_bytes());
                hasher.update(&[0]);
                hasher.update(self.service.as_bytes());
                hasher.update(&[0]);
                hasher.update(format!("{:?}", self.preview).as_bytes());
                hasher.update(&self.options_ttl.to_le_bytes());
                hasher.update(&[u8::from(self.allow_204)]);
                let digest = hasher.finalize().to_hex();
                let keep = Self::MAX_ISTAG_LEN - Self::ISTAG_PREFIX.len();
                format!("{}{}", Self::ISTAG_PREFIX, &digest.as_str()[..keep])
            }
        };
        format!("\"{tag}\"")
    }
}

/// Selects one of the interchangeable adapter implementations.
///
/// ```text
///   decline       every REQMOD/RESPMOD answered 501
///   echo          message returned unchanged as 200
///   preview-echo  204 early for bodiless previews, otherwise unchanged
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Decline,
    Echo,
    #[default]
    PreviewEcho,
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decline => "decline",
            Self::Echo => "echo",
            Self::PreviewEcho => "preview-echo",
        }
    }

    pub fn build(self) -> Box<dyn Adapter> {
        match self {
            Self::Decline => Box::new(DeclineAdapter),
            Self::Echo => Box::new(EchoAdapter),
            Self::PreviewEcho => Box::new(PreviewEchoAdapter),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decline" => Ok(Self::Decline),
            "echo" => Ok(Self::Echo),
            "preview-echo" => Ok(Self::PreviewEcho),
            _ => Err(DriverError::UnknownAdapter {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
