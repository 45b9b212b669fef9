#![warn(clippy::pedantic)]

pub mod error;
pub mod headers;
pub mod message;
pub mod method;
pub mod preview;
pub mod section;
pub mod status;
pub mod verdict;

pub use error::TypeError;
pub use headers::HeaderMap;
pub use icap_wire::{SectionKind, Terminator};
pub use message::{IcapMessage, StartLine};
pub use method::Method;
pub use preview::PreviewState;
pub use section::EncapsulatedSection;
pub use status::StatusCode;
pub use verdict::AdaptationVerdict;

/// Protocol version token on every request and status line.
pub const ICAP_VERSION: &str = "ICAP/1.0";

/// IANA-registered ICAP port.
pub const DEFAULT_PORT: u16 = 1344;
