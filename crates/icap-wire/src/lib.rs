#![warn(clippy::pedantic)]

pub mod chunked;
pub mod encapsulated;
pub mod error;
pub mod line;

pub use chunked::{ChunkedBody, Terminator};
pub use encapsulated::{EncapsulatedEntry, SectionKind};
pub use error::WireError;
