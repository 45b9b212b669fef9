#![warn(clippy::pedantic)]

pub mod continuation;
pub mod decoder;
pub mod error;
pub mod head;

pub use continuation::merge_continuation;
pub use decoder::IcapDecoder;
pub use error::DecodeError;
