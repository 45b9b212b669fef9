#![warn(clippy::pedantic)]

pub mod builder;
pub mod encoder;
pub mod error;

pub use builder::MessageBuilder;
pub use encoder::IcapEncoder;
pub use error::EncodeError;
