#![warn(clippy::pedantic)]

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod preview;
pub mod respond;

pub use adapter::{Adaptation, AdaptedMessage, Adapter, Exchange, HttpMessage};
pub use adapters::{DeclineAdapter, EchoAdapter, PreviewEchoAdapter};
pub use config::{AdapterKind, DriverConfig};
pub use engine::Engine;
pub use error::{DriverError, HostError};
pub use host::Host;
pub use preview::{PreviewDecision, PreviewNegotiation, PreviewPhase};
pub use respond::ResponseFactory;
