use icap_decoder::DecodeError;
use icap_encoder::{EncodeError, IcapEncoder};
use icap_types::{EncapsulatedSection, IcapMessage, StatusCode};

use crate::preview::PreviewPhase;

/// Errors raised by the adaptation engine.
///
/// ```text
/// ┌────────────────────────┬───────────────────────────────────────────────┐
/// │ Variant                │ Cause                                         │
/// ├────────────────────────┼───────────────────────────────────────────────┤
/// │ ContinueAfterIeof      │ NeedRemainder decided for an ieof preview     │
/// │ PreviewAlreadyDecided  │ A second decision on one preview exchange     │
/// │ Lifecycle              │ Exchange before init / after cleanup, or a    │
/// │                        │ repeated init or cleanup                      │
/// │ NotARequest            │ A response was handed to the engine           │
/// │ UnknownAdapter         │ Adapter name not recognised                   │
/// │ Adapter                │ Adapter init or cleanup failed                │
/// └────────────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// Answering `100 Continue` after `ieof` would leave the client
    /// waiting for a request for data it has already said does not exist.
    #[error("remainder requested for a preview that ended with ieof")]
    ContinueAfterIeof,

    #[error("preview already decided (phase {phase:?})")]
    PreviewAlreadyDecided { phase: PreviewPhase },

    #[error("cannot {operation}: engine is {state}")]
    Lifecycle {
        state: &'static str,
        operation: &'static str,
    },

    #[error("the engine handles ICAP requests, not responses")]
    NotARequest,

    #[error("unknown adapter {name:?} (expected decline, echo or preview-echo)")]
    UnknownAdapter { name: String },

    #[error("adapter {adapter} failed: {reason}")]
    Adapter {
        adapter: &'static str,
        reason: String,
    },
}

/// Errors surfaced by [`Host`](crate::Host) entry points.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The request bytes could not be decoded. The host should close the
    /// connection, optionally after sending [`HostError::response_bytes`].
    #[error("malformed ICAP request: {0}")]
    Malformed(DecodeError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl HostError {
    /// Bytes the host may send before closing the connection, or `None`
    /// when nothing should be written.
    ///
    /// A malformed request earns a `400`; internal failures a `500`. A
    /// preview contract violation writes nothing.
    pub fn response_bytes(&self) -> Option<Vec<u8>> {
        let status = match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Driver(DriverError::ContinueAfterIeof) => return None,
            Self::Driver(_) | Self::Encode(_) => StatusCode::SERVER_ERROR,
        };
        let message = IcapMessage::response(status).with_section(EncapsulatedSection::null_body());
        IcapEncoder::encode(&message).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_maps_to_400() {
        let err = HostError::Malformed(DecodeError::NoBodyToContinue);
        assert_eq!(
            err.response_bytes().unwrap(),
            b"ICAP/1.0 400 Bad Request\r\nEncapsulated: null-body=0\r\n\r\n"
        );
    }

    #[test]
    fn contract_violation_writes_nothing() {
        assert!(HostError::Driver(DriverError::ContinueAfterIeof).response_bytes().is_none());
    }

    #[test]
    fn lifecycle_maps_to_500() {
        let err = HostError::from(DriverError::Lifecycle {
            state: "stopped",
            operation: "handle an exchange",
        });
        let bytes = err.response_bytes().unwrap();
        assert!(bytes.starts_with(b"ICAP/1.0 500 Server Error\r\n"));
    }
}
