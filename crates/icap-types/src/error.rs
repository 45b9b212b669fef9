use icap_wire::WireError;

/// Errors from constructing or interpreting ICAP data-model values.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("unsupported ICAP method {method:?}")]
    UnsupportedMethod { method: String },

    #[error("invalid ICAP status code {value:?}")]
    InvalidStatus { value: String },

    #[error("invalid Preview header value {value:?}")]
    InvalidPreview { value: String },

    #[error(transparent)]
    Wire(#[from] WireError),
}
