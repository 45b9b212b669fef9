use crate::message::IcapMessage;
use crate::status::StatusCode;

/// Outcome of running an adaptation over one ICAP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdaptationVerdict {
    /// Preview inspected; send `100 Continue` and wait for the remainder.
    Continue,
    /// Answer `204 No Content`; the client uses its original message.
    NoModificationNeeded,
    /// Answer with this `200 OK` response carrying the adapted sections.
    Modified(IcapMessage),
    /// Answer with an error status and no encapsulated body.
    Error(StatusCode),
}

impl AdaptationVerdict {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Continue => StatusCode::CONTINUE,
            Self::NoModificationNeeded => StatusCode::NO_CONTENT,
            Self::Modified(message) => message.status().unwrap_or(StatusCode::OK),
            Self::Error(status) => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_verdict() {
        assert_eq!(AdaptationVerdict::Continue.status(), StatusCode::CONTINUE);
        assert_eq!(AdaptationVerdict::NoModificationNeeded.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            AdaptationVerdict::Modified(IcapMessage::response(StatusCode::OK)).status(),
            StatusCode::OK
        );
        assert_eq!(
            AdaptationVerdict::Error(StatusCode::NOT_IMPLEMENTED).status().as_u16(),
            501
        );
    }
}
