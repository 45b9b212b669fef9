use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// An ICAP status code.
///
/// ICAP reuses the HTTP status code space. Well-known codes are exposed as
/// associated constants; any three-digit code from 100 to 999 is
/// representable so that responses from other servers round-trip.
///
/// ```text
///   1xx  informational   100 Continue (preview)
///   2xx  success         200 OK, 204 No Content (no modification)
///   4xx  client error    400, 404, 405, 408
///   5xx  server error    500, 501, 502, 503, 505
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const CONTINUE: Self = Self(100);
    pub const OK: Self = Self(200);
    pub const NO_CONTENT: Self = Self(204);
    pub const BAD_REQUEST: Self = Self(400);
    pub const SERVICE_NOT_FOUND: Self = Self(404);
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    pub const REQUEST_TIMEOUT: Self = Self(408);
    pub const SERVER_ERROR: Self = Self(500);
    pub const NOT_IMPLEMENTED: Self = Self(501);
    pub const BAD_GATEWAY: Self = Self(502);
    pub const SERVICE_OVERLOADED: Self = Self(503);
    pub const VERSION_NOT_SUPPORTED: Self = Self(505);

    /// # Errors
    ///
    /// Returns [`TypeError::InvalidStatus`] outside `100..=999`.
    pub fn from_u16(code: u16) -> Result<Self, TypeError> {
        if (100..=999).contains(&code) {
            Ok(Self(code))
        } else {
            Err(TypeError::InvalidStatus {
                value: code.to_string(),
            })
        }
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Standard reason phrase, if this is a code ICAP defines.
    pub fn canonical_reason(self) -> Option<&'static str> {
        let reason = match self.0 {
            100 => "Continue",
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            404 => "ICAP Service Not Found",
            405 => "Method Not Allowed For Service",
            408 => "Request Timeout",
            500 => "Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Overloaded",
            505 => "ICAP Version Not Supported By Server",
            _ => return None,
        };
        Some(reason)
    }

    pub fn is_informational(self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_error(self) -> bool {
        self.0 >= 400
    }
}

impl FromStr for StatusCode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidStatus {
            value: s.to_string(),
        };
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let code: u16 = s.parse().map_err(|_| invalid())?;
        Self::from_u16(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_reason() {
            Some(reason) => write!(f, "{} {reason}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_digit_codes() {
        assert_eq!("204".parse::<StatusCode>().unwrap(), StatusCode::NO_CONTENT);
        assert_eq!("599".parse::<StatusCode>().unwrap().as_u16(), 599);
    }

    #[test]
    fn rejects_bad_codes() {
        for text in ["20", "2000", "abc", "099", ""] {
            assert!(text.parse::<StatusCode>().is_err(), "{text:?}");
        }
        assert!(StatusCode::from_u16(42).is_err());
    }

    #[test]
    fn reasons_and_classes() {
        assert_eq!(StatusCode::NOT_IMPLEMENTED.canonical_reason(), Some("Not Implemented"));
        assert_eq!(StatusCode::from_u16(299).unwrap().canonical_reason(), None);
        assert!(StatusCode::CONTINUE.is_informational());
        assert!(StatusCode::NO_CONTENT.is_success());
        assert!(StatusCode::BAD_REQUEST.is_error());
        assert_eq!(StatusCode::OK.to_string(), "200 OK");
    }
}
