use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// The three ICAP/1.0 request methods.
///
/// Method tokens are case-sensitive on the wire: `reqmod` is not a
/// recognised method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Options,
    ReqMod,
    RespMod,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::ReqMod => "REQMOD",
            Self::RespMod => "RESPMOD",
        }
    }

    /// Whether requests with this method carry an HTTP message to adapt.
    pub fn is_modification(self) -> bool {
        matches!(self, Self::ReqMod | Self::RespMod)
    }
}

impl FromStr for Method {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPTIONS" => Ok(Self::Options),
            "REQMOD" => Ok(Self::ReqMod),
            "RESPMOD" => Ok(Self::RespMod),
            other => Err(TypeError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods() {
        assert_eq!("OPTIONS".parse::<Method>().unwrap(), Method::Options);
        assert_eq!("REQMOD".parse::<Method>().unwrap(), Method::ReqMod);
        assert_eq!("RESPMOD".parse::<Method>().unwrap(), Method::RespMod);
    }

    #[test]
    fn rejects_other_tokens() {
        for token in ["GET", "reqmod", "", "REQMOD "] {
            let err = token.parse::<Method>().unwrap_err();
            assert!(matches!(err, TypeError::UnsupportedMethod { .. }), "{token:?}");
        }
    }

    #[test]
    fn display_matches_wire_token() {
        assert_eq!(Method::RespMod.to_string(), "RESPMOD");
        assert!(!Method::Options.is_modification());
    }
}
