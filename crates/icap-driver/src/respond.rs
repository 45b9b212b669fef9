use icap_types::{
    AdaptationVerdict, EncapsulatedSection, IcapMessage, Method, SectionKind, StatusCode,
};

use crate::adapter::AdaptedMessage;
use crate::config::DriverConfig;

/// Builds the ICAP responses the engine sends.
///
/// Every final response carries `ISTag` and `Server`. Responses without an
/// adapted message end with `Encapsulated: null-body=0`.
///
/// ```text
///   Continue              ICAP/1.0 100 Continue
///   NoModificationNeeded  ICAP/1.0 204 No Content      ISTag, Server, null-body=0
///   Error(code)           ICAP/1.0 <code> <reason>     ISTag, Server, null-body=0
///   Modified(message)     the message as built by `modified` or `options`
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseFactory {
    istag: String,
    server: String,
}

impl ResponseFactory {
    pub fn new(istag: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            istag: istag.into(),
            server: server.into(),
        }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.istag(), config.server.clone())
    }

    pub fn istag(&self) -> &str {
        &self.istag
    }

    pub fn continue_response(&self) -> IcapMessage {
        IcapMessage::response(StatusCode::CONTINUE)
    }

    pub fn no_content(&self) -> IcapMessage {
        self.stamped(StatusCode::NO_CONTENT)
            .with_section(EncapsulatedSection::null_body())
    }

    pub fn error(&self, status: StatusCode) -> IcapMessage {
        self.stamped(status)
            .with_section(EncapsulatedSection::null_body())
    }

    /// `200 OK` carrying an adapted HTTP message.
    ///
    /// REQMOD answers hold `req-hdr` and `req-body`; RESPMOD answers hold
    /// `res-hdr` and `res-body`, preceded by the request's original
    /// `req-hdr` when it had one. A missing body becomes `null-body` and an
    /// empty header section is left out.
    pub fn modified(
        &self,
        method: Method,
        request: &IcapMessage,
        adapted: AdaptedMessage,
    ) -> IcapMessage {
        let mut response = self.stamped(StatusCode::OK);
        let (header_kind, body_kind) = match method {
            Method::ReqMod => (SectionKind::RequestHeader, SectionKind::RequestBody),
            Method::RespMod | Method::Options => {
                if let Some(original) = request
                    .section(SectionKind::RequestHeader)
                    .filter(|s| !s.payload.is_empty())
                {
                    response.push_section(EncapsulatedSection::request_header(
                        original.payload.clone(),
                    ));
                }
                (SectionKind::ResponseHeader, SectionKind::ResponseBody)
            }
        };

        if !adapted.header.is_empty() {
            response.push_section(EncapsulatedSection::new(header_kind, adapted.header));
        }
        match adapted.body {
            Some(body) => response.push_section(EncapsulatedSection::new(body_kind, body)),
            None => response.push_section(EncapsulatedSection::null_body()),
        };
        response
    }

    /// `200 OK` answer to an OPTIONS request.
    pub fn options(&self, config: &DriverConfig) -> IcapMessage {
        let mut response = self.stamped(StatusCode::OK);
        let headers = &mut response.headers;
        headers.append("Methods", "REQMOD, RESPMOD");
        headers.append("Service", config.service.as_str());
        headers.append("Options-TTL", config.options_ttl.to_string());
        if config.allow_204 {
            headers.append("Allow", "204");
        }
        if let Some(preview) = config.preview {
            headers.append("Preview", preview.to_string());
        }
        response.with_section(EncapsulatedSection::null_body())
    }

    pub fn for_verdict(&self, verdict: AdaptationVerdict) -> IcapMessage {
        match verdict {
            AdaptationVerdict::Continue => self.continue_response(),
            AdaptationVerdict::NoModificationNeeded => self.no_content(),
            AdaptationVerdict::Modified(message) => message,
            AdaptationVerdict::Error(status) => self.error(status),
        }
    }

    fn stamped(&self, status: StatusCode) -> IcapMessage {
        IcapMessage::response(status)
            .with_header("ISTag", self.istag.as_str())
            .with_header("Server", self.server.as_str())
    }
}
