use icap_decoder::{merge_continuation, DecodeError, IcapDecoder};
use icap_encoder::IcapEncoder;
use icap_types::{AdaptationVerdict, IcapMessage, PreviewState, StatusCode};

use crate::config::DriverConfig;
use crate::engine::Engine;
use crate::error::HostError;

/// Byte-level entry points for a host runtime.
///
/// The host owns sockets and connection lifecycle. It hands over complete
/// request bytes and writes back whatever bytes these methods return:
///
/// ```text
///   host                                  Host
///   ────                                  ────
///   init()                         ──►    adapter init (once)
///   bytes with Preview: n          ──►    preview(raw)  ──► 100 / 204 / 200 / 501
///   ... after 100, the remainder   ──►    resume(raw_preview, raw_rest) ──► 204 / 200
///   bytes without preview          ──►    modify(raw)   ──► 204 / 200 / 501
///   cleanup()                      ──►    adapter cleanup (once)
/// ```
///
/// An unknown method is answered with an encoded 501 rather than an error.
/// Every other decode failure is returned as [`HostError::Malformed`].
pub struct Host {
    engine: Engine,
}

enum Decoded {
    Request(IcapMessage),
    Reply(Vec<u8>),
}

impl Host {
    pub fn new(config: DriverConfig) -> Self {
        Self::from_engine(Engine::new(config))
    }

    pub fn from_engine(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// # Errors
    ///
    /// See [`Engine::init`].
    pub fn init(&self) -> Result<(), HostError> {
        Ok(self.engine.init()?)
    }

    /// # Errors
    ///
    /// See [`Engine::cleanup`].
    pub fn cleanup(&self) -> Result<(), HostError> {
        Ok(self.engine.cleanup()?)
    }

    /// Answer a request that may carry a preview. Without a `Preview`
    /// header this behaves like [`modify`](Self::modify).
    ///
    /// # Errors
    ///
    /// [`HostError::Malformed`] for undecodable bytes or an invalid
    /// `Preview` value, [`HostError::Driver`] for engine failures.
    pub fn preview(&self, raw: &[u8]) -> Result<Vec<u8>, HostError> {
        let request = match self.decode(raw)? {
            Decoded::Request(request) => request,
            Decoded::Reply(bytes) => return Ok(bytes),
        };
        let state = PreviewState::from_message(&request)
            .map_err(|err| self.malformed(DecodeError::Type(err)))?;
        self.answer(&request, state.as_ref())
    }

    /// Answer a request whose body is complete. A `Preview` header, if
    /// present, is not consulted.
    ///
    /// # Errors
    ///
    /// As [`preview`](Self::preview).
    pub fn modify(&self, raw: &[u8]) -> Result<Vec<u8>, HostError> {
        match self.decode(raw)? {
            Decoded::Request(request) => self.answer(&request, None),
            Decoded::Reply(bytes) => Ok(bytes),
        }
    }

    /// Answer a previewed request once its remainder has arrived.
    ///
    /// # Errors
    ///
    /// As [`preview`](Self::preview); the continuation must be one complete
    /// chunked stream with nothing after it.
    pub fn resume(&self, raw_preview: &[u8], raw_continuation: &[u8]) -> Result<Vec<u8>, HostError> {
        let mut request = match self.decode(raw_preview)? {
            Decoded::Request(request) => request,
            Decoded::Reply(bytes) => return Ok(bytes),
        };
        let consumed = merge_continuation(&mut request, raw_continuation)
            .map_err(|err| self.malformed(err))?;
        if consumed < raw_continuation.len() {
            return Err(self.malformed(DecodeError::TrailingData {
                extra_bytes: raw_continuation.len() - consumed,
            }));
        }
        self.answer(&request, None)
    }

    fn answer(
        &self,
        request: &IcapMessage,
        preview: Option<&PreviewState>,
    ) -> Result<Vec<u8>, HostError> {
        let verdict = self.engine.handle(request, preview)?;
        let response = self.engine.respond(verdict);
        Ok(IcapEncoder::encode(&response)?)
    }

    fn decode(&self, raw: &[u8]) -> Result<Decoded, HostError> {
        match IcapDecoder::decode_request(raw) {
            Ok(request) => Ok(Decoded::Request(request)),
            Err(DecodeError::UnsupportedMethod { method }) => {
                tracing::warn!(parent: self.engine.span(), %method, "unsupported ICAP method");
                let reply = self
                    .engine
                    .respond(AdaptationVerdict::Error(StatusCode::NOT_IMPLEMENTED));
                Ok(Decoded::Reply(IcapEncoder::encode(&reply)?))
            }
            Err(err) => Err(self.malformed(err)),
        }
    }

    fn malformed(&self, err: DecodeError) -> HostError {
        tracing::warn!(parent: self.engine.span(), error = %err, "malformed ICAP request");
        HostError::Malformed(err)
    }
}
