use std::sync::atomic::{AtomicU8, Ordering};

use icap_types::{AdaptationVerdict, IcapMessage, Method, PreviewState, StatusCode};
use tracing::Span;

use crate::adapter::{Adaptation, AdaptedMessage, Adapter, Exchange};
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::preview::{PreviewNegotiation, PreviewPhase};
use crate::respond::ResponseFactory;

const UNINITIALISED: u8 = 0;
const INITIALISING: u8 = 1;
const READY: u8 = 2;
const STOPPED: u8 = 3;

fn state_name(state: u8) -> &'static str {
    match state {
        UNINITIALISED => "uninitialised",
        INITIALISING => "initialising",
        READY => "ready",
        _ => "stopped",
    }
}

/// The adaptation decision engine.
///
/// Given a decoded request and, for previews, what the client announced
/// and sent, the engine produces an [`AdaptationVerdict`]:
///
/// ```text
///   OPTIONS ─────────────────────────────────────────────► Modified(200 OPTIONS)
///   adapter does not support method ─────────────────────► Error(501)
///   partial preview ──► adapter.preview ──► ContinueRequested ─► Continue (100)
///                                        └─► EarlyTerminated ───► NoModificationNeeded (204)
///   complete preview (ieof or no body) ──► ProceedWithPreviewOnly ─┐
///   no preview ────────────────────────────────────────────────────┴► adapter.modify
///        Decline ─────────────────────────────────────────► Error(501)
///        Unchanged, 204 permitted ────────────────────────► NoModificationNeeded
///        Unchanged, 204 not permitted ────────────────────► Modified(200 echo)
///        Replace(adapted) ────────────────────────────────► Modified(200 adapted)
/// ```
///
/// A complete preview is never offered to `adapter.preview`; its bytes go
/// straight to `modify`. A 204 is permitted inside a preview, or when the
/// configuration honours `Allow: 204` and the client sent it.
///
/// The engine holds no per-exchange state, so one instance serves any
/// number of concurrent exchanges. Its only shared state is the lifecycle
/// flag, which is updated atomically.
///
/// Events are recorded under the span given to
/// [`with_span`](Self::with_span), one child span per exchange.
pub struct Engine {
    config: DriverConfig,
    adapter: Box<dyn Adapter>,
    responses: ResponseFactory,
    lifecycle: AtomicU8,
    span: Span,
}

impl Engine {
    /// An engine running the adapter selected by `config.adapter`.
    pub fn new(config: DriverConfig) -> Self {
        let adapter = config.adapter.build();
        Self::with_adapter(config, adapter)
    }

    /// An engine running a caller-supplied adapter. `config.adapter` is
    /// ignored.
    pub fn with_adapter(config: DriverConfig, adapter: Box<dyn Adapter>) -> Self {
        let responses = ResponseFactory::from_config(&config);
        Self {
            config,
            adapter,
            responses,
            lifecycle: AtomicU8::new(UNINITIALISED),
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn istag(&self) -> &str {
        self.responses.istag()
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == READY
    }

    /// Run the adapter's `init`. Succeeds once; a failed `init` may be
    /// retried.
    ///
    /// # Errors
    ///
    /// [`DriverError::Lifecycle`] unless the engine is uninitialised, or
    /// the adapter's own error.
    pub fn init(&self) -> Result<(), DriverError> {
        self.lifecycle
            .compare_exchange(UNINITIALISED, INITIALISING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|state| DriverError::Lifecycle {
                state: state_name(state),
                operation: "initialise",
            })?;

        if let Err(err) = self.adapter.init() {
            self.lifecycle.store(UNINITIALISED, Ordering::Release);
            tracing::error!(parent: &self.span, adapter = self.adapter.name(), error = %err, "adapter init failed");
            return Err(err);
        }
        self.lifecycle.store(READY, Ordering::Release);
        tracing::info!(
            parent: &self.span,
            adapter = self.adapter.name(),
            istag = %self.istag(),
            "adaptation engine ready"
        );
        Ok(())
    }

    /// Run the adapter's `cleanup`. Succeeds once, and only after `init`.
    ///
    /// # Errors
    ///
    /// [`DriverError::Lifecycle`] unless the engine is ready, or the
    /// adapter's own error.
    pub fn cleanup(&self) -> Result<(), DriverError> {
        self.lifecycle
            .compare_exchange(READY, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|state| DriverError::Lifecycle {
                state: state_name(state),
                operation: "clean up",
            })?;
        self.adapter.cleanup()?;
        tracing::info!(parent: &self.span, adapter = self.adapter.name(), "adaptation engine stopped");
        Ok(())
    }

    /// Decide how to answer one exchange.
    ///
    /// `preview` is the request's preview state, or `None` when the request
    /// carries a complete body (no preview, or a merged continuation).
    ///
    /// # Errors
    ///
    /// - [`DriverError::Lifecycle`] before `init` or after `cleanup`.
    /// - [`DriverError::NotARequest`] for a response message.
    pub fn handle(
        &self,
        request: &IcapMessage,
        preview: Option<&PreviewState>,
    ) -> Result<AdaptationVerdict, DriverError> {
        let state = self.lifecycle.load(Ordering::Acquire);
        if state != READY {
            return Err(DriverError::Lifecycle {
                state: state_name(state),
                operation: "handle an exchange",
            });
        }
        let method = request.method().ok_or(DriverError::NotARequest)?;

        let span = tracing::debug_span!(
            parent: &self.span,
            "exchange",
            method = %method,
            service = request.service_uri().unwrap_or_default(),
            adapter = self.adapter.name(),
        );
        let _entered = span.enter();

        let verdict = self.decide(method, request, preview)?;
        tracing::debug!(status = verdict.status().as_u16(), "verdict");
        Ok(verdict)
    }

    /// Turn a verdict into the response message to encode.
    pub fn respond(&self, verdict: AdaptationVerdict) -> IcapMessage {
        self.responses.for_verdict(verdict)
    }

    /// The OPTIONS response for this engine's configuration.
    pub fn options(&self) -> IcapMessage {
        self.responses.options(&self.config)
    }

    fn decide(
        &self,
        method: Method,
        request: &IcapMessage,
        preview: Option<&PreviewState>,
    ) -> Result<AdaptationVerdict, DriverError> {
        if method == Method::Options {
            return Ok(AdaptationVerdict::Modified(self.options()));
        }
        if !self.adapter.supports(method) {
            tracing::debug!("adapter does not implement method");
            return Ok(AdaptationVerdict::Error(StatusCode::NOT_IMPLEMENTED));
        }

        let exchange = Exchange::new(method, request);
        let mut negotiation = PreviewNegotiation::begin(preview);

        if let Some(state) = preview.filter(|s| s.exceeds_announced()) {
            tracing::warn!(
                preview = state.announced_size,
                received = state.bytes_received,
                "client sent more preview bytes than announced"
            );
        }
        if negotiation.phase() == PreviewPhase::ProceedWithPreviewOnly {
            tracing::debug!(
                received = preview.map_or(0, |s| s.bytes_received),
                "preview holds the whole body"
            );
        }

        if let Some(state) = negotiation.pending() {
            let decision = self.adapter.preview(&exchange, &state);
            let phase = negotiation.decide(decision).inspect_err(|err| {
                tracing::error!(
                    error = %err,
                    ieof = state.saw_ieof,
                    ?decision,
                    "preview contract violated"
                );
            })?;
            tracing::debug!(
                preview = state.announced_size,
                received = state.bytes_received,
                ?decision,
                ?phase,
                "preview decided"
            );
            match phase {
                PreviewPhase::ContinueRequested => return Ok(AdaptationVerdict::Continue),
                PreviewPhase::EarlyTerminated => {
                    return Ok(AdaptationVerdict::NoModificationNeeded);
                }
                PreviewPhase::NoPreview
                | PreviewPhase::AwaitingDecision
                | PreviewPhase::ProceedWithPreviewOnly => {}
            }
        }

        let allow_204 = negotiation.phase() == PreviewPhase::ProceedWithPreviewOnly
            || (self.config.allow_204 && request.headers.has_token("Allow", "204"));

        let verdict = match self.adapter.modify(&exchange) {
            Adaptation::Decline => AdaptationVerdict::Error(StatusCode::NOT_IMPLEMENTED),
            Adaptation::Unchanged if allow_204 => AdaptationVerdict::NoModificationNeeded,
            Adaptation::Unchanged => AdaptationVerdict::Modified(self.responses.modified(
                method,
                request,
                AdaptedMessage::from_subject(&exchange.subject),
            )),
            Adaptation::Replace(adapted) => {
                AdaptationVerdict::Modified(self.responses.modified(method, request, adapted))
            }
        };
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterKind;
    use icap_types::{EncapsulatedSection, SectionKind};

    fn engine(kind: AdapterKind) -> Engine {
        let engine = Engine::new(DriverConfig {
            adapter: kind,
            istag: Some("BITZ-test".to_string()),
            ..DriverConfig::default()
        });
        engine.init().unwrap();
        engine
    }

    fn reqmod(body: Option<&str>) -> IcapMessage {
        let message = IcapMessage::request(Method::ReqMod, "icap://h/s")
            .with_section(EncapsulatedSection::request_header("POST / HTTP/1.1\r\n\r\n"));
        match body {
            Some(body) => message.with_section(EncapsulatedSection::request_body(body)),
            None => message.with_section(EncapsulatedSection::null_body()),
        }
    }

    #[test]
    fn handle_before_init_fails() {
        let engine = Engine::new(DriverConfig::default());
        assert!(matches!(
            engine.handle(&reqmod(None), None),
            Err(DriverError::Lifecycle { state: "uninitialised", .. })
        ));
    }

    #[test]
    fn lifecycle_runs_once() {
        let engine = engine(AdapterKind::Echo);
        assert!(engine.is_ready());
        assert!(engine.init().is_err());
        engine.cleanup().unwrap();
        assert!(engine.cleanup().is_err());
        assert!(matches!(
            engine.handle(&reqmod(None), None),
            Err(DriverError::Lifecycle { state: "stopped", .. })
        ));
    }

    #[test]
    fn cleanup_before_init_fails() {
        let engine = Engine::new(DriverConfig::default());
        assert!(matches!(
            engine.cleanup(),
            Err(DriverError::Lifecycle { state: "uninitialised", .. })
        ));
    }

    #[test]
    fn responses_are_rejected() {
        let engine = engine(AdapterKind::Echo);
        let response = IcapMessage::response(StatusCode::OK);
        assert!(matches!(engine.handle(&response, None), Err(DriverError::NotARequest)));
    }

    #[test]
    fn options_answered_by_engine() {
        let engine = engine(AdapterKind::Decline);
        let request = IcapMessage::request(Method::Options, "icap://h/s");
        match engine.handle(&request, None).unwrap() {
            AdaptationVerdict::Modified(message) => {
                assert_eq!(message.status(), Some(StatusCode::OK));
                assert_eq!(message.headers.get("ISTag"), Some("\"BITZ-test\""));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decline_answers_501() {
        let engine = engine(AdapterKind::Decline);
        let verdict = engine.handle(&reqmod(Some("x")), None).unwrap();
        assert_eq!(verdict, AdaptationVerdict::Error(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn preview_without_ieof_requests_continue() {
        let engine = engine(AdapterKind::Echo);
        let state = PreviewState::new(4, 4, false);
        let verdict = engine.handle(&reqmod(Some("abcd")), Some(&state)).unwrap();
        assert_eq!(verdict, AdaptationVerdict::Continue);
    }

    #[test]
    fn preview_with_ieof_proceeds() {
        let engine = engine(AdapterKind::Echo);
        let state = PreviewState::new(1024, 3, true);
        let verdict = engine.handle(&reqmod(Some("abc")), Some(&state)).unwrap();
        match verdict {
            AdaptationVerdict::Modified(message) => {
                assert_eq!(message.body_section().unwrap().kind, SectionKind::RequestBody);
                assert!(!message.body_section().unwrap().ieof);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn preview_echo_unchanged_in_preview_is_204() {
        let engine = engine(AdapterKind::PreviewEcho);
        let state = PreviewState::new(1024, 3, true);
        let verdict = engine.handle(&reqmod(Some("abc")), Some(&state)).unwrap();
        assert_eq!(verdict, AdaptationVerdict::NoModificationNeeded);
    }

    #[test]
    fn unchanged_without_allow_204_echoes() {
        let engine = engine(AdapterKind::PreviewEcho);
        let verdict = engine.handle(&reqmod(Some("abc")), None).unwrap();
        assert!(matches!(verdict, AdaptationVerdict::Modified(_)));

        let allowed = reqmod(Some("abc")).with_header("Allow", "204");
        let verdict = engine.handle(&allowed, None).unwrap();
        assert_eq!(verdict, AdaptationVerdict::NoModificationNeeded);
    }

    #[test]
    fn request_is_left_untouched() {
        let engine = engine(AdapterKind::Echo);
        let request = reqmod(Some("abc")).with_header("Preview", "1024");
        let before = request.clone();
        let state = PreviewState::new(1024, 3, true);
        engine.handle(&request, Some(&state)).unwrap();
        engine.handle(&request, None).unwrap();
        assert_eq!(request, before);
    }

    #[test]
    fn allow_204_can_be_disabled() {
        let engine = Engine::new(DriverConfig {
            adapter: AdapterKind::PreviewEcho,
            allow_204: false,
            ..DriverConfig::default()
        });
        engine.init().unwrap();
        let allowed = reqmod(Some("abc")).with_header("Allow", "204");
        assert!(matches!(
            engine.handle(&allowed, None).unwrap(),
            AdaptationVerdict::Modified(_)
        ));
    }

    /// Settles every preview early but rewrites complete bodies.
    struct Rewriter;

    impl Adapter for Rewriter {
        fn name(&self) -> &'static str {
            "rewriter"
        }

        fn preview(
            &self,
            _exchange: &Exchange<'_>,
            _state: &PreviewState,
        ) -> crate::preview::PreviewDecision {
            crate::preview::PreviewDecision::NoModification
        }

        fn modify(&self, _exchange: &Exchange<'_>) -> Adaptation {
            Adaptation::Replace(AdaptedMessage {
                header: b"POST / HTTP/1.1\r\n\r\n".to_vec(),
                body: Some(b"rewritten".to_vec()),
            })
        }
    }

    #[test]
    fn ieof_preview_goes_straight_to_modify() {
        let engine = Engine::with_adapter(DriverConfig::default(), Box::new(Rewriter));
        engine.init().unwrap();
        let state = PreviewState::new(1024, 3, true);
        match engine.handle(&reqmod(Some("abc")), Some(&state)).unwrap() {
            AdaptationVerdict::Modified(message) => {
                assert_eq!(message.body_section().unwrap().payload, b"rewritten");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn partial_preview_consults_the_adapter() {
        let engine = Engine::with_adapter(DriverConfig::default(), Box::new(Rewriter));
        engine.init().unwrap();
        let state = PreviewState::new(2, 2, false);
        assert_eq!(
            engine.handle(&reqmod(Some("ab")), Some(&state)).unwrap(),
            AdaptationVerdict::NoModificationNeeded
        );
    }

    #[test]
    fn bodiless_preview_is_never_continued() {
        let engine = engine(AdapterKind::Echo);
        let request = reqmod(None).with_header("Preview", "0");
        let state = PreviewState::from_message(&request).unwrap();
        let verdict = engine.handle(&request, state.as_ref()).unwrap();
        assert!(matches!(verdict, AdaptationVerdict::Modified(_)), "{verdict:?}");
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        let engine = std::sync::Arc::new(engine(AdapterKind::Echo));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = std::sync::Arc::clone(&engine);
                std::thread::spawn(move || {
                    let body = format!("body {i}");
                    engine.handle(&reqmod(Some(&body)), None).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(matches!(handle.join().unwrap(), AdaptationVerdict::Modified(_)));
        }
    }
}
