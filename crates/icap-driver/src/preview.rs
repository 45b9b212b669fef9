use icap_types::PreviewState;

use crate::error::DriverError;

/// Where a preview exchange stands.
///
/// ```text
///                       ┌──────────────────┐
///   no Preview header ─►│ NoPreview        │  (full body present; modify directly)
///                       └──────────────────┘
///                       ┌─────────────────────────┐
///   Preview: n, ieof ──►│ ProceedWithPreviewOnly  │  modify the preview bytes
///                       └─────────────────────────┘
///                       ┌──────────────────┐ NeedRemainder / Ready ┌───────────────────┐
///   Preview: n ────────►│ AwaitingDecision │──────────────────────►│ ContinueRequested │ 100
///                       └──────────────────┘                       └───────────────────┘
///                                   │ NoModification               ┌───────────────────┐
///                                   └─────────────────────────────►│ EarlyTerminated   │ 204
///                                                                  └───────────────────┘
/// ```
///
/// A preview that ended in `ieof`, or a message with no chunked body,
/// already holds everything the client will send. It never waits for an
/// adapter's preview decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewPhase {
    NoPreview,
    AwaitingDecision,
    ContinueRequested,
    EarlyTerminated,
    ProceedWithPreviewOnly,
}

/// An adapter's answer after inspecting preview bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewDecision {
    /// The rest of the body is needed before deciding.
    NeedRemainder,
    /// Nothing will change; end the exchange with 204.
    NoModification,
    /// Ready to adapt with what has been received.
    Ready,
}

/// Pure transition for a preview `decision`.
///
/// Depends only on `decision` and `state.saw_ieof`, so identical inputs
/// always produce the same phase.
///
/// ```text
///   decision         no ieof             ieof
///   NeedRemainder    ContinueRequested   error
///   Ready            ContinueRequested   ProceedWithPreviewOnly
///   NoModification   EarlyTerminated     ProceedWithPreviewOnly
/// ```
///
/// `Ready` without `ieof` still requests the remainder: the adapter may be
/// ready, but the body it would rewrite is incomplete. With `ieof` the
/// preview is the whole body and is always modified in full.
///
/// # Errors
///
/// Returns [`DriverError::ContinueAfterIeof`] when the decision asks for the
/// remainder of a body that the client already finished with `ieof`.
pub fn transition(
    state: &PreviewState,
    decision: PreviewDecision,
) -> Result<PreviewPhase, DriverError> {
    match (decision, state.saw_ieof) {
        (PreviewDecision::NeedRemainder, true) => Err(DriverError::ContinueAfterIeof),
        (PreviewDecision::Ready | PreviewDecision::NoModification, true) => {
            Ok(PreviewPhase::ProceedWithPreviewOnly)
        }
        (PreviewDecision::NeedRemainder | PreviewDecision::Ready, false) => {
            Ok(PreviewPhase::ContinueRequested)
        }
        (PreviewDecision::NoModification, false) => Ok(PreviewPhase::EarlyTerminated),
    }
}

/// Tracks one exchange through preview negotiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewNegotiation {
    state: Option<PreviewState>,
    phase: PreviewPhase,
}

impl PreviewNegotiation {
    /// Start negotiating. A missing state, or one with no announced size,
    /// means the exchange is not a preview. A complete preview starts in
    /// [`PreviewPhase::ProceedWithPreviewOnly`] with nothing to decide.
    pub fn begin(state: Option<&PreviewState>) -> Self {
        match state.filter(|s| s.is_preview()) {
            Some(state) => Self {
                state: Some(*state),
                phase: if state.saw_ieof {
                    PreviewPhase::ProceedWithPreviewOnly
                } else {
                    PreviewPhase::AwaitingDecision
                },
            },
            None => Self {
                state: None,
                phase: PreviewPhase::NoPreview,
            },
        }
    }

    pub fn phase(&self) -> PreviewPhase {
        self.phase
    }

    /// The preview state, while a decision is still pending.
    pub fn pending(&self) -> Option<PreviewState> {
        match self.phase {
            PreviewPhase::AwaitingDecision => self.state,
            _ => None,
        }
    }

    /// Apply the adapter's decision.
    ///
    /// # Errors
    ///
    /// [`DriverError::PreviewAlreadyDecided`] outside `AwaitingDecision`,
    /// otherwise as [`transition`].
    pub fn decide(&mut self, decision: PreviewDecision) -> Result<PreviewPhase, DriverError> {
        let Some(state) = self.pending() else {
            return Err(DriverError::PreviewAlreadyDecided { phase: self.phase });
        };
        self.phase = transition(&state, decision)?;
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ieof: bool) -> PreviewState {
        PreviewState::new(1024, 30, ieof)
    }

    #[test]
    fn transition_table() {
        use PreviewDecision::*;
        use PreviewPhase::*;
        assert_eq!(transition(&state(false), NoModification).unwrap(), EarlyTerminated);
        assert_eq!(transition(&state(true), NoModification).unwrap(), ProceedWithPreviewOnly);
        assert_eq!(transition(&state(false), NeedRemainder).unwrap(), ContinueRequested);
        assert_eq!(transition(&state(false), Ready).unwrap(), ContinueRequested);
        assert_eq!(transition(&state(true), Ready).unwrap(), ProceedWithPreviewOnly);
        assert!(matches!(
            transition(&state(true), NeedRemainder),
            Err(DriverError::ContinueAfterIeof)
        ));
    }

    #[test]
    fn transition_ignores_sizes() {
        let small = PreviewState::new(0, 0, true);
        let large = PreviewState::new(1 << 20, 4096, true);
        for decision in [PreviewDecision::NoModification, PreviewDecision::Ready] {
            assert_eq!(
                transition(&small, decision).unwrap(),
                transition(&large, decision).unwrap()
            );
        }
    }

    #[test]
    fn begin_without_preview() {
        assert_eq!(PreviewNegotiation::begin(None).phase(), PreviewPhase::NoPreview);
        let not_announced = PreviewState::default();
        let negotiation = PreviewNegotiation::begin(Some(&not_announced));
        assert_eq!(negotiation.phase(), PreviewPhase::NoPreview);
        assert_eq!(negotiation.pending(), None);
    }

    #[test]
    fn complete_preview_needs_no_decision() {
        let preview = state(true);
        let mut negotiation = PreviewNegotiation::begin(Some(&preview));
        assert_eq!(negotiation.phase(), PreviewPhase::ProceedWithPreviewOnly);
        assert_eq!(negotiation.pending(), None);
        assert!(matches!(
            negotiation.decide(PreviewDecision::NoModification),
            Err(DriverError::PreviewAlreadyDecided {
                phase: PreviewPhase::ProceedWithPreviewOnly
            })
        ));
    }

    #[test]
    fn decide_once() {
        let preview = state(false);
        let mut negotiation = PreviewNegotiation::begin(Some(&preview));
        assert_eq!(negotiation.phase(), PreviewPhase::AwaitingDecision);
        assert_eq!(negotiation.pending(), Some(preview));
        assert_eq!(
            negotiation.decide(PreviewDecision::NoModification).unwrap(),
            PreviewPhase::EarlyTerminated
        );
        assert!(matches!(
            negotiation.decide(PreviewDecision::Ready),
            Err(DriverError::PreviewAlreadyDecided {
                phase: PreviewPhase::EarlyTerminated
            })
        ));
    }

    #[test]
    fn decide_without_preview_fails() {
        let mut negotiation = PreviewNegotiation::begin(None);
        assert!(negotiation.decide(PreviewDecision::Ready).is_err());
    }
}
