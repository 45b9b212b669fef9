//! Built-in adapters, selectable through [`AdapterKind`](crate::AdapterKind).

use icap_types::{Method, PreviewState};

use crate::adapter::{Adaptation, AdaptedMessage, Adapter, Exchange};
use crate::preview::PreviewDecision;

/// Implements nothing: every REQMOD and RESPMOD is answered with 501.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclineAdapter;

impl Adapter for DeclineAdapter {
    fn name(&self) -> &'static str {
        "decline"
    }

    fn supports(&self, _method: Method) -> bool {
        false
    }

    fn modify(&self, _exchange: &Exchange<'_>) -> Adaptation {
        Adaptation::Decline
    }
}

/// Returns the HTTP message unchanged as a `200` response. Uses the default
/// preview behaviour.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoAdapter;

impl Adapter for EchoAdapter {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn modify(&self, exchange: &Exchange<'_>) -> Adaptation {
        Adaptation::Replace(AdaptedMessage::from_subject(&exchange.subject))
    }
}

/// Preview-aware echo.
///
/// A bodiless message is settled during the preview with `204`. A preview
/// that ended in `ieof` proceeds without a continuation; anything else asks
/// for the remainder. The full message is always reported unchanged, so a
/// complete preview also ends with `204`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreviewEchoAdapter;

impl Adapter for PreviewEchoAdapter {
    fn name(&self) -> &'static str {
        "preview-echo"
    }

    fn preview(&self, exchange: &Exchange<'_>, state: &PreviewState) -> PreviewDecision {
        if exchange.subject.body.is_none() {
            PreviewDecision::NoModification
        } else if state.saw_ieof {
            PreviewDecision::Ready
        } else {
            PreviewDecision::NeedRemainder
        }
    }

    fn modify(&self, _exchange: &Exchange<'_>) -> Adaptation {
        Adaptation::Unchanged
    }
}
