//! The popup controller: one generation request at a time, plus copy and send.
//!
//! `initiate` is the whole round trip for callers that can simply await it.
//! Hosts that must keep drawing while a request is out use the same steps
//! separately: `begin` on the UI side, `exchange` on a spawned task, then
//! `resolve` back on the UI side when the outcome arrives. `improve` and
//! `begin_improve` do the same for reworking the current draft.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::{DraftError, TransportError};
use crate::host::{Clipboard, MailLauncher, PeerChannel, TabLocator};
use crate::mailto::{self, DEFAULT_SUBJECT};
use crate::protocol::{Context, PeerRequest, Response};
use crate::state::{render, ControlView, CopyAffordance, UiState};

/// How long the copy trigger shows its confirmation.
pub const COPY_FEEDBACK: Duration = Duration::from_millis(1500);

pub struct DraftOrchestrator {
    state: UiState,
    draft_text: String,
    in_flight: bool,
    copy_confirmed_until: Option<Instant>,
    copy_feedback: Duration,
    subject: String,
}

impl Default for DraftOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftOrchestrator {
    pub fn new() -> Self {
        Self {
            state: UiState::Idle,
            draft_text: String::new(),
            in_flight: false,
            copy_confirmed_until: None,
            copy_feedback: COPY_FEEDBACK,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_copy_feedback(mut self, window: Duration) -> Self {
        self.copy_feedback = window;
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn view(&self, now: Instant) -> ControlView {
        render(&self.state, &self.draft_text, self.copy_affordance(now))
    }

    /// Validate, generate, and resolve in one call.
    pub async fn initiate<L, P>(
        &mut self,
        context_raw: &str,
        locator: &L,
        channel: &P,
    ) -> Result<&UiState, DraftError>
    where
        L: TabLocator + ?Sized,
        P: PeerChannel + ?Sized,
    {
        let request = self.begin(context_raw)?;
        let response = exchange(locator, channel, request).await;
        Ok(self.resolve(response))
    }

    /// Validate the context and enter `Pending`.
    ///
    /// Nothing changes on error: an empty context leaves the state as it was,
    /// and so does a second call while a request is still out.
    pub fn begin(&mut self, context_raw: &str) -> Result<PeerRequest, DraftError> {
        if self.in_flight {
            return Err(DraftError::Busy);
        }
        let context = Context::parse(context_raw)?;

        self.in_flight = true;
        self.draft_text.clear();
        self.state = UiState::Pending;
        debug!(chars = context.as_str().len(), "draft request pending");

        Ok(PeerRequest::generate(context))
    }

    /// Ask the active tab to rework the current draft, and resolve.
    pub async fn improve<L, P>(
        &mut self,
        instructions_raw: &str,
        locator: &L,
        channel: &P,
    ) -> Result<&UiState, DraftError>
    where
        L: TabLocator + ?Sized,
        P: PeerChannel + ?Sized,
    {
        let request = self.begin_improve(instructions_raw)?;
        let response = exchange(locator, channel, request).await;
        Ok(self.resolve(response))
    }

    /// Like `begin`, but the request carries the current draft along with the
    /// instructions. Only a successful draft can be improved.
    pub fn begin_improve(&mut self, instructions_raw: &str) -> Result<PeerRequest, DraftError> {
        if self.in_flight {
            return Err(DraftError::Busy);
        }
        let UiState::Resolved {
            is_error: false, ..
        } = &self.state
        else {
            return Err(DraftError::NoDraft);
        };
        let instructions = Context::parse(instructions_raw)?;

        let draft = std::mem::take(&mut self.draft_text);
        self.in_flight = true;
        self.state = UiState::Pending;
        debug!(chars = draft.len(), "improve request pending");

        Ok(PeerRequest::improve(draft, instructions))
    }

    /// Leave `Pending` with the outcome of the outstanding request.
    pub fn resolve(&mut self, response: Response) -> &UiState {
        if !self.in_flight {
            warn!(?response, "ignoring response with no request outstanding");
            return &self.state;
        }

        self.in_flight = false;
        match &response {
            Response::Success { email } => info!(chars = email.len(), "draft generated"),
            Response::ApplicationError { message } => {
                warn!(%message, "content script reported an error")
            }
            Response::TransportError { message } => {
                warn!(%message, "peer channel failed")
            }
            Response::Malformed => warn!("content script replied with an unexpected shape"),
        }

        self.draft_text = response.draft_text();
        self.state = UiState::Resolved {
            draft: self.draft_text.clone(),
            is_error: response.is_error(),
        };
        &self.state
    }

    /// Copy the current draft. Returns false when there was nothing to copy.
    ///
    /// The confirmation shows whether or not the clipboard accepted the text;
    /// a failed write is only logged.
    pub fn copy_draft<C>(&mut self, clipboard: &C, now: Instant) -> bool
    where
        C: Clipboard + ?Sized,
    {
        if self.draft_text.is_empty() {
            return false;
        }
        if let Err(err) = clipboard.write_text(&self.draft_text) {
            warn!(error = %err, "copy failed");
        }
        self.copy_confirmed_until = Some(now + self.copy_feedback);
        true
    }

    pub fn copy_affordance(&self, now: Instant) -> CopyAffordance {
        match self.copy_confirmed_until {
            Some(until) if now < until => CopyAffordance::Confirmed,
            _ => CopyAffordance::Default,
        }
    }

    /// Open the mail client with the current draft as body. Returns the URI.
    pub fn send_draft<M>(&self, launcher: &M) -> String
    where
        M: MailLauncher + ?Sized,
    {
        let uri = mailto::compose_uri(&self.subject, &self.draft_text);
        if let Err(err) = launcher.open(&uri) {
            warn!(error = %err, "could not open mail client");
        }
        uri
    }
}

/// Address the active tab and wait for exactly one outcome.
///
/// Every failure is folded into the returned `Response`; there is no timeout
/// here, the channel decides when a peer has gone silent for good.
pub async fn exchange<L, P>(locator: &L, channel: &P, request: PeerRequest) -> Response
where
    L: TabLocator + ?Sized,
    P: PeerChannel + ?Sized,
{
    let Some(tab) = locator.active_tab().await else {
        return Response::TransportError {
            message: TransportError::no_active_tab().message,
        };
    };

    debug!(tab, kind = request.kind(), "sending request");
    let reply = channel.send_message(tab, request.to_value()).await;
    if let Err(err) = &reply {
        error!(tab, error = %err, "error in popup after content script response");
    }
    Response::from_reply(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::TabId;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct FixedTab(Option<TabId>);

    #[async_trait]
    impl TabLocator for FixedTab {
        async fn active_tab(&self) -> Option<TabId> {
            self.0
        }
    }

    struct Replies {
        reply: Result<Value, TransportError>,
        sent: Mutex<Vec<(TabId, Value)>>,
    }

    impl Replies {
        fn new(reply: Result<Value, TransportError>) -> Self {
            Self {
                reply,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PeerChannel for Replies {
        async fn send_message(&self, tab: TabId, message: Value) -> Result<Value, TransportError> {
            self.sent.lock().unwrap().push((tab, message));
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        fail: bool,
        writes: Mutex<Vec<String>>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), HostError> {
            self.writes.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(HostError::Unavailable("clipboard"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_begin_twice_is_busy() {
        let mut orch = DraftOrchestrator::new();
        orch.begin("first").unwrap();
        assert_eq!(orch.begin("second"), Err(DraftError::Busy));
        assert!(orch.state().is_pending());
    }

    #[test]
    fn test_begin_empty_keeps_previous_state() {
        let mut orch = DraftOrchestrator::new();
        orch.begin("x").unwrap();
        orch.resolve(Response::Success {
            email: "kept".into(),
        });
        assert_eq!(orch.begin("   "), Err(DraftError::EmptyContext));
        assert_eq!(orch.draft_text(), "kept");
        assert!(matches!(orch.state(), UiState::Resolved { .. }));
    }

    #[test]
    fn test_resolve_without_request_is_ignored() {
        let mut orch = DraftOrchestrator::new();
        orch.resolve(Response::Malformed);
        assert_eq!(orch.state(), &UiState::Idle);
        assert!(orch.draft_text().is_empty());
    }

    #[test]
    fn test_pending_clears_previous_draft() {
        let mut orch = DraftOrchestrator::new();
        orch.begin("x").unwrap();
        orch.resolve(Response::Success { email: "old".into() });
        orch.begin("y").unwrap();
        assert!(orch.draft_text().is_empty());
        let view = orch.view(Instant::now());
        assert!(view.loading_visible);
        assert!(!view.generate_enabled);
    }

    #[tokio::test]
    async fn test_initiate_sends_one_request_to_active_tab() {
        let mut orch = DraftOrchestrator::new();
        let channel = Replies::new(Ok(json!({"email": "Hello"})));
        orch.initiate("  ctx  ", &FixedTab(Some(7)), &channel)
            .await
            .unwrap();

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 7);
        assert_eq!(sent[0].1, json!({"type": "GENERATE_EMAIL", "context": "ctx"}));
        assert!(!orch.in_flight());
    }

    #[tokio::test]
    async fn test_no_tab_skips_channel() {
        let mut orch = DraftOrchestrator::new();
        let channel = Replies::new(Ok(json!({"email": "never"})));
        orch.initiate("valid", &FixedTab(None), &channel)
            .await
            .unwrap();
        assert!(channel.sent.lock().unwrap().is_empty());
        assert_eq!(orch.draft_text(), "Error: no active tab. Check console.");
    }

    #[test]
    fn test_copy_confirmation_window() {
        let mut orch = DraftOrchestrator::new().with_copy_feedback(Duration::from_millis(1500));
        orch.begin("x").unwrap();
        orch.resolve(Response::Success { email: "abc".into() });

        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let t0 = Instant::now();
        assert!(orch.copy_draft(&clipboard, t0));
        assert_eq!(clipboard.writes.lock().unwrap().as_slice(), ["abc"]);
        assert_eq!(orch.copy_affordance(t0), CopyAffordance::Confirmed);
        assert_eq!(
            orch.copy_affordance(t0 + Duration::from_millis(1499)),
            CopyAffordance::Confirmed
        );
        assert_eq!(
            orch.copy_affordance(t0 + Duration::from_millis(1500)),
            CopyAffordance::Default
        );
    }

    #[test]
    fn test_improve_needs_a_successful_draft() {
        let mut orch = DraftOrchestrator::new();
        assert_eq!(orch.begin_improve("shorter"), Err(DraftError::NoDraft));

        orch.begin("x").unwrap();
        assert_eq!(orch.begin_improve("shorter"), Err(DraftError::Busy));
        orch.resolve(Response::Malformed);
        assert_eq!(orch.begin_improve("shorter"), Err(DraftError::NoDraft));
        assert!(!orch.in_flight());
    }

    #[test]
    fn test_begin_improve_carries_the_draft() {
        let mut orch = DraftOrchestrator::new();
        orch.begin("x").unwrap();
        orch.resolve(Response::Success {
            email: "Dear Ada,".into(),
        });
        assert_eq!(orch.begin_improve(" \t"), Err(DraftError::EmptyContext));
        assert_eq!(orch.draft_text(), "Dear Ada,");

        let request = orch.begin_improve("warmer").unwrap();
        assert_eq!(
            request.to_value(),
            json!({"type": "IMPROVE_EMAIL", "email": "Dear Ada,", "context": "warmer"})
        );
        assert!(orch.draft_text().is_empty());
        assert!(orch.state().is_pending());
    }

    #[tokio::test]
    async fn test_improve_replaces_the_draft() {
        let mut orch = DraftOrchestrator::new();
        orch.begin("x").unwrap();
        orch.resolve(Response::Success { email: "v1".into() });

        let channel = Replies::new(Ok(json!({"email": "v2"})));
        orch.improve("tighter", &FixedTab(Some(3)), &channel)
            .await
            .unwrap();
        assert_eq!(orch.draft_text(), "v2");
        assert_eq!(channel.sent.lock().unwrap()[0].1["email"], "v1");
    }

    #[test]
    fn test_copy_empty_is_noop() {
        let mut orch = DraftOrchestrator::new();
        let clipboard = RecordingClipboard::default();
        let now = Instant::now();
        assert!(!orch.copy_draft(&clipboard, now));
        assert!(clipboard.writes.lock().unwrap().is_empty());
        assert_eq!(orch.copy_affordance(now), CopyAffordance::Default);
    }
}
