use std::sync::Arc;
use std::time::Instant;

use drafter_core::{
    exchange, Clipboard, ControlView, DraftError, DraftOrchestrator, MailLauncher, PeerRequest,
    Response, Tab, TabSet,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// The popup: context field, generate trigger, and the draft with its actions.
pub struct App {
    pub should_quit: bool,

    // Context field
    pub context_input: String,
    pub context_cursor: usize,

    // Blocking notice (validation), dismissed with Esc/Enter
    pub notice: Option<String>,

    pub orchestrator: DraftOrchestrator,
    pub tabs: TabSet,
    pub provider_label: String,

    pub draft_scroll: u16,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    clipboard: Arc<dyn Clipboard>,
    launcher: Arc<dyn MailLauncher>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        orchestrator: DraftOrchestrator,
        tabs: TabSet,
        clipboard: Arc<dyn Clipboard>,
        launcher: Arc<dyn MailLauncher>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            context_input: String::new(),
            context_cursor: 0,
            notice: None,
            orchestrator,
            tabs,
            provider_label: String::new(),
            draft_scroll: 0,
            animation_frame: 0,
            clipboard,
            launcher,
            events,
        }
    }

    pub fn with_provider_label(mut self, label: impl Into<String>) -> Self {
        self.provider_label = label.into();
        self
    }

    pub fn view(&self) -> ControlView {
        self.orchestrator.view(Instant::now())
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.tabs.active()
    }

    /// Generate trigger. The round trip runs on its own task and reports back
    /// with `AppEvent::DraftResolved`.
    pub fn generate(&mut self) {
        let request = self.orchestrator.begin(&self.context_input);
        self.dispatch(request);
    }

    /// Rework the current draft using the context field as instructions.
    pub fn improve(&mut self) {
        let request = self.orchestrator.begin_improve(&self.context_input);
        self.dispatch(request);
    }

    fn dispatch(&mut self, request: Result<PeerRequest, DraftError>) {
        let request = match request {
            Ok(request) => request,
            Err(DraftError::Busy) => {
                debug!("request ignored while a draft is pending");
                return;
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                return;
            }
        };

        self.draft_scroll = 0;
        self.animation_frame = 0;
        let tabs = self.tabs.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let response = exchange(&tabs, &tabs, request).await;
            if events.send(AppEvent::DraftResolved(response)).is_err() {
                warn!("popup closed before the draft arrived");
            }
        });
    }

    pub fn on_draft_resolved(&mut self, response: Response) {
        self.orchestrator.resolve(response);
        self.draft_scroll = 0;
    }

    pub fn copy(&mut self) {
        self.orchestrator
            .copy_draft(self.clipboard.as_ref(), Instant::now());
    }

    pub fn send(&mut self) {
        self.orchestrator.send_draft(self.launcher.as_ref());
    }

    pub fn next_tab(&mut self) {
        self.tabs.cycle(true);
    }

    pub fn prev_tab(&mut self) {
        self.tabs.cycle(false);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn tick_animation(&mut self) {
        if self.orchestrator.state().is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_draft_down(&mut self) {
        self.draft_scroll = self.draft_scroll.saturating_add(3);
    }

    pub fn scroll_draft_up(&mut self) {
        self.draft_scroll = self.draft_scroll.saturating_sub(3);
    }

    // Context field editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.context_input, self.context_cursor);
        self.context_input.insert(byte_pos, c);
        self.context_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.context_cursor > 0 {
            self.context_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.context_input, self.context_cursor);
            self.context_input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.context_cursor < self.context_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.context_input, self.context_cursor);
            self.context_input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.context_cursor = self.context_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.context_input.chars().count();
        self.context_cursor = (self.context_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.context_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.context_cursor = self.context_input.chars().count();
    }

    pub fn clear_context(&mut self) {
        self.context_input.clear();
        self.context_cursor = 0;
    }
}
