//! UI-agnostic popup state
//!
//! This module holds the popup's lifecycle state and the pure projection from
//! it to control visibility. Front ends (the terminal popup, tests) only read
//! `ControlView` and never toggle controls on their own.

/// Lifecycle of the popup around one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Pending,
    Resolved { draft: String, is_error: bool },
}

impl UiState {
    pub fn is_pending(&self) -> bool {
        matches!(self, UiState::Pending)
    }
}

/// What the copy trigger currently displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyAffordance {
    #[default]
    Default,
    Confirmed,
}

impl CopyAffordance {
    pub fn label(&self) -> &'static str {
        match self {
            CopyAffordance::Default => "Copy",
            CopyAffordance::Confirmed => "✓ Copied",
        }
    }
}

/// Visibility and enablement of every popup control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub loading_visible: bool,
    pub result_visible: bool,
    pub generate_enabled: bool,
    pub draft_text: String,
    pub draft_is_error: bool,
    pub copy: CopyAffordance,
}

pub fn render(state: &UiState, draft_text: &str, copy: CopyAffordance) -> ControlView {
    match state {
        UiState::Idle => ControlView {
            loading_visible: false,
            result_visible: false,
            generate_enabled: true,
            draft_text: draft_text.to_string(),
            draft_is_error: false,
            copy,
        },
        UiState::Pending => ControlView {
            loading_visible: true,
            result_visible: false,
            generate_enabled: false,
            draft_text: String::new(),
            draft_is_error: false,
            copy,
        },
        UiState::Resolved { is_error, .. } => ControlView {
            loading_visible: false,
            result_visible: true,
            generate_enabled: true,
            draft_text: draft_text.to_string(),
            draft_is_error: *is_error,
            copy,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_hides_result_and_disables_trigger() {
        let view = render(&UiState::Pending, "stale", CopyAffordance::Default);
        assert!(view.loading_visible);
        assert!(!view.result_visible);
        assert!(!view.generate_enabled);
        assert!(view.draft_text.is_empty());
    }

    #[test]
    fn test_resolved_shows_result() {
        let state = UiState::Resolved {
            draft: "Error: x".to_string(),
            is_error: true,
        };
        let view = render(&state, "Error: x", CopyAffordance::Confirmed);
        assert!(!view.loading_visible);
        assert!(view.result_visible);
        assert!(view.generate_enabled);
        assert!(view.draft_is_error);
        assert_eq!(view.copy, CopyAffordance::Confirmed);
    }

    #[test]
    fn test_idle_is_interactive_without_result() {
        let view = render(&UiState::Idle, "", CopyAffordance::Default);
        assert!(view.generate_enabled);
        assert!(!view.result_visible);
        assert!(!view.loading_visible);
    }
}
