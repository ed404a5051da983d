//! Error types shared by the popup orchestrator and its collaborators.

use thiserror::Error;

/// Failures that stop a generation request before it is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// The context trimmed to nothing.
    #[error("Please add some context first!")]
    EmptyContext,

    /// Improving needs a successful draft to start from.
    #[error("Generate a draft first!")]
    NoDraft,

    /// A request is already outstanding.
    #[error("a draft is already being generated")]
    Busy,
}

/// Channel-level failure between the popup and the tab's script.
///
/// The message is shown to the user verbatim inside the error draft, so it
/// stays short. Extra detail goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn no_active_tab() -> Self {
        Self::new("no active tab")
    }

    pub fn receiving_end_missing() -> Self {
        Self::new("Could not establish connection. Receiving end does not exist.")
    }

    pub fn port_closed() -> Self {
        Self::new("The message port closed before a response was received.")
    }
}

/// Failure of a fire-and-forget host action (clipboard, mail client).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no {0} helper is available on this system")]
    Unavailable(&'static str),

    #[error("{helper} exited with {status}")]
    Failed {
        helper: String,
        status: std::process::ExitStatus,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
