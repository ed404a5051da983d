//! Seams between the orchestrator and the environment hosting the popup.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HostError, TransportError};

/// Identifier of a browser-style tab.
pub type TabId = u32;

/// Finds the tab that requests should be addressed to.
#[async_trait]
pub trait TabLocator: Send + Sync {
    async fn active_tab(&self) -> Option<TabId>;
}

/// One-shot request/response transport to the script running in a tab.
///
/// `Ok` carries whatever the script replied, unvalidated. `Err` means the
/// channel itself failed and no reply will ever arrive.
#[async_trait]
pub trait PeerChannel: Send + Sync {
    async fn send_message(&self, tab: TabId, message: Value) -> Result<Value, TransportError>;
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), HostError>;
}

/// Hands a URI to the default handler (mail client for `mailto:`).
pub trait MailLauncher: Send + Sync {
    fn open(&self, uri: &str) -> Result<(), HostError>;
}
