//! In-process tabs and the message ports that connect them to the popup.
//!
//! Each open tab owns the receiving half of a port. Whoever runs the tab's
//! script (see `content_script`) pulls messages from it and answers through a
//! one-shot responder. Sending to a tab whose port is gone, or whose script
//! drops the responder, produces the same transport errors a browser reports.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::TransportError;
use crate::host::{PeerChannel, TabId, TabLocator};

const PORT_CAPACITY: usize = 16;

type Envelope = (Value, oneshot::Sender<Value>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub url: String,
}

/// A message delivered to a tab, with the handle used to answer it.
#[derive(Debug)]
pub struct IncomingMessage {
    pub message: Value,
    responder: oneshot::Sender<Value>,
}

impl IncomingMessage {
    /// Answer the sender. A sender that stopped waiting is not an error.
    pub fn respond(self, reply: Value) {
        let _ = self.responder.send(reply);
    }
}

/// Receiving half of a tab's port.
pub struct PortReceiver {
    tab: TabId,
    rx: mpsc::Receiver<Envelope>,
}

impl PortReceiver {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Next message, or `None` once the tab is closed.
    pub async fn recv(&mut self) -> Option<IncomingMessage> {
        self.rx
            .recv()
            .await
            .map(|(message, responder)| IncomingMessage { message, responder })
    }
}

struct TabEntry {
    tab: Tab,
    port: mpsc::Sender<Envelope>,
}

#[derive(Default)]
struct Registry {
    tabs: Vec<TabEntry>,
    active: Option<TabId>,
    next_id: TabId,
}

/// Shared set of open tabs. Cloning shares the same set.
#[derive(Clone, Default)]
pub struct TabSet {
    inner: Arc<RwLock<Registry>>,
}

impl TabSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a tab. The first tab opened becomes active.
    pub fn open(&self, title: &str, url: &str) -> (Tab, PortReceiver) {
        let (tx, rx) = mpsc::channel(PORT_CAPACITY);
        let mut registry = self.write();
        registry.next_id += 1;
        let tab = Tab {
            id: registry.next_id,
            title: title.to_string(),
            url: url.to_string(),
        };
        registry.tabs.push(TabEntry {
            tab: tab.clone(),
            port: tx,
        });
        if registry.active.is_none() {
            registry.active = Some(tab.id);
        }
        debug!(tab = tab.id, url, "tab opened");
        let receiver = PortReceiver { tab: tab.id, rx };
        (tab, receiver)
    }

    /// Close a tab, dropping its port. Activation moves to the first tab left.
    pub fn close(&self, id: TabId) -> bool {
        let mut registry = self.write();
        let before = registry.tabs.len();
        registry.tabs.retain(|entry| entry.tab.id != id);
        let removed = registry.tabs.len() != before;
        if registry.active == Some(id) {
            registry.active = registry.tabs.first().map(|entry| entry.tab.id);
        }
        removed
    }

    /// Move activation to the next (or previous) tab, wrapping around.
    pub fn cycle(&self, forward: bool) -> Option<Tab> {
        let mut registry = self.write();
        let len = registry.tabs.len();
        if len == 0 {
            return None;
        }
        let current = registry
            .active
            .and_then(|id| registry.tabs.iter().position(|entry| entry.tab.id == id))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        let tab = registry.tabs[next].tab.clone();
        registry.active = Some(tab.id);
        Some(tab)
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.read().tabs.iter().map(|entry| entry.tab.clone()).collect()
    }

    pub fn active(&self) -> Option<Tab> {
        let registry = self.read();
        let id = registry.active?;
        registry
            .tabs
            .iter()
            .find(|entry| entry.tab.id == id)
            .map(|entry| entry.tab.clone())
    }

    fn port(&self, id: TabId) -> Option<mpsc::Sender<Envelope>> {
        self.read()
            .tabs
            .iter()
            .find(|entry| entry.tab.id == id)
            .map(|entry| entry.port.clone())
    }
}

#[async_trait]
impl TabLocator for TabSet {
    async fn active_tab(&self) -> Option<TabId> {
        self.active().map(|tab| tab.id)
    }
}

#[async_trait]
impl PeerChannel for TabSet {
    async fn send_message(&self, tab: TabId, message: Value) -> Result<Value, TransportError> {
        let port = self
            .port(tab)
            .ok_or_else(TransportError::receiving_end_missing)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        port.send((message, reply_tx))
            .await
            .map_err(|_| TransportError::receiving_end_missing())?;

        reply_rx.await.map_err(|_| TransportError::port_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_tab_becomes_active() {
        let tabs = TabSet::new();
        assert!(tabs.active().is_none());
        let (first, _rx1) = tabs.open("One", "https://a.example");
        let (_second, _rx2) = tabs.open("Two", "https://b.example");
        assert_eq!(tabs.active(), Some(first));
    }

    #[test]
    fn test_cycle_wraps() {
        let tabs = TabSet::new();
        let (a, _ra) = tabs.open("A", "a");
        let (b, _rb) = tabs.open("B", "b");
        assert_eq!(tabs.cycle(true), Some(b.clone()));
        assert_eq!(tabs.cycle(true), Some(a.clone()));
        assert_eq!(tabs.cycle(false), Some(b));
    }

    #[test]
    fn test_close_moves_activation() {
        let tabs = TabSet::new();
        let (a, _ra) = tabs.open("A", "a");
        let (b, _rb) = tabs.open("B", "b");
        assert!(tabs.close(a.id));
        assert_eq!(tabs.active(), Some(b.clone()));
        assert!(tabs.close(b.id));
        assert!(tabs.active().is_none());
        assert!(!tabs.close(b.id));
    }

    #[tokio::test]
    async fn test_round_trip_through_port() {
        let tabs = TabSet::new();
        let (tab, mut port) = tabs.open("A", "a");
        tokio::spawn(async move {
            while let Some(incoming) = port.recv().await {
                let context = incoming.message["context"].clone();
                incoming.respond(json!({ "email": context }));
            }
        });

        let reply = tabs
            .send_message(tab.id, json!({"type": "GENERATE_EMAIL", "context": "hi"}))
            .await
            .unwrap();
        assert_eq!(reply, json!({"email": "hi"}));
    }

    #[tokio::test]
    async fn test_unknown_tab_has_no_receiver() {
        let tabs = TabSet::new();
        let err = tabs.send_message(42, json!({})).await.unwrap_err();
        assert_eq!(err, TransportError::receiving_end_missing());
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let tabs = TabSet::new();
        let (tab, port) = tabs.open("A", "a");
        drop(port);
        let err = tabs.send_message(tab.id, json!({})).await.unwrap_err();
        assert_eq!(err, TransportError::receiving_end_missing());
    }

    #[tokio::test]
    async fn test_dropped_responder_closes_port() {
        let tabs = TabSet::new();
        let (tab, mut port) = tabs.open("A", "a");
        tokio::spawn(async move {
            if let Some(incoming) = port.recv().await {
                drop(incoming);
            }
        });
        let err = tabs.send_message(tab.id, json!({})).await.unwrap_err();
        assert_eq!(err, TransportError::port_closed());
    }
}
