//! The script living in a tab: answers `GENERATE_EMAIL` and `IMPROVE_EMAIL`
//! requests.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::messaging::{PortReceiver, Tab};
use crate::profile::ProfileInfo;
use crate::protocol::{PeerReply, PeerRequest};

/// Turns a page profile plus the user's context into an email body.
#[async_trait]
pub trait EmailGenerator: Send + Sync {
    async fn generate(&self, profile: &ProfileInfo, context: &str) -> Result<String>;

    /// Rework `draft` following `instructions`.
    async fn improve(
        &self,
        profile: &ProfileInfo,
        draft: &str,
        instructions: &str,
    ) -> Result<String>;
}

pub struct ContentScript {
    tab: Tab,
    profile: ProfileInfo,
    generator: Arc<dyn EmailGenerator>,
}

impl ContentScript {
    pub fn new(tab: Tab, profile: ProfileInfo, generator: Arc<dyn EmailGenerator>) -> Self {
        Self {
            tab,
            profile,
            generator,
        }
    }

    /// Serve the tab's port until the tab is closed.
    ///
    /// Each message is answered before the next is read. Messages that are not
    /// a known request get no answer, which the sender sees as a closed port.
    pub async fn run(self, mut port: PortReceiver) {
        info!(tab = self.tab.id, url = %self.tab.url, "content script attached");
        while let Some(incoming) = port.recv().await {
            let request: PeerRequest = match serde_json::from_value(incoming.message.clone()) {
                Ok(request) => request,
                Err(err) => {
                    debug!(tab = self.tab.id, error = %err, "ignoring unknown message");
                    continue;
                }
            };
            let reply = self.handle(request).await;
            incoming.respond(reply.to_value());
        }
        debug!(tab = self.tab.id, "content script detached");
    }

    pub fn spawn(self, port: PortReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(port))
    }

    pub async fn handle(&self, request: PeerRequest) -> PeerReply {
        let kind = request.kind();
        let result = match &request {
            PeerRequest::GenerateEmail { context } => {
                self.generator.generate(&self.profile, context.as_str()).await
            }
            PeerRequest::ImproveEmail { email, context } => {
                self.generator
                    .improve(&self.profile, email, context.as_str())
                    .await
            }
        };

        match result {
            Ok(email) if email.trim().is_empty() => PeerReply::Error {
                error: "empty draft returned by model".to_string(),
            },
            Ok(email) => PeerReply::Email { email },
            Err(err) => {
                error!(tab = self.tab.id, kind, error = %err, "email generation failed");
                PeerReply::Error {
                    error: err.to_string(),
                }
            }
        }
    }
}
