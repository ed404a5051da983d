pub mod ai;
pub mod compose;
pub mod config;
pub mod content_script;
pub mod error;
pub mod guidance;
pub mod host;
pub mod mailto;
pub mod messaging;
pub mod orchestrator;
pub mod profile;
pub mod protocol;
pub mod provider;
pub mod state;
pub mod system;

// Re-export main types for convenience
pub use ai::{ClaudeClient, OllamaClient, OpenAIClient};
pub use config::{Config, PageConfig};
pub use content_script::{ContentScript, EmailGenerator};
pub use error::{DraftError, HostError, TransportError};
pub use host::{Clipboard, MailLauncher, PeerChannel, TabId, TabLocator};
pub use messaging::{PortReceiver, Tab, TabSet};
pub use orchestrator::{exchange, DraftOrchestrator};
pub use profile::ProfileInfo;
pub use protocol::{Context, PeerReply, PeerRequest, Response};
pub use provider::{ModelGenerator, Provider};
pub use state::{render, ControlView, CopyAffordance, UiState};
pub use system::{SystemClipboard, SystemMailLauncher};
