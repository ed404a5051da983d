use std::sync::Arc;

use anyhow::Result;
use drafter_core::{
    Config, ContentScript, DraftOrchestrator, EmailGenerator, ModelGenerator, OllamaClient,
    Provider, SystemClipboard, SystemMailLauncher, TabSet,
};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init()?;

    let config = Config::load()?;
    let config_path = Config::get_config_path()?;
    if !config_path.exists() {
        // Leave a starter file to add pages and keys to
        match config.save() {
            Ok(()) => info!(path = %config_path.display(), "wrote default config"),
            Err(err) => warn!(error = %err, "could not write default config"),
        }
    }
    let generator = ModelGenerator::from_config(&config)?;
    info!(
        provider = generator.provider().as_str(),
        model = generator.model(),
        log = %log_path.display(),
        "starting drafter"
    );
    if generator.provider() == Provider::Ollama {
        check_ollama_model(&config).await;
    }

    // Open a tab per configured page, each with its own content script
    let tabs = TabSet::new();
    let generator: Arc<dyn EmailGenerator> = Arc::new(generator);
    for page in &config.pages {
        let (tab, port) = tabs.open(&page.title, &page.url);
        ContentScript::new(tab, page.profile.clone(), generator.clone()).spawn(port);
    }

    let orchestrator = DraftOrchestrator::new()
        .with_subject(config.mail_subject())
        .with_copy_feedback(config.copy_feedback());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(
        orchestrator,
        tabs,
        Arc::new(SystemClipboard),
        Arc::new(SystemMailLauncher),
        events.sender(),
    )
    .with_provider_label(format!(
        "{} · {}",
        config.provider().display_name(),
        config.model()
    ));

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn check_ollama_model(config: &Config) {
    let ollama = OllamaClient::new(config.ollama_url());
    let model = config.model();
    match ollama.list_models().await {
        Ok(models) if models.iter().any(|m| *m == model) => {}
        Ok(_) => warn!(%model, "model not found in Ollama; pull it with `ollama pull`"),
        Err(err) => warn!(error = %err, "could not reach Ollama; make sure it is running with: ollama serve"),
    }
}
