use anyhow::Result;
use geoint_agent_core::AgentConfig;

mod app;
mod handler;
mod logging;
mod router;
mod tui;
mod ui;
mod workspace;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init()?;

    let config = match AgentConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Using default configuration: {:#}", e);
            AgentConfig::new()
        }
    }
    .with_env_overrides();
    tracing::info!(api = %config.api_base_url, "starting geoint-agent");

    let mut app = App::new(config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!("exited with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
