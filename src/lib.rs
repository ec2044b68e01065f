//! ⚓ Deckhand — terminal operator console for provisioning and managing a
//! single server.

pub mod agent;
pub mod command_log;
pub mod config;
pub mod detect;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod provision;
pub mod queue;
pub mod services;
pub mod tui;

pub fn run() -> anyhow::Result<()> {
    logging::init();
    let config = config::Config::load();
    log::info!("⚓ Launching Deckhand console...");
    tui::run(config)
}
